/// Deployment environment, from `CARTWISE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime settings for acquisition and logging. Every field has a default,
/// see `build_app_config`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Per-request HTTP timeout applied by the feed client.
    pub fetch_timeout_secs: u64,
    /// Deadline for one (store, feed-kind) task: resolve + download + parse.
    pub task_timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on concurrently running store tasks in planning mode.
    pub max_concurrent_fetches: usize,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}
