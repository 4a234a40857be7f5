use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| map.get(key).map(|v| (*v).to_owned()).ok_or(VarError::NotPresent)
}

#[test]
fn environment_names_map_to_variants() {
    for (name, expected) in [
        ("development", Environment::Development),
        ("test", Environment::Test),
        ("production", Environment::Production),
    ] {
        assert_eq!(parse_environment(name).unwrap(), expected, "{name}");
    }
}

#[test]
fn unknown_environment_is_rejected() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "CARTWISE_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.fetch_timeout_secs, 60);
    assert_eq!(cfg.task_timeout_secs, 180);
    assert_eq!(cfg.user_agent, "cartwise/0.1 (price-transparency)");
    assert_eq!(cfg.max_concurrent_fetches, 4);
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_secs, 2);
}

#[test]
fn fetch_timeout_override() {
    let mut map = HashMap::new();
    map.insert("CARTWISE_FETCH_TIMEOUT_SECS", "15");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.fetch_timeout_secs, 15);
}

#[test]
fn fetch_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("CARTWISE_FETCH_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARTWISE_FETCH_TIMEOUT_SECS"),
        "expected InvalidEnvVar(CARTWISE_FETCH_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn task_timeout_zero_is_rejected() {
    let mut map = HashMap::new();
    map.insert("CARTWISE_TASK_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARTWISE_TASK_TIMEOUT_SECS"),
        "expected InvalidEnvVar(CARTWISE_TASK_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn max_concurrent_fetches_is_clamped_to_one() {
    let mut map = HashMap::new();
    map.insert("CARTWISE_MAX_CONCURRENT_FETCHES", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_concurrent_fetches, 1);
}

#[test]
fn max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("CARTWISE_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CARTWISE_MAX_RETRIES"),
        "expected InvalidEnvVar(CARTWISE_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn user_agent_override() {
    let mut map = HashMap::new();
    map.insert("CARTWISE_USER_AGENT", "custom-agent/2.0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.user_agent, "custom-agent/2.0");
}

#[test]
fn debug_output_lists_fields() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(rendered.contains("task_timeout_secs: 180"));
}
