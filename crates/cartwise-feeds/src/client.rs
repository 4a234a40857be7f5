//! HTTP client used by chain adapters and the orchestrator.
//!
//! Wraps `reqwest` with typed status handling, session-cookie forwarding and
//! retry on transient errors. Feed downloads are decoded (gzip or plain) into
//! XML text before they reach an adapter's parser.

use std::time::Duration;

use cartwise_core::AppConfig;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::decode::decode_payload;
use crate::error::AcquisitionError;
use crate::rate_limit::retry_with_backoff;

/// Cookies established by a chain's login flow, replayed on later requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    cookies: Vec<(String, String)>,
}

impl SessionCredentials {
    /// Collects `name=value` pairs from raw `Set-Cookie` header values.
    /// A later cookie with the same name replaces an earlier one.
    #[must_use]
    pub fn from_set_cookies<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut creds = Self::default();
        creds.merge(headers);
        creds
    }

    pub fn merge<'a>(&mut self, headers: impl IntoIterator<Item = &'a str>) {
        for header in headers {
            let pair = header.split(';').next().unwrap_or_default().trim();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            self.cookies.retain(|(n, _)| n != name);
            self.cookies.push((name.to_owned(), value.trim().to_owned()));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Value for a `Cookie` request header.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A successful response: raw body plus any cookies the server set.
#[derive(Debug, Clone)]
pub struct FeedResponse {
    pub body: Vec<u8>,
    pub set_cookies: Vec<String>,
}

impl FeedResponse {
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// # Errors
    ///
    /// Returns [`AcquisitionError::Deserialize`] if the body is not the
    /// expected JSON shape.
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> Result<T, AcquisitionError> {
        let text = self.text();
        // Some portals prefix JSON with a UTF-8 BOM.
        serde_json::from_str(text.trim_start_matches('\u{feff}')).map_err(|e| {
            AcquisitionError::Deserialize {
                context: context.to_owned(),
                source: e,
            }
        })
    }

    pub fn cookies(&self) -> impl Iterator<Item = &str> {
        self.set_cookies.iter().map(String::as_str)
    }
}

/// Network retrieval for chain portals and feed files.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct FeedClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    backoff_base_secs: u64,
}

impl FeedClient {
    /// Creates a client with the given per-request timeout, `User-Agent` and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, AcquisitionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// # Errors
    ///
    /// See [`FeedClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, AcquisitionError> {
        Self::new(
            config.fetch_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )
    }

    /// GET `url`, replaying `credentials` when present.
    ///
    /// # Errors
    ///
    /// - [`AcquisitionError::Auth`] on 401/403.
    /// - [`AcquisitionError::FeedUnavailable`] on 404.
    /// - [`AcquisitionError::RateLimited`] on 429 after retries.
    /// - [`AcquisitionError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`AcquisitionError::Http`] on network failure after retries.
    pub async fn get(
        &self,
        url: &str,
        credentials: Option<&SessionCredentials>,
    ) -> Result<FeedResponse, AcquisitionError> {
        self.execute(url, credentials, |client| client.get(url))
            .await
    }

    /// POST an urlencoded form to `url`.
    ///
    /// # Errors
    ///
    /// Same as [`FeedClient::get`].
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        credentials: Option<&SessionCredentials>,
    ) -> Result<FeedResponse, AcquisitionError> {
        self.execute(url, credentials, |client| client.post(url).form(form))
            .await
    }

    /// Downloads a feed file and decodes it to XML text.
    ///
    /// # Errors
    ///
    /// Same as [`FeedClient::get`], plus [`AcquisitionError::Decompress`] if
    /// the payload cannot be decoded.
    pub async fn fetch_feed(
        &self,
        url: &str,
        credentials: Option<&SessionCredentials>,
    ) -> Result<String, AcquisitionError> {
        let response = self.get(url, credentials).await?;
        tracing::debug!(url, bytes = response.body.len(), "downloaded feed");
        decode_payload(&response.body)
    }

    async fn execute<F>(
        &self,
        url: &str,
        credentials: Option<&SessionCredentials>,
        build: F,
    ) -> Result<FeedResponse, AcquisitionError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let cookie = credentials
            .filter(|c| !c.is_empty())
            .map(SessionCredentials::cookie_header);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let mut request = build(&self.client);
            if let Some(cookie) = &cookie {
                request = request.header(reqwest::header::COOKIE, cookie);
            }
            let url = url.to_owned();
            async move {
                let response = request.send().await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(AcquisitionError::RateLimited {
                        url,
                        retry_after_secs,
                    });
                }

                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(AcquisitionError::Auth {
                        context: url,
                        reason: format!("HTTP {}", status.as_u16()),
                    });
                }

                if status == StatusCode::NOT_FOUND {
                    return Err(AcquisitionError::FeedUnavailable {
                        context: url,
                        reason: "HTTP 404".to_owned(),
                    });
                }

                if !status.is_success() {
                    return Err(AcquisitionError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let set_cookies = response
                    .headers()
                    .get_all(reqwest::header::SET_COOKIE)
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .map(str::to_owned)
                    .collect();
                let body = response.bytes().await?.to_vec();

                Ok(FeedResponse { body, set_cookies })
            }
        })
        .await
    }
}
