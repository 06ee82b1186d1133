use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, ScoutError};
use crate::providers::RateLimiter;

const MAX_BACKOFF: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 200;

/// Connection settings shared by the JSON API clients
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Total attempts per request, including the first
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    pub rate_limit: f64,
    pub user_agent: String,
}

enum Failure {
    Retry(ScoutError),
    Fatal(ScoutError),
}

/// Rate-limited GET-and-decode client with retry on transient failures
pub(crate) struct JsonHttpClient {
    provider: &'static str,
    client: Client,
    base_url: String,
    max_attempts: u32,
    retry_delay: Duration,
    limiter: RateLimiter,
}

impl JsonHttpClient {
    pub fn new(provider: &'static str, settings: &HttpSettings) -> Result<Self> {
        let retry_delay = Duration::try_from_secs_f64(settings.retry_delay_secs).map_err(|_| {
            ScoutError::Config(format!(
                "{}: retry delay must be a non-negative number of seconds, got {}",
                provider, settings.retry_delay_secs
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            provider,
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_attempts: settings.max_retries.max(1),
            retry_delay,
            limiter: RateLimiter::new(settings.rate_limit),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `{base}/{path}` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url_for(path);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.limiter.acquire().await;
            debug!(provider = self.provider, %url, attempt, "GET");

            match self.fetch_once(&url).await {
                Ok(body) => {
                    return serde_json::from_str(&body).map_err(|e| {
                        ScoutError::provider(self.provider, format!("Invalid JSON from {}: {}", url, e))
                    });
                }
                Err(Failure::Fatal(e)) => return Err(e),
                Err(Failure::Retry(e)) if attempt < self.max_attempts => {
                    let wait = backoff(self.retry_delay, attempt);
                    warn!(
                        provider = self.provider,
                        "Attempt {}/{} failed ({}), retrying in {:.1}s",
                        attempt,
                        self.max_attempts,
                        e,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(Failure::Retry(e)) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, Failure> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let transient = e.is_timeout() || e.is_connect();
            let err = ScoutError::provider(self.provider, format!("Request failed: {}", e));
            if transient {
                Failure::Retry(err)
            } else {
                Failure::Fatal(err)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response.text().await.map_err(|e| {
                Failure::Fatal(ScoutError::provider(self.provider, format!("Failed to read body: {}", e)))
            });
        }

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        Err(classify_status(self.provider, url, status, retry_after, &body))
    }
}

/// Delay before the retry following `attempt` (1-based): doubles each time, capped
fn backoff(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

fn classify_status(
    provider: &str,
    url: &str,
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
) -> Failure {
    let detail = if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        let snippet: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
        format!("HTTP {}: {}", status, snippet)
    };

    match status {
        StatusCode::UNAUTHORIZED => Failure::Fatal(ScoutError::provider(
            provider,
            format!("Authentication required ({})", detail),
        )),
        StatusCode::NOT_FOUND => Failure::Fatal(ScoutError::NotFound(format!("{} resource {}", provider, url))),
        StatusCode::TOO_MANY_REQUESTS => Failure::Fatal(ScoutError::RateLimited {
            provider: provider.to_string(),
            retry_after_secs,
        }),
        s if s.is_server_error() => Failure::Retry(ScoutError::provider(provider, detail)),
        _ => Failure::Fatal(ScoutError::provider(provider, detail)),
    }
}
