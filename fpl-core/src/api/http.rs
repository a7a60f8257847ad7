//! Blocking HTTP client for the upstream API.
//!
//! One GET per call, bounded by a per-request timeout, followed by a fixed
//! pause after every successful response. No retries: a failure is reported
//! once and the caller moves on.

use serde_json::Value;
use std::time::Duration;

use super::{join_url, ApiFailure, Endpoint, FplApi};

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api/";

#[derive(Debug, Clone)]
pub struct HttpApiOptions {
    pub base_url: String,
    /// Pause after each successful call.
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for HttpApiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpApi {
    client: reqwest::blocking::Client,
    options: HttpApiOptions,
}

impl HttpApi {
    pub fn new(options: HttpApiOptions) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("fpl-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &HttpApiOptions {
        &self.options
    }
}

impl FplApi for HttpApi {
    fn url(&self, endpoint: &Endpoint) -> String {
        join_url(&self.options.base_url, &endpoint.path())
    }

    fn call(&self, endpoint: &Endpoint) -> Result<Value, ApiFailure> {
        let resp = self
            .client
            .get(self.url(endpoint))
            .query(&endpoint.query())
            .send()
            .map_err(|e| {
                let kind = if e.is_timeout() { "timeout" } else { "transport error" };
                ApiFailure::new(endpoint, format!("{kind}: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiFailure::new(endpoint, format!("HTTP {status}")));
        }

        if !self.options.delay.is_zero() {
            std::thread::sleep(self.options.delay);
        }

        resp.json::<Value>()
            .map_err(|e| ApiFailure::new(endpoint, format!("invalid JSON body: {e}")))
    }
}
