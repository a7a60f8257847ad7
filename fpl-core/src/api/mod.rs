//! Upstream API access.
//!
//! `FplApi` abstracts the HTTP client so extractors and the planner can run
//! against `StubApi` in tests. Failures are values (`ApiFailure`), never
//! panics; callers treat them as "no data this attempt".

pub mod http;
pub mod stub;

pub use http::{HttpApi, HttpApiOptions};
pub use stub::StubApi;

use serde_json::Value;
use thiserror::Error;

use crate::domain::Sequence;

/// The upstream endpoints the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `bootstrap-static/`: players, positions, teams and gameweeks in one payload.
    Bootstrap,
    /// `fixtures/`, optionally filtered with `?event={n}`.
    Fixtures { event: Option<Sequence> },
    /// `event/{n}/live/`: per-player stats for one gameweek.
    EventLive { event: Sequence },
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Bootstrap => "bootstrap-static/".to_string(),
            Endpoint::Fixtures { .. } => "fixtures/".to_string(),
            Endpoint::EventLive { event } => format!("event/{event}/live/"),
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Fixtures { event: Some(n) } => vec![("event", n.to_string())],
            _ => Vec::new(),
        }
    }

    /// Path plus query string, used in log lines and failure reports.
    pub fn describe(&self) -> String {
        let query = self.query();
        if query.is_empty() {
            return self.path();
        }
        let params: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}?{}", self.path(), params.join("&"))
    }
}

/// A failed upstream call: transport error, timeout, non-2xx status or
/// undecodable body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API call failed for {endpoint}: {message}")]
pub struct ApiFailure {
    pub endpoint: String,
    pub message: String,
}

impl ApiFailure {
    pub fn new(endpoint: &Endpoint, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.describe(),
            message: message.into(),
        }
    }
}

pub trait FplApi: Send + Sync {
    /// Full URL for an endpoint, for logging.
    fn url(&self, endpoint: &Endpoint) -> String;

    /// GET the endpoint and decode the body as JSON.
    fn call(&self, endpoint: &Endpoint) -> Result<Value, ApiFailure>;
}

/// Join a base URL and a relative path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
