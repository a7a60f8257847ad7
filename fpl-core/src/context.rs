//! Per-run extraction context.
//!
//! Holds the API client, the event sink, and the bootstrap payload cached for
//! the lifetime of one run. A fresh context starts with an empty cache;
//! `reset_bootstrap` clears it explicitly at the run boundary.

use serde_json::Value;

use crate::api::{ApiFailure, Endpoint, FplApi};
use crate::events::{EventSink, Level};

pub struct RunContext<'a> {
    api: &'a dyn FplApi,
    sink: &'a dyn EventSink,
    bootstrap: Option<Value>,
}

impl<'a> RunContext<'a> {
    pub fn new(api: &'a dyn FplApi, sink: &'a dyn EventSink) -> Self {
        Self {
            api,
            sink,
            bootstrap: None,
        }
    }

    pub fn sink(&self) -> &'a dyn EventSink {
        self.sink
    }

    /// One upstream call, logged before it is made and on failure.
    pub fn call(&self, endpoint: &Endpoint) -> Result<Value, ApiFailure> {
        let url = self.api.url(endpoint);
        self.sink
            .record(Level::Info, &format!("Calling FPL API: {url}"), None);
        self.api.call(endpoint).map_err(|e| {
            self.sink.record(
                Level::Error,
                &format!("API call failed for {url}: {}", e.message),
                None,
            );
            e
        })
    }

    /// The bootstrap payload, fetched on first use and reused afterwards.
    ///
    /// A failed fetch is not cached, so the next caller tries again.
    pub fn bootstrap(&mut self) -> Option<&Value> {
        if self.bootstrap.is_none() {
            self.bootstrap = self.call(&Endpoint::Bootstrap).ok();
        }
        self.bootstrap.as_ref()
    }

    pub fn bootstrap_cached(&self) -> bool {
        self.bootstrap.is_some()
    }

    pub fn reset_bootstrap(&mut self) {
        self.bootstrap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StubApi;
    use crate::clock::FixedClock;
    use crate::events::RunLog;
    use serde_json::json;

    #[test]
    fn bootstrap_is_fetched_once_per_run() {
        let api = StubApi::new();
        api.respond(Endpoint::Bootstrap, json!({"teams": []}));
        let clock = FixedClock::on(2025, 1, 1);
        let log = RunLog::new(&clock);
        let mut ctx = RunContext::new(&api, &log);

        assert!(!ctx.bootstrap_cached());
        assert!(ctx.bootstrap().is_some());
        assert!(ctx.bootstrap().is_some());
        assert_eq!(api.call_count(&Endpoint::Bootstrap), 1);

        ctx.reset_bootstrap();
        assert!(!ctx.bootstrap_cached());
        ctx.bootstrap();
        assert_eq!(api.call_count(&Endpoint::Bootstrap), 2);
    }

    #[test]
    fn failed_bootstrap_is_retried_by_next_caller() {
        let api = StubApi::new();
        let clock = FixedClock::on(2025, 1, 1);
        let log = RunLog::new(&clock);
        let mut ctx = RunContext::new(&api, &log);

        assert!(ctx.bootstrap().is_none());
        assert!(ctx.bootstrap().is_none());
        assert_eq!(api.call_count(&Endpoint::Bootstrap), 2);

        let errors: Vec<_> = log
            .entries()
            .into_iter()
            .filter(|e| e.event_type == Level::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("bootstrap-static/"));
    }
}
