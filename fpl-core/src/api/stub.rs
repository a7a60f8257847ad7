//! Canned upstream responses for tests and offline runs.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{join_url, ApiFailure, Endpoint, FplApi};

#[derive(Default)]
struct StubState {
    responses: HashMap<Endpoint, Value>,
    calls: Vec<Endpoint>,
}

/// An `FplApi` answering from a fixed table. Unregistered endpoints fail
/// with `HTTP 404`. Every call is recorded.
#[derive(Default)]
pub struct StubApi {
    state: Mutex<StubState>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, endpoint: Endpoint, body: Value) -> &Self {
        self.lock().responses.insert(endpoint, body);
        self
    }

    /// Make a previously registered endpoint fail again.
    pub fn forget(&self, endpoint: &Endpoint) {
        self.lock().responses.remove(endpoint);
    }

    pub fn calls(&self) -> Vec<Endpoint> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: &Endpoint) -> usize {
        self.lock().calls.iter().filter(|c| *c == endpoint).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FplApi for StubApi {
    fn url(&self, endpoint: &Endpoint) -> String {
        join_url("stub://api", &endpoint.describe())
    }

    fn call(&self, endpoint: &Endpoint) -> Result<Value, ApiFailure> {
        let mut state = self.lock();
        state.calls.push(*endpoint);
        state
            .responses
            .get(endpoint)
            .cloned()
            .ok_or_else(|| ApiFailure::new(endpoint, "HTTP 404 Not Found"))
    }
}
