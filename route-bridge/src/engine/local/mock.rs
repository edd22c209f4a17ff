//! In-memory `mock:` endpoints that record what a route delivered to them.

use crate::error::{EngineError, EngineErrorKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// How a mock endpoint reacts to resolution and delivery.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MockBehavior {
    #[default]
    Accept,
    /// Resolves at route start, fails every delivery.
    Unreachable,
    /// Fails resolution, so a route using it cannot start.
    Unresolvable,
}

#[derive(Default)]
struct MockState {
    behavior: MockBehavior,
    received: Vec<String>,
    attempts: Vec<Instant>,
}

/// One named mock endpoint.
pub struct MockEndpoint {
    name: String,
    state: Mutex<MockState>,
}

// Recorded data stays usable after a panicking test thread.
fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockEndpoint {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn behavior(&self) -> MockBehavior {
        lock(&self.state).behavior
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        lock(&self.state).behavior = behavior;
    }

    /// Bodies accepted so far, in arrival order.
    pub fn received_bodies(&self) -> Vec<String> {
        lock(&self.state).received.clone()
    }

    pub fn received_count(&self) -> usize {
        lock(&self.state).received.len()
    }

    /// Every delivery attempt, accepted or not.
    pub fn attempt_count(&self) -> usize {
        lock(&self.state).attempts.len()
    }

    /// When each delivery attempt happened.
    pub fn attempt_instants(&self) -> Vec<Instant> {
        lock(&self.state).attempts.clone()
    }

    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.received.clear();
        state.attempts.clear();
    }

    pub(crate) fn deliver(&self, body: &str) -> Result<(), EngineError> {
        let mut state = lock(&self.state);
        state.attempts.push(Instant::now());
        match state.behavior {
            MockBehavior::Accept => {
                state.received.push(body.to_string());
                Ok(())
            }
            MockBehavior::Unreachable | MockBehavior::Unresolvable => Err(EngineError::new(
                EngineErrorKind::Unreachable,
                format!("mock endpoint {} is unreachable", self.name),
            )),
        }
    }
}

/// Shared registry of mock endpoints, keyed by the path of a `mock:` URI.
///
/// Clones share the same endpoints, so a test can keep one handle while the engine
/// owns another.
#[derive(Clone, Default)]
pub struct MockEndpoints {
    endpoints: Arc<Mutex<HashMap<String, Arc<MockEndpoint>>>>,
}

impl MockEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the endpoint called `name`, creating an accepting one on first use.
    pub fn endpoint(&self, name: &str) -> Arc<MockEndpoint> {
        let mut endpoints = self
            .endpoints
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        endpoints
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MockEndpoint::new(name)))
            .clone()
    }

    pub fn unreachable(&self, name: &str) -> Arc<MockEndpoint> {
        let endpoint = self.endpoint(name);
        endpoint.set_behavior(MockBehavior::Unreachable);
        endpoint
    }

    pub fn unresolvable(&self, name: &str) -> Arc<MockEndpoint> {
        let endpoint = self.endpoint(name);
        endpoint.set_behavior(MockBehavior::Unresolvable);
        endpoint
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<Arc<MockEndpoint>, EngineError> {
        let endpoint = self.endpoint(name);
        if endpoint.behavior() == MockBehavior::Unresolvable {
            return Err(EngineError::new(
                EngineErrorKind::Unreachable,
                format!("mock endpoint {name} cannot be resolved"),
            ));
        }
        Ok(endpoint)
    }
}
