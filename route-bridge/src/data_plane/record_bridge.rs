//! Synchronous adapter for hosts that deliver lifecycle and record callbacks on plain threads.

use crate::control_plane::route_identity::RouteIdentity;
use crate::control_plane::route_lifecycle::{RouteLifecycleManager, TeardownReport};
use crate::data_plane::dispatcher::Dispatcher;
use crate::engine::RouteEngine;
use crate::error::{ActivationError, DispatchError};
use crate::runtime::bridge_runtime;
use crate::settings::RouteSettings;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of dispatching one record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchOutcome {
    Delivered,
    Failed(DispatchError),
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

impl From<Result<(), DispatchError>> for DispatchOutcome {
    fn from(result: Result<(), DispatchError>) -> Self {
        match result {
            Ok(()) => DispatchOutcome::Delivered,
            Err(err) => DispatchOutcome::Failed(err),
        }
    }
}

/// A record handed back to the host for onward forwarding, whatever its outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ForwardedRecord {
    payload: Vec<u8>,
    outcome: DispatchOutcome,
}

impl ForwardedRecord {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn outcome(&self) -> &DispatchOutcome {
        &self.outcome
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Maps host callbacks onto one [`RouteLifecycleManager`].
///
/// Every callback blocks the calling thread until the lifecycle step or the record's
/// delivery, redeliveries included, has finished.
pub struct RecordBridge {
    manager: Arc<RouteLifecycleManager>,
    dispatcher: Dispatcher,
}

impl RecordBridge {
    pub fn new(instance_name: &str, engine: Arc<dyn RouteEngine>) -> Self {
        let manager = Arc::new(RouteLifecycleManager::new(instance_name, engine));
        let dispatcher = manager.dispatcher();
        Self {
            manager,
            dispatcher,
        }
    }

    pub fn manager(&self) -> &Arc<RouteLifecycleManager> {
        &self.manager
    }

    /// Activation callback: parses the host property table and activates the route.
    pub fn on_scheduled(
        &self,
        properties: &HashMap<String, String>,
    ) -> Result<RouteIdentity, ActivationError> {
        let settings = RouteSettings::from_properties(properties)?;
        bridge_runtime::block_on(self.manager.activate(&settings))
    }

    /// Per-record callback. The record always comes back for forwarding.
    pub fn on_trigger(&self, record: Vec<u8>) -> ForwardedRecord {
        let outcome = bridge_runtime::block_on(self.dispatcher.send_record(&record)).into();
        ForwardedRecord {
            payload: record,
            outcome,
        }
    }

    /// Deactivation callback.
    pub fn on_stopped(&self) -> TeardownReport {
        bridge_runtime::block_on(self.manager.deactivate())
    }
}
