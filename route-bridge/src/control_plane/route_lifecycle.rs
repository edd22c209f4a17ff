/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Route lifecycle state machine: activation with rollback and best-effort teardown.

use crate::control_plane::route_configuration::RouteConfiguration;
use crate::control_plane::route_identity::RouteIdentity;
use crate::data_plane::dispatcher::{BoundProducer, Dispatcher, ProducerSlot};
use crate::engine::facade::{RouteEngineFacade, TeardownStep};
use crate::engine::{RouteEngine, RouteProducer};
use crate::error::ActivationError;
use crate::observability::{events, fields};
use crate::runtime::transition_task::run_to_completion;
use crate::settings::RouteSettings;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

const COMPONENT: &str = "route_lifecycle";

/// Lifecycle states: `Idle -> Starting -> Active -> Stopping -> Idle`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum LifecycleState {
    Idle = 0,
    Starting = 1,
    Active = 2,
    Stopping = 3,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LifecycleState::Starting,
            2 => LifecycleState::Active,
            3 => LifecycleState::Stopping,
            _ => LifecycleState::Idle,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Starting => "starting",
            LifecycleState::Active => "active",
            LifecycleState::Stopping => "stopping",
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Outcome of one deactivation. Teardown never fails as a whole; failed steps are listed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TeardownReport {
    route_id: Option<RouteIdentity>,
    failed_steps: Vec<TeardownStep>,
}

impl TeardownReport {
    /// Identity of the route that was torn down, or `None` if nothing was active.
    pub fn route_id(&self) -> Option<&RouteIdentity> {
        self.route_id.as_ref()
    }

    pub fn failed_steps(&self) -> &[TeardownStep] {
        &self.failed_steps
    }

    pub fn is_clean(&self) -> bool {
        self.failed_steps.is_empty()
    }
}

struct ActiveRoute {
    identity: RouteIdentity,
    configuration: Arc<RouteConfiguration>,
}

/// Owns one instance's route for its whole activation span.
///
/// Activation and deactivation are serialized; dispatchers obtained from
/// [`RouteLifecycleManager::dispatcher`] may send concurrently with either. Both
/// transitions run on a spawned task, so a caller that stops waiting (a timeout or a
/// losing `select!` branch) never leaves the manager stuck between states.
pub struct RouteLifecycleManager {
    core: Arc<LifecycleCore>,
}

struct LifecycleCore {
    instance_name: String,
    facade: RouteEngineFacade,
    state: AtomicU8,
    active: Mutex<Option<ActiveRoute>>,
    producer: ProducerSlot,
}

impl RouteLifecycleManager {
    /// Creates an idle manager; `instance_name` seeds every route identity it generates.
    pub fn new(instance_name: &str, engine: Arc<dyn RouteEngine>) -> Self {
        Self {
            core: Arc::new(LifecycleCore {
                instance_name: instance_name.to_string(),
                facade: RouteEngineFacade::new(engine),
                state: AtomicU8::new(LifecycleState::Idle as u8),
                active: Mutex::new(None),
                producer: Arc::new(RwLock::new(None)),
            }),
        }
    }

    pub fn instance_name(&self) -> &str {
        &self.core.instance_name
    }

    pub fn state(&self) -> LifecycleState {
        self.core.state()
    }

    /// Identity of the active route, if any.
    pub async fn route_identity(&self) -> Option<RouteIdentity> {
        self.core
            .active
            .lock()
            .await
            .as_ref()
            .map(|route| route.identity.clone())
    }

    /// Configuration table of the active route, if any.
    pub async fn route_configuration(&self) -> Option<Arc<RouteConfiguration>> {
        self.core
            .active
            .lock()
            .await
            .as_ref()
            .map(|route| route.configuration.clone())
    }

    /// Returns a dispatcher bound to this manager's producer slot.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.core.producer.clone())
    }

    /// Provisions a fresh route from `settings` and binds a producer to it.
    ///
    /// On failure every resource acquired by this attempt is released again and the
    /// manager is back in [`LifecycleState::Idle`]. Once called, the activation runs to
    /// its end even if the returned future is dropped.
    pub async fn activate(
        &self,
        settings: &RouteSettings,
    ) -> Result<RouteIdentity, ActivationError> {
        let core = self.core.clone();
        let settings = settings.clone();
        run_to_completion("activate", async move { core.activate(&settings).await })
            .await
            .unwrap_or(Err(ActivationError::Interrupted))
    }

    /// Stops route, producer and engine in that order, continuing past failures.
    ///
    /// A no-op returning an empty report when nothing is active. Once called, the
    /// teardown runs to its end even if the returned future is dropped.
    pub async fn deactivate(&self) -> TeardownReport {
        let core = self.core.clone();
        run_to_completion("deactivate", async move { core.deactivate().await })
            .await
            .unwrap_or_default()
    }
}

impl LifecycleCore {
    fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    async fn activate(&self, settings: &RouteSettings) -> Result<RouteIdentity, ActivationError> {
        if self
            .state
            .compare_exchange(
                LifecycleState::Idle as u8,
                LifecycleState::Starting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            let err = ActivationError::AlreadyActive;
            warn!(
                event = events::ROUTE_ACTIVATE_FAILED,
                component = COMPONENT,
                instance = self.instance_name.as_str(),
                state = self.state().as_label(),
                reason = err.as_label(),
                "activation refused"
            );
            return Err(err);
        }

        let mut active = self.active.lock().await;
        let identity = RouteIdentity::generate(&self.instance_name);
        let configuration = Arc::new(RouteConfiguration::build(settings, &identity));
        info!(
            event = events::ROUTE_ACTIVATE_START,
            component = COMPONENT,
            route_id = identity.as_str(),
            from_uri = configuration.from_uri(),
            to_uri = fields::format_uri(configuration.to_uri()),
            error_uri = configuration.error_uri(),
            "activating route"
        );

        match self.provision(&identity, configuration.clone()).await {
            Ok(producer) => {
                *self.producer.write().await = Some(BoundProducer {
                    identity: identity.clone(),
                    producer,
                });
                *active = Some(ActiveRoute {
                    identity: identity.clone(),
                    configuration,
                });
                self.set_state(LifecycleState::Active);
                info!(
                    event = events::ROUTE_ACTIVATE_OK,
                    component = COMPONENT,
                    route_id = identity.as_str(),
                    route_name = identity.route_name().as_str(),
                    "route active"
                );
                Ok(identity)
            }
            Err(err) => {
                warn!(
                    event = events::ROUTE_ACTIVATE_FAILED,
                    component = COMPONENT,
                    route_id = identity.as_str(),
                    reason = err.as_label(),
                    err = %err,
                    "activation failed; rolling back"
                );
                self.roll_back(&identity, &err).await;
                self.set_state(LifecycleState::Idle);
                Err(err)
            }
        }
    }

    async fn provision(
        &self,
        identity: &RouteIdentity,
        configuration: Arc<RouteConfiguration>,
    ) -> Result<Arc<dyn RouteProducer>, ActivationError> {
        self.facade.start_engine().await?;
        self.facade.apply_configuration(configuration).await?;
        self.facade.start_route(identity).await?;
        self.facade.create_producer(identity).await
    }

    async fn roll_back(&self, identity: &RouteIdentity, cause: &ActivationError) {
        let route_registered = matches!(
            cause,
            ActivationError::RouteStart(_) | ActivationError::ProducerCreate(_)
        );
        let route_released = !route_registered || self.facade.stop_route(identity).await;
        let engine_released = self.facade.stop_engine(identity).await;
        debug!(
            event = events::ROUTE_ACTIVATE_ROLLBACK,
            component = COMPONENT,
            route_id = identity.as_str(),
            route_released,
            engine_released,
            "activation rolled back"
        );
    }

    async fn deactivate(&self) -> TeardownReport {
        let mut active = self.active.lock().await;
        let Some(identity) = active.as_ref().map(|route| route.identity.clone()) else {
            debug!(
                event = events::ROUTE_DEACTIVATE_SKIPPED,
                component = COMPONENT,
                instance = self.instance_name.as_str(),
                "no active route to deactivate"
            );
            return TeardownReport::default();
        };

        self.set_state(LifecycleState::Stopping);
        info!(
            event = events::ROUTE_DEACTIVATE_START,
            component = COMPONENT,
            route_id = identity.as_str(),
            "deactivating route"
        );

        // New sends see NotActive from here on; in-flight ones keep their own handle.
        let producer = self.producer.write().await.take();
        let mut failed_steps = Vec::new();

        if !self.facade.stop_route(&identity).await {
            failed_steps.push(TeardownStep::StopRoute);
        }
        if let Some(bound) = producer {
            if !self
                .facade
                .stop_producer(bound.producer.as_ref(), &identity)
                .await
            {
                failed_steps.push(TeardownStep::StopProducer);
            }
        }
        if !self.facade.stop_engine(&identity).await {
            failed_steps.push(TeardownStep::StopEngine);
        }

        // The route stays recorded until every step has run.
        *active = None;
        self.set_state(LifecycleState::Idle);
        info!(
            event = events::ROUTE_DEACTIVATE_OK,
            component = COMPONENT,
            route_id = identity.as_str(),
            failed_steps = failed_steps.len(),
            "route deactivated"
        );

        TeardownReport {
            route_id: Some(identity),
            failed_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleState, RouteLifecycleManager};
    use crate::engine::RouteEngine;
    use crate::error::{ActivationError, DispatchError};
    use crate::{LocalEngine, MockEndpoints, RouteSettings};
    use std::sync::Arc;

    fn manager() -> (RouteLifecycleManager, Arc<LocalEngine>, MockEndpoints) {
        let mocks = MockEndpoints::new();
        let engine = Arc::new(LocalEngine::with_mock_endpoints(
            "lifecycle-test",
            mocks.clone(),
        ));
        let manager = RouteLifecycleManager::new("lifecycle", engine.clone());
        (manager, engine, mocks)
    }

    #[test]
    fn state_labels_are_stable() {
        assert_eq!(LifecycleState::Idle.to_string(), "idle");
        assert_eq!(LifecycleState::Stopping.as_label(), "stopping");
    }

    #[tokio::test]
    async fn activate_then_deactivate_walks_every_state() {
        let (manager, engine, _mocks) = manager();
        assert_eq!(manager.state(), LifecycleState::Idle);

        let identity = manager
            .activate(&RouteSettings::default().with_to_uri("mock:out"))
            .await
            .expect("activation");
        assert_eq!(manager.state(), LifecycleState::Active);
        assert_eq!(manager.route_identity().await, Some(identity.clone()));
        assert_eq!(engine.route_count().await, 1);

        let report = manager.deactivate().await;
        assert!(report.is_clean());
        assert_eq!(report.route_id(), Some(&identity));
        assert_eq!(manager.state(), LifecycleState::Idle);
        assert!(manager.route_configuration().await.is_none());
        assert_eq!(engine.route_count().await, 0);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn second_activation_is_refused_while_active() {
        let (manager, engine, _mocks) = manager();
        let identity = manager
            .activate(&RouteSettings::default())
            .await
            .expect("activation");

        let err = manager
            .activate(&RouteSettings::default())
            .await
            .expect_err("already active");

        assert!(matches!(err, ActivationError::AlreadyActive));
        assert_eq!(manager.route_identity().await, Some(identity));
        assert_eq!(engine.route_count().await, 1);
    }

    #[tokio::test]
    async fn deactivate_while_idle_is_a_noop() {
        let (manager, _engine, _mocks) = manager();

        let report = manager.deactivate().await;

        assert!(report.is_clean());
        assert!(report.route_id().is_none());
        assert_eq!(manager.state(), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn failed_route_start_rolls_back_to_idle() {
        let (manager, engine, mocks) = manager();
        mocks.unresolvable("gone");

        let err = manager
            .activate(&RouteSettings::default().with_to_uri("mock:gone"))
            .await
            .expect_err("destination cannot be resolved");

        assert!(matches!(err, ActivationError::RouteStart(_)));
        assert_eq!(manager.state(), LifecycleState::Idle);
        assert_eq!(engine.route_count().await, 0);
        assert!(!engine.is_running());
        assert_eq!(
            manager.dispatcher().send("x").await,
            Err(DispatchError::NotActive)
        );
    }

    #[tokio::test]
    async fn malformed_destination_fails_as_route_config_error() {
        let (manager, engine, _mocks) = manager();

        let err = manager
            .activate(&RouteSettings::default().with_to_uri("no scheme here"))
            .await
            .expect_err("malformed uri");

        assert!(matches!(err, ActivationError::RouteConfig(_)));
        assert_eq!(engine.route_count().await, 0);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn reactivation_generates_a_new_identity() {
        let (manager, _engine, _mocks) = manager();

        let first = manager
            .activate(&RouteSettings::default())
            .await
            .expect("first activation");
        manager.deactivate().await;
        let second = manager
            .activate(&RouteSettings::default())
            .await
            .expect("second activation");

        assert_ne!(first, second);
    }
}
