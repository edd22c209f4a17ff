//! Adapts a [`RouteEngine`] to the activation steps and the best-effort teardown steps.

use crate::control_plane::route_configuration::RouteConfiguration;
use crate::control_plane::route_identity::RouteIdentity;
use crate::engine::{RouteEngine, RouteProducer};
use crate::error::{ActivationError, EngineError};
use crate::observability::events;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "engine_facade";

/// One teardown step, reported when it fails.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TeardownStep {
    StopRoute,
    StopProducer,
    StopEngine,
}

impl TeardownStep {
    pub fn as_label(&self) -> &'static str {
        match self {
            TeardownStep::StopRoute => "stop_route",
            TeardownStep::StopProducer => "stop_producer",
            TeardownStep::StopEngine => "stop_engine",
        }
    }
}

impl Display for TeardownStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Owns the engine handle for one lifecycle manager.
pub(crate) struct RouteEngineFacade {
    engine: Arc<dyn RouteEngine>,
    engine_started: AtomicBool,
}

impl RouteEngineFacade {
    pub(crate) fn new(engine: Arc<dyn RouteEngine>) -> Self {
        Self {
            engine,
            engine_started: AtomicBool::new(false),
        }
    }

    /// Starts the engine once per activation; repeated calls are no-ops until
    /// [`RouteEngineFacade::stop_engine`] runs.
    pub(crate) async fn start_engine(&self) -> Result<(), ActivationError> {
        if self.engine_started.load(Ordering::Acquire) {
            debug!(
                event = events::ENGINE_START_REUSED,
                component = COMPONENT,
                "engine already started"
            );
            return Ok(());
        }

        match self.engine.start().await {
            Ok(()) => {
                self.engine_started.store(true, Ordering::Release);
                info!(
                    event = events::ENGINE_START_OK,
                    component = COMPONENT,
                    "engine started"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::ENGINE_START_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "engine start failed"
                );
                Err(ActivationError::EngineStart(err))
            }
        }
    }

    pub(crate) async fn apply_configuration(
        &self,
        configuration: Arc<RouteConfiguration>,
    ) -> Result<(), ActivationError> {
        let route_id = configuration.identity().to_string();
        match self.engine.apply_configuration(configuration).await {
            Ok(()) => {
                debug!(
                    event = events::ENGINE_CONFIGURE_OK,
                    component = COMPONENT,
                    route_id = route_id.as_str(),
                    "route configuration applied"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::ENGINE_CONFIGURE_FAILED,
                    component = COMPONENT,
                    route_id = route_id.as_str(),
                    err = %err,
                    "route configuration rejected"
                );
                Err(ActivationError::RouteConfig(err))
            }
        }
    }

    pub(crate) async fn start_route(
        &self,
        identity: &RouteIdentity,
    ) -> Result<(), ActivationError> {
        match self.engine.start_route(identity).await {
            Ok(()) => {
                debug!(
                    event = events::ENGINE_ROUTE_START_OK,
                    component = COMPONENT,
                    route_id = identity.as_str(),
                    "route started"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::ENGINE_ROUTE_START_FAILED,
                    component = COMPONENT,
                    route_id = identity.as_str(),
                    err = %err,
                    "route start failed"
                );
                Err(ActivationError::RouteStart(err))
            }
        }
    }

    pub(crate) async fn create_producer(
        &self,
        identity: &RouteIdentity,
    ) -> Result<Arc<dyn RouteProducer>, ActivationError> {
        match self.engine.create_producer(identity).await {
            Ok(producer) => {
                debug!(
                    event = events::ENGINE_PRODUCER_CREATE_OK,
                    component = COMPONENT,
                    route_id = identity.as_str(),
                    "producer bound to route entry"
                );
                Ok(producer)
            }
            Err(err) => {
                warn!(
                    event = events::ENGINE_PRODUCER_CREATE_FAILED,
                    component = COMPONENT,
                    route_id = identity.as_str(),
                    err = %err,
                    "producer creation failed"
                );
                Err(ActivationError::ProducerCreate(err))
            }
        }
    }

    /// Returns `false` when the step failed; the failure is logged, never raised.
    pub(crate) async fn stop_route(&self, identity: &RouteIdentity) -> bool {
        let result = self.engine.stop_route(identity).await;
        Self::log_teardown_step(TeardownStep::StopRoute, identity, result)
    }

    pub(crate) async fn stop_producer(
        &self,
        producer: &dyn RouteProducer,
        identity: &RouteIdentity,
    ) -> bool {
        let result = producer.stop().await;
        Self::log_teardown_step(TeardownStep::StopProducer, identity, result)
    }

    /// Stops the engine if this facade started it.
    pub(crate) async fn stop_engine(&self, identity: &RouteIdentity) -> bool {
        if !self.engine_started.swap(false, Ordering::AcqRel) {
            return true;
        }
        let result = self.engine.stop().await;
        Self::log_teardown_step(TeardownStep::StopEngine, identity, result)
    }

    fn log_teardown_step(
        step: TeardownStep,
        identity: &RouteIdentity,
        result: Result<(), EngineError>,
    ) -> bool {
        match result {
            Ok(()) => {
                debug!(
                    event = events::TEARDOWN_STEP_OK,
                    component = COMPONENT,
                    route_id = identity.as_str(),
                    step = step.as_label(),
                    "teardown step done"
                );
                true
            }
            Err(err) => {
                warn!(
                    event = events::TEARDOWN_STEP_FAILED,
                    component = COMPONENT,
                    route_id = identity.as_str(),
                    step = step.as_label(),
                    err = %err,
                    "teardown step failed; continuing"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RouteEngineFacade;
    use crate::engine::local::LocalEngine;
    use crate::error::ActivationError;
    use crate::{RouteConfiguration, RouteEngine, RouteIdentity, RouteSettings};
    use std::sync::Arc;

    #[tokio::test]
    async fn start_engine_is_idempotent_within_an_activation() {
        let engine = Arc::new(LocalEngine::new("facade"));
        let facade = RouteEngineFacade::new(engine.clone());

        facade.start_engine().await.expect("first start");
        facade.start_engine().await.expect("second start is a no-op");
        assert!(engine.is_running());

        let identity = RouteIdentity::generate("facade");
        assert!(facade.stop_engine(&identity).await);
        assert!(!engine.is_running());
        // A second stop has nothing left to do.
        assert!(facade.stop_engine(&identity).await);
    }

    #[tokio::test]
    async fn apply_configuration_maps_rejection_to_route_config_error() {
        let engine = Arc::new(LocalEngine::new("facade"));
        let facade = RouteEngineFacade::new(engine);
        facade.start_engine().await.expect("start");

        let identity = RouteIdentity::generate("facade");
        let configuration = RouteConfiguration::build(&RouteSettings::default(), &identity)
            .with_property("flow.type", "exotic");

        let err = facade
            .apply_configuration(Arc::new(configuration))
            .await
            .expect_err("unknown flow type");
        assert!(matches!(err, ActivationError::RouteConfig(_)));
    }

    #[tokio::test]
    async fn create_producer_before_route_start_fails() {
        let engine = Arc::new(LocalEngine::new("facade"));
        let facade = RouteEngineFacade::new(engine.clone());
        facade.start_engine().await.expect("start");

        let identity = RouteIdentity::generate("facade");
        let configuration = RouteConfiguration::build(
            &RouteSettings::default().with_to_uri("mock:out"),
            &identity,
        );
        facade
            .apply_configuration(Arc::new(configuration))
            .await
            .expect("apply");

        let err = facade
            .create_producer(&identity)
            .await
            .err()
            .expect("route not started yet");
        assert!(matches!(err, ActivationError::ProducerCreate(_)));
        assert_eq!(engine.route_count().await, 1);
    }

    #[tokio::test]
    async fn stop_route_failure_is_reported_not_raised() {
        let engine = Arc::new(LocalEngine::new("facade"));
        let facade = RouteEngineFacade::new(engine);
        facade.start_engine().await.expect("start");

        let unknown = RouteIdentity::generate("never-configured");
        assert!(!facade.stop_route(&unknown).await);
    }
}
