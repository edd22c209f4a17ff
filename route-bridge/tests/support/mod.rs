#![allow(dead_code)]

use async_trait::async_trait;
use route_bridge::{
    DeliveryError, EngineError, EngineErrorKind, LocalEngine, MockEndpoints, RouteConfiguration,
    RouteEngine, RouteIdentity, RouteLifecycleManager, RouteProducer,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn local_manager(
    name: &str,
) -> (RouteLifecycleManager, Arc<LocalEngine>, MockEndpoints) {
    init_logging();
    let mocks = MockEndpoints::new();
    let engine = Arc::new(LocalEngine::with_mock_endpoints(name, mocks.clone()));
    let manager = RouteLifecycleManager::new(name, engine.clone());
    (manager, engine, mocks)
}

/// Every engine and producer operation the lifecycle manager can invoke.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum EngineCall {
    Start,
    Stop,
    ApplyConfiguration,
    StartRoute,
    StopRoute,
    CreateProducer,
    StopProducer,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Engine fake that records calls in order, fails the calls it was told to fail and
/// stalls the calls it was told to stall.
#[derive(Default)]
pub(crate) struct ScriptedEngine {
    failing: HashSet<EngineCall>,
    stalls: HashMap<EngineCall, Duration>,
    calls: Arc<Mutex<Vec<EngineCall>>>,
    routes: Mutex<HashSet<RouteIdentity>>,
}

impl ScriptedEngine {
    pub(crate) fn failing_at(calls: &[EngineCall]) -> Arc<Self> {
        Arc::new(Self {
            failing: calls.iter().copied().collect(),
            ..Default::default()
        })
    }

    /// Succeeds everywhere but sleeps for `stall` inside `call`.
    pub(crate) fn stalling_at(call: EngineCall, stall: Duration) -> Arc<Self> {
        Arc::new(Self {
            stalls: HashMap::from([(call, stall)]),
            ..Default::default()
        })
    }

    pub(crate) fn calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    async fn record(&self, call: EngineCall) -> Result<(), EngineError> {
        if let Some(stall) = self.stalls.get(&call) {
            tokio::time::sleep(*stall).await;
        }
        record(&self.calls, &self.failing, call)
    }
}

fn record(
    calls: &Mutex<Vec<EngineCall>>,
    failing: &HashSet<EngineCall>,
    call: EngineCall,
) -> Result<(), EngineError> {
    lock(calls).push(call);
    if failing.contains(&call) {
        return Err(EngineError::new(
            EngineErrorKind::Internal,
            format!("scripted failure at {call:?}"),
        ));
    }
    Ok(())
}

#[async_trait]
impl RouteEngine for ScriptedEngine {
    async fn start(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Start).await
    }

    async fn stop(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Stop).await?;
        lock(&self.routes).clear();
        Ok(())
    }

    async fn apply_configuration(
        &self,
        configuration: Arc<RouteConfiguration>,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::ApplyConfiguration).await?;
        lock(&self.routes).insert(configuration.identity().clone());
        Ok(())
    }

    async fn start_route(&self, _identity: &RouteIdentity) -> Result<(), EngineError> {
        self.record(EngineCall::StartRoute).await
    }

    async fn stop_route(&self, identity: &RouteIdentity) -> Result<(), EngineError> {
        self.record(EngineCall::StopRoute).await?;
        lock(&self.routes).remove(identity);
        Ok(())
    }

    async fn create_producer(
        &self,
        _identity: &RouteIdentity,
    ) -> Result<Arc<dyn RouteProducer>, EngineError> {
        self.record(EngineCall::CreateProducer).await?;
        Ok(Arc::new(ScriptedProducer {
            calls: self.calls.clone(),
            failing: self.failing.clone(),
        }))
    }

    async fn route_count(&self) -> usize {
        lock(&self.routes).len()
    }
}

struct ScriptedProducer {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    failing: HashSet<EngineCall>,
}

#[async_trait]
impl RouteProducer for ScriptedProducer {
    async fn send_body(&self, _body: String) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        record(&self.calls, &self.failing, EngineCall::StopProducer)
    }
}
