//! Per-record dispatch through the active route's producer handle.

use crate::control_plane::route_identity::RouteIdentity;
use crate::engine::RouteProducer;
use crate::error::DispatchError;
use crate::observability::{events, fields};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const COMPONENT: &str = "dispatcher";

/// Producer handle together with the route it is bound to.
#[derive(Clone)]
pub(crate) struct BoundProducer {
    pub(crate) identity: RouteIdentity,
    pub(crate) producer: Arc<dyn RouteProducer>,
}

/// Slot written by the lifecycle manager and read by every dispatcher clone.
pub(crate) type ProducerSlot = Arc<RwLock<Option<BoundProducer>>>;

/// Sends record payloads into the currently active route.
///
/// Cheap to clone; clones observe the same lifecycle manager, so worker tasks can hold
/// their own copy.
#[derive(Clone)]
pub struct Dispatcher {
    producer: ProducerSlot,
}

impl Dispatcher {
    pub(crate) fn new(producer: ProducerSlot) -> Self {
        Self { producer }
    }

    /// Submits `payload` and waits for the route's verdict, redeliveries included.
    ///
    /// Fails with [`DispatchError::NotActive`] when no route is active.
    pub async fn send(&self, payload: &str) -> Result<(), DispatchError> {
        // Clone the handle out so deactivation never waits on an in-flight delivery.
        let bound = self.producer.read().await.clone();
        let Some(bound) = bound else {
            debug!(
                event = events::DISPATCH_NOT_ACTIVE,
                component = COMPONENT,
                "no active route; record not sent"
            );
            return Err(DispatchError::NotActive);
        };

        let worker_thread = fields::current_thread_name_or_default();
        debug!(
            event = events::DISPATCH_ATTEMPT,
            component = COMPONENT,
            route_id = bound.identity.as_str(),
            worker_thread = worker_thread.as_str(),
            body_len = payload.len(),
            "sending record"
        );

        match bound.producer.send_body(payload.to_string()).await {
            Ok(()) => {
                debug!(
                    event = events::DISPATCH_OK,
                    component = COMPONENT,
                    route_id = bound.identity.as_str(),
                    worker_thread = worker_thread.as_str(),
                    "record accepted by route"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::DISPATCH_FAILED,
                    component = COMPONENT,
                    route_id = bound.identity.as_str(),
                    worker_thread = worker_thread.as_str(),
                    attempt = err.attempts(),
                    err = %err,
                    "failed to send record to route"
                );
                Err(DispatchError::Delivery(err))
            }
        }
    }

    /// Decodes a raw record (lossy UTF-8) and sends it.
    pub async fn send_record(&self, record: &[u8]) -> Result<(), DispatchError> {
        self.send(&String::from_utf8_lossy(record)).await
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundProducer, Dispatcher, ProducerSlot};
    use crate::engine::RouteProducer;
    use crate::error::{DeliveryError, DispatchError, EngineError, EngineErrorKind};
    use crate::RouteIdentity;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct RecordingProducer {
        bodies: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl RouteProducer for RecordingProducer {
        async fn send_body(&self, body: String) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::new(
                    1,
                    EngineError::new(EngineErrorKind::Unreachable, "refused"),
                ));
            }
            self.bodies.lock().expect("not poisoned").push(body);
            Ok(())
        }

        async fn stop(&self) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn bound_slot(producer: Arc<RecordingProducer>) -> ProducerSlot {
        Arc::new(RwLock::new(Some(BoundProducer {
            identity: RouteIdentity::generate("dispatcher"),
            producer,
        })))
    }

    #[tokio::test]
    async fn send_without_producer_is_not_active() {
        let dispatcher = Dispatcher::new(Arc::new(RwLock::new(None)));

        assert_eq!(dispatcher.send("x").await, Err(DispatchError::NotActive));
    }

    #[tokio::test]
    async fn send_record_decodes_lossily() {
        let producer = Arc::new(RecordingProducer::default());
        let dispatcher = Dispatcher::new(bound_slot(producer.clone()));

        dispatcher
            .send_record(&[b'h', b'i', 0xff])
            .await
            .expect("accepted");

        assert_eq!(
            *producer.bodies.lock().expect("not poisoned"),
            vec!["hi\u{FFFD}".to_string()]
        );
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_with_cause() {
        let producer = Arc::new(RecordingProducer {
            fail: true,
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(bound_slot(producer));

        let err = dispatcher.send("x").await.expect_err("refused");
        let DispatchError::Delivery(delivery) = err else {
            panic!("expected delivery error, got {err:?}");
        };
        assert_eq!(delivery.cause().kind(), EngineErrorKind::Unreachable);
    }
}
