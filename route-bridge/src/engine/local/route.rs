//! A started local route: redelivery policy, error sink and the producer bound to it.

use crate::control_plane::route_configuration::RouteConfiguration;
use crate::engine::local::endpoint::DeliveryEndpoint;
use crate::engine::RouteProducer;
use crate::error::{DeliveryError, EngineError, EngineErrorKind};
use crate::observability::{event_at_level, events, fields};
use crate::settings::RouteLogLevel;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::warn;

const COMPONENT: &str = "local_route";

/// Retry count and spacing applied when a destination delivery fails.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct RedeliveryPolicy {
    pub(crate) maximum_redeliveries: u32,
    pub(crate) redelivery_delay: Duration,
}

impl RedeliveryPolicy {
    pub(crate) fn from_configuration(
        configuration: &RouteConfiguration,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            maximum_redeliveries: configuration.maximum_redeliveries()?,
            redelivery_delay: configuration.redelivery_delay()?,
        })
    }

    /// Total attempts: the first delivery plus every redelivery.
    pub(crate) fn max_attempts(&self) -> u32 {
        self.maximum_redeliveries.saturating_add(1)
    }
}

pub(crate) struct LocalRoute {
    route_id: String,
    route_name: String,
    destination: Option<DeliveryEndpoint>,
    error_endpoint: DeliveryEndpoint,
    policy: RedeliveryPolicy,
    trace_level: RouteLogLevel,
    running: AtomicBool,
    stopped: Notify,
}

impl LocalRoute {
    pub(crate) fn new(
        configuration: &RouteConfiguration,
        destination: Option<DeliveryEndpoint>,
        error_endpoint: DeliveryEndpoint,
        policy: RedeliveryPolicy,
        trace_level: RouteLogLevel,
    ) -> Self {
        Self {
            route_id: configuration.identity().to_string(),
            route_name: configuration.route_name().to_string(),
            destination,
            error_endpoint,
            policy,
            trace_level,
            running: AtomicBool::new(true),
            stopped: Notify::new(),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops accepting bodies and wakes exchanges waiting out a redelivery delay.
    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.stopped.notify_waiters();
    }

    fn stopped_error(&self, attempts: u32) -> DeliveryError {
        DeliveryError::new(
            attempts,
            EngineError::new(
                EngineErrorKind::RouteStopped,
                format!("route {} was stopped", self.route_name),
            ),
        )
    }

    /// Runs one exchange: deliver, redeliver per policy, then divert to the error endpoint.
    pub(crate) async fn process(&self, body: String) -> Result<(), DeliveryError> {
        if !self.is_running() {
            return Err(self.stopped_error(0));
        }

        if self.trace_level != RouteLogLevel::Off {
            let preview = fields::format_body_preview(&body);
            event_at_level!(
                self.trace_level,
                event = events::LOCAL_ROUTE_EXCHANGE,
                component = COMPONENT,
                route_id = self.route_id.as_str(),
                route_name = self.route_name.as_str(),
                body_len = body.len(),
                body = preview.as_str(),
                "exchange received"
            );
        }

        let Some(destination) = self.destination.as_ref() else {
            event_at_level!(
                self.trace_level,
                event = events::LOCAL_ROUTE_NO_DESTINATION,
                component = COMPONENT,
                route_id = self.route_id.as_str(),
                "route has no destination; exchange completed"
            );
            return Ok(());
        };

        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;
        let cause = loop {
            attempt += 1;
            let err = match destination.deliver(&body).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };
            if attempt >= max_attempts {
                break err;
            }

            event_at_level!(
                self.trace_level,
                event = events::LOCAL_ROUTE_REDELIVERY,
                component = COMPONENT,
                route_id = self.route_id.as_str(),
                attempt,
                max_attempts,
                err = %err,
                "delivery failed; scheduling redelivery"
            );

            // Register interest before re-checking the flag so a concurrent stop is not missed.
            let stopped = self.stopped.notified();
            tokio::pin!(stopped);
            stopped.as_mut().enable();
            if !self.is_running() {
                return Err(self.stopped_error(attempt));
            }
            tokio::select! {
                _ = tokio::time::sleep(self.policy.redelivery_delay) => {}
                _ = &mut stopped => return Err(self.stopped_error(attempt)),
            }
            if !self.is_running() {
                return Err(self.stopped_error(attempt));
            }
        };

        event_at_level!(
            self.trace_level,
            event = events::LOCAL_ROUTE_EXHAUSTED,
            component = COMPONENT,
            route_id = self.route_id.as_str(),
            attempt,
            err = %cause,
            "redeliveries exhausted; diverting to error endpoint"
        );
        if let Err(sink_err) = self.error_endpoint.deliver(&body).await {
            warn!(
                event = events::LOCAL_ROUTE_ERROR_SINK_FAILED,
                component = COMPONENT,
                route_id = self.route_id.as_str(),
                err = %sink_err,
                "error endpoint rejected failed exchange"
            );
        }

        Err(DeliveryError::new(attempt, cause))
    }
}

/// Producer bound to one [`LocalRoute`]'s entry endpoint.
pub(crate) struct LocalProducer {
    entry_uri: String,
    route: Arc<LocalRoute>,
    stopped: AtomicBool,
}

impl LocalProducer {
    pub(crate) fn new(entry_uri: String, route: Arc<LocalRoute>) -> Self {
        Self {
            entry_uri,
            route,
            stopped: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl RouteProducer for LocalProducer {
    async fn send_body(&self, body: String) -> Result<(), DeliveryError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(DeliveryError::new(
                0,
                EngineError::new(
                    EngineErrorKind::RouteStopped,
                    format!("producer for {} was stopped", self.entry_uri),
                ),
            ));
        }
        self.route.process(body).await
    }

    async fn stop(&self) -> Result<(), EngineError> {
        self.stopped.store(true, Ordering::Release);
        Ok(())
    }
}
