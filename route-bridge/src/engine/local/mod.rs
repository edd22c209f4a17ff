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

//! In-process route engine.
//!
//! Hosts routes whose entry is a `local:` endpoint and whose destination and error
//! endpoints use the `mock:`, `log:` or `file:` components. Delivery happens inline on
//! the producer's task, so a send completes only once the exchange is done.

mod endpoint;
pub(crate) mod endpoint_uri;
pub(crate) mod mock;
mod route;

use crate::control_plane::route_configuration::{RouteConfiguration, DEFAULT_FLOW_TYPE, ID};
use crate::control_plane::route_identity::RouteIdentity;
use crate::engine::local::endpoint::{DeliveryEndpoint, LOCAL_SCHEME};
use crate::engine::local::endpoint_uri::EndpointUri;
use crate::engine::local::mock::MockEndpoints;
use crate::engine::local::route::{LocalProducer, LocalRoute, RedeliveryPolicy};
use crate::engine::{RouteEngine, RouteProducer};
use crate::error::{EngineError, EngineErrorKind};
use crate::observability::events;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const COMPONENT: &str = "local_engine";

struct RouteSlot {
    configuration: Arc<RouteConfiguration>,
    route: Option<Arc<LocalRoute>>,
}

/// Embedded engine running routes on the caller's Tokio runtime.
///
/// Meant to be owned by one [`RouteLifecycleManager`](crate::RouteLifecycleManager).
/// When several managers do share it, [`RouteEngine::stop`] leaves the engine running
/// until the last registered route has been stopped, so one manager's teardown never
/// removes another manager's route.
pub struct LocalEngine {
    name: String,
    mock_endpoints: MockEndpoints,
    running: AtomicBool,
    routes: Mutex<HashMap<RouteIdentity, RouteSlot>>,
}

impl LocalEngine {
    pub fn new(name: &str) -> Self {
        Self::with_mock_endpoints(name, MockEndpoints::new())
    }

    /// Creates an engine whose `mock:` endpoints come from a shared registry.
    pub fn with_mock_endpoints(name: &str, mock_endpoints: MockEndpoints) -> Self {
        Self {
            name: name.to_string(),
            mock_endpoints,
            running: AtomicBool::new(false),
            routes: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mock_endpoints(&self) -> &MockEndpoints {
        &self.mock_endpoints
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(EngineError::new(
                EngineErrorKind::NotStarted,
                format!("engine {} is not started", self.name),
            ))
        }
    }

    fn route_not_found(identity: &RouteIdentity) -> EngineError {
        EngineError::new(
            EngineErrorKind::RouteNotFound,
            format!("no route registered for {identity}"),
        )
    }

    fn invalid_configuration(message: String) -> EngineError {
        EngineError::new(EngineErrorKind::InvalidConfiguration, message)
    }

    fn parse_local_uri(raw: &str) -> Result<EndpointUri, EngineError> {
        let uri = raw.parse::<EndpointUri>()?;
        if uri.scheme() != LOCAL_SCHEME {
            return Err(EngineError::new(
                EngineErrorKind::UnknownScheme,
                format!("internal endpoint {raw:?} must use the {LOCAL_SCHEME}: scheme"),
            ));
        }
        Ok(uri)
    }

    /// Checks everything that can be checked without touching endpoints.
    fn validate(configuration: &RouteConfiguration) -> Result<(), EngineError> {
        if configuration.get(ID) != Some(configuration.identity().as_str()) {
            return Err(Self::invalid_configuration(format!(
                "route id does not match identity {}",
                configuration.identity()
            )));
        }
        if configuration.flow_type() != DEFAULT_FLOW_TYPE {
            return Err(Self::invalid_configuration(format!(
                "unsupported flow type {:?}",
                configuration.flow_type()
            )));
        }
        RedeliveryPolicy::from_configuration(configuration)?;
        configuration.log_level()?;

        Self::parse_local_uri(configuration.from_uri())?;
        Self::parse_local_uri(configuration.offramp_key())?;
        if !configuration.to_uri().trim().is_empty() {
            DeliveryEndpoint::validate(&configuration.to_uri().parse::<EndpointUri>()?)?;
        }
        DeliveryEndpoint::validate(&configuration.error_uri().parse::<EndpointUri>()?)?;
        Ok(())
    }

    async fn build_route(
        &self,
        configuration: &RouteConfiguration,
    ) -> Result<LocalRoute, EngineError> {
        let destination = match configuration.to_uri().trim() {
            "" => None,
            raw => {
                let uri = raw.parse::<EndpointUri>()?;
                Some(DeliveryEndpoint::resolve(&uri, &self.mock_endpoints).await?)
            }
        };
        let error_uri = configuration.error_uri().parse::<EndpointUri>()?;
        let error_endpoint = DeliveryEndpoint::resolve(&error_uri, &self.mock_endpoints).await?;

        Ok(LocalRoute::new(
            configuration,
            destination,
            error_endpoint,
            RedeliveryPolicy::from_configuration(configuration)?,
            configuration.log_level()?,
        ))
    }
}

#[async_trait]
impl RouteEngine for LocalEngine {
    async fn start(&self) -> Result<(), EngineError> {
        if !self.running.swap(true, Ordering::AcqRel) {
            info!(
                event = events::LOCAL_ENGINE_STARTED,
                component = COMPONENT,
                engine = self.name.as_str(),
                "local engine started"
            );
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        // Routes still registered belong to another owner; the last stop shuts down.
        let routes = self.routes.lock().await;
        if !routes.is_empty() {
            debug!(
                event = events::LOCAL_ENGINE_STOP_DEFERRED,
                component = COMPONENT,
                engine = self.name.as_str(),
                remaining_routes = routes.len(),
                "routes still registered; engine keeps running"
            );
            return Ok(());
        }
        if self.running.swap(false, Ordering::AcqRel) {
            info!(
                event = events::LOCAL_ENGINE_STOPPED,
                component = COMPONENT,
                engine = self.name.as_str(),
                "local engine stopped"
            );
        }
        Ok(())
    }

    async fn apply_configuration(
        &self,
        configuration: Arc<RouteConfiguration>,
    ) -> Result<(), EngineError> {
        self.ensure_running()?;
        Self::validate(&configuration)?;

        let mut routes = self.routes.lock().await;
        let identity = configuration.identity().clone();
        if routes.contains_key(&identity) {
            return Err(Self::invalid_configuration(format!(
                "route {identity} is already configured"
            )));
        }
        if routes
            .values()
            .any(|slot| slot.configuration.from_uri() == configuration.from_uri())
        {
            return Err(Self::invalid_configuration(format!(
                "entry endpoint {} is already in use",
                configuration.from_uri()
            )));
        }

        debug!(
            event = events::LOCAL_ROUTE_CONFIGURED,
            component = COMPONENT,
            route_id = identity.as_str(),
            from_uri = configuration.from_uri(),
            "route configured"
        );
        routes.insert(
            identity,
            RouteSlot {
                configuration,
                route: None,
            },
        );
        Ok(())
    }

    async fn start_route(&self, identity: &RouteIdentity) -> Result<(), EngineError> {
        self.ensure_running()?;

        let mut routes = self.routes.lock().await;
        let slot = routes
            .get_mut(identity)
            .ok_or_else(|| Self::route_not_found(identity))?;
        if slot.route.is_some() {
            return Ok(());
        }

        let route = self.build_route(&slot.configuration).await?;
        slot.route = Some(Arc::new(route));
        debug!(
            event = events::LOCAL_ROUTE_STARTED,
            component = COMPONENT,
            route_id = identity.as_str(),
            "route started"
        );
        Ok(())
    }

    async fn stop_route(&self, identity: &RouteIdentity) -> Result<(), EngineError> {
        let removed = self.routes.lock().await.remove(identity);
        let slot = removed.ok_or_else(|| Self::route_not_found(identity))?;
        if let Some(route) = slot.route {
            route.stop();
        }
        debug!(
            event = events::LOCAL_ROUTE_REMOVED,
            component = COMPONENT,
            route_id = identity.as_str(),
            "route stopped and removed"
        );
        Ok(())
    }

    async fn create_producer(
        &self,
        identity: &RouteIdentity,
    ) -> Result<Arc<dyn RouteProducer>, EngineError> {
        self.ensure_running()?;

        let routes = self.routes.lock().await;
        let slot = routes
            .get(identity)
            .ok_or_else(|| Self::route_not_found(identity))?;
        let Some(route) = slot.route.as_ref().filter(|route| route.is_running()) else {
            return Err(EngineError::new(
                EngineErrorKind::NotStarted,
                format!("route {identity} is not started"),
            ));
        };

        Ok(Arc::new(LocalProducer::new(
            slot.configuration.from_uri().to_string(),
            route.clone(),
        )))
    }

    async fn route_count(&self) -> usize {
        self.routes.lock().await.len()
    }
}
