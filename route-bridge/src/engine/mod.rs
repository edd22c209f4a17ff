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

//! Engine layer.
//!
//! [`RouteEngine`] is the narrow seam to the embedded routing runtime that performs
//! protocol-level delivery and redelivery. [`LocalEngine`](local::LocalEngine) is the
//! in-process implementation; anything else implementing the trait can be swapped in.
//!
//! ```
//! use std::sync::Arc;
//! use route_bridge::{LocalEngine, RouteConfiguration, RouteEngine, RouteIdentity, RouteSettings};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = LocalEngine::new("engine-doc");
//! let identity = RouteIdentity::generate("engine-doc");
//! let settings = RouteSettings::default().with_to_uri("mock:out");
//!
//! engine.start().await.unwrap();
//! engine
//!     .apply_configuration(Arc::new(RouteConfiguration::build(&settings, &identity)))
//!     .await
//!     .unwrap();
//! engine.start_route(&identity).await.unwrap();
//!
//! let producer = engine.create_producer(&identity).await.unwrap();
//! producer.send_body("hello".to_string()).await.unwrap();
//! assert_eq!(engine.mock_endpoints().endpoint("out").received_bodies(), vec!["hello"]);
//!
//! engine.stop_route(&identity).await.unwrap();
//! engine.stop().await.unwrap();
//! # });
//! ```

pub(crate) mod facade;
pub mod local;

use crate::control_plane::route_configuration::RouteConfiguration;
use crate::control_plane::route_identity::RouteIdentity;
use crate::error::{DeliveryError, EngineError};
use async_trait::async_trait;
use std::sync::Arc;

/// Embedded routing runtime capable of hosting routes described by a
/// [`RouteConfiguration`].
#[async_trait]
pub trait RouteEngine: Send + Sync {
    /// Initializes the engine. Calling it on a running engine is a no-op.
    async fn start(&self) -> Result<(), EngineError>;

    /// Stops the engine. An engine shared between owners may defer the stop while
    /// routes of another owner are still registered.
    async fn stop(&self) -> Result<(), EngineError>;

    /// Registers a route under the configuration's identity without starting it.
    async fn apply_configuration(
        &self,
        configuration: Arc<RouteConfiguration>,
    ) -> Result<(), EngineError>;

    /// Activates a registered route, resolving its endpoints.
    async fn start_route(&self, identity: &RouteIdentity) -> Result<(), EngineError>;

    /// Stops and unregisters a route.
    async fn stop_route(&self, identity: &RouteIdentity) -> Result<(), EngineError>;

    /// Binds a send handle to the entry endpoint of a started route.
    async fn create_producer(
        &self,
        identity: &RouteIdentity,
    ) -> Result<Arc<dyn RouteProducer>, EngineError>;

    /// Number of routes currently registered.
    async fn route_count(&self) -> usize;
}

/// Send handle bound to one route's entry endpoint.
#[async_trait]
pub trait RouteProducer: Send + Sync {
    /// Submits a body and waits until the route accepts it or gives up on it.
    async fn send_body(&self, body: String) -> Result<(), DeliveryError>;

    /// Releases the handle. Later sends fail.
    async fn stop(&self) -> Result<(), EngineError>;
}
