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

//! # route-bridge
//!
//! `route-bridge` forwards records from a host streaming pipeline into one dynamically
//! provisioned message route per instance. The route delivers to a destination endpoint,
//! redelivers on failure and diverts records that still fail to an error endpoint.
//!
//! Typical usage is centered on [`RouteLifecycleManager`] and its [`Dispatcher`].
//!
//! ```
//! use std::sync::Arc;
//! use route_bridge::{LocalEngine, RouteLifecycleManager, RouteSettings};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = Arc::new(LocalEngine::new("quick-start"));
//! let manager = RouteLifecycleManager::new("quick-start", engine.clone());
//!
//! let settings = RouteSettings::default()
//!     .with_to_uri("mock:out")
//!     .with_maximum_redeliveries(2)
//!     .with_redelivery_delay_ms(100);
//! let identity = manager.activate(&settings).await.unwrap();
//! println!("route {identity} is active");
//!
//! manager.dispatcher().send("hello").await.unwrap();
//! assert_eq!(engine.mock_endpoints().endpoint("out").received_count(), 1);
//!
//! let report = manager.deactivate().await;
//! assert!(report.is_clean());
//! # });
//! ```
//!
//! Hosts that invoke callbacks from plain threads use [`RecordBridge`] instead, which
//! blocks on a shared runtime and always hands the record back for forwarding.
//!
//! ## Internal architecture map
//!
//! - Settings: typed user settings and the host property table
//! - Control plane: route identity, configuration table and the lifecycle state machine
//! - Engine: the [`RouteEngine`] seam, the activation/teardown facade and [`LocalEngine`]
//! - Data plane: per-record dispatch and the synchronous host bridge
//! - Runtime: the blocking boundary for synchronous callbacks and detached transitions
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber. Binaries and
//! tests are responsible for one-time `tracing_subscriber` initialization.

mod control_plane;
pub use control_plane::route_configuration::RouteConfiguration;
pub use control_plane::route_identity::RouteIdentity;
pub use control_plane::route_lifecycle::{LifecycleState, RouteLifecycleManager, TeardownReport};

/// Route-configuration table keys.
pub mod keys {
    pub use crate::control_plane::route_configuration::{
        DEFAULT_FLOW_TYPE, ERROR_URI, FLOW_LOG_LEVEL, FLOW_MAXIMUM_REDELIVERIES, FLOW_NAME,
        FLOW_OFFLOADING, FLOW_REDELIVERY_DELAY, FLOW_TYPE, FROM_URI, ID, OFFRAMP_URI_LIST,
        TO_URI,
    };
}

mod data_plane;
pub use data_plane::dispatcher::Dispatcher;
pub use data_plane::record_bridge::{DispatchOutcome, ForwardedRecord, RecordBridge};

mod engine;
pub use engine::facade::TeardownStep;
pub use engine::local::endpoint_uri::EndpointUri;
pub use engine::local::mock::{MockBehavior, MockEndpoint, MockEndpoints};
pub use engine::local::LocalEngine;
pub use engine::{RouteEngine, RouteProducer};

mod error;
pub use error::{
    ActivationError, ConfigurationError, DeliveryError, DispatchError, EngineError,
    EngineErrorKind,
};

#[doc(hidden)]
pub mod observability;
mod runtime;

mod settings;
pub use settings::{
    RouteLogLevel, RouteSettings, DEFAULT_MAXIMUM_REDELIVERIES, DEFAULT_REDELIVERY_DELAY_MS,
    ERROR_URI_PROPERTY, LOG_LEVEL_PROPERTY, MAXIMUM_REDELIVERIES_PROPERTY,
    REDELIVERY_DELAY_PROPERTY, TO_URI_PROPERTY,
};
