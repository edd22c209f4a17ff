//! Data-plane layer.
//!
//! Carries records from the host into the active route. Dispatchers only read the
//! producer slot owned by the lifecycle manager; they never start or stop anything.
//!
//! ```
//! use std::sync::Arc;
//! use route_bridge::{DispatchError, LocalEngine, RouteLifecycleManager, RouteSettings};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = Arc::new(LocalEngine::new("data-plane-doc"));
//! let manager = RouteLifecycleManager::new("data-plane-doc", engine.clone());
//! let dispatcher = manager.dispatcher();
//!
//! assert_eq!(dispatcher.send("early").await, Err(DispatchError::NotActive));
//!
//! manager
//!     .activate(&RouteSettings::default().with_to_uri("mock:out"))
//!     .await
//!     .unwrap();
//! dispatcher.send("hello").await.unwrap();
//! assert_eq!(engine.mock_endpoints().endpoint("out").received_bodies(), vec!["hello"]);
//! manager.deactivate().await;
//! # });
//! ```

pub(crate) mod dispatcher;
pub(crate) mod record_bridge;
