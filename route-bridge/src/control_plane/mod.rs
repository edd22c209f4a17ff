//! Control-plane layer.
//!
//! Owns the per-activation route identity, the configuration table built from user
//! settings, and the lifecycle state machine that provisions and tears down the route.
//! Activation either reaches `Active` or rolls back every resource it acquired.
//!
//! ```
//! use std::sync::Arc;
//! use route_bridge::{
//!     LifecycleState, LocalEngine, RouteEngine, RouteLifecycleManager, RouteSettings,
//! };
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = Arc::new(LocalEngine::new("control-plane-doc"));
//! let manager = RouteLifecycleManager::new("control-plane-doc", engine.clone());
//!
//! // Each activation cycle registers exactly one route and leaves none behind.
//! for _ in 0..3 {
//!     manager.activate(&RouteSettings::default()).await.unwrap();
//!     assert_eq!(manager.state(), LifecycleState::Active);
//!     assert_eq!(engine.route_count().await, 1);
//!     assert!(manager.deactivate().await.is_clean());
//! }
//! assert_eq!(engine.route_count().await, 0);
//! # });
//! ```

pub(crate) mod route_configuration;
pub(crate) mod route_identity;
pub(crate) mod route_lifecycle;
