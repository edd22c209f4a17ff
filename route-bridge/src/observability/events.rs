//! Canonical structured event names used across `route-bridge`.

// Lifecycle manager events.
pub const ROUTE_ACTIVATE_START: &str = "route_activate_start";
pub const ROUTE_ACTIVATE_OK: &str = "route_activate_ok";
pub const ROUTE_ACTIVATE_FAILED: &str = "route_activate_failed";
pub const ROUTE_ACTIVATE_ROLLBACK: &str = "route_activate_rollback";
pub const ROUTE_DEACTIVATE_START: &str = "route_deactivate_start";
pub const ROUTE_DEACTIVATE_OK: &str = "route_deactivate_ok";
pub const ROUTE_DEACTIVATE_SKIPPED: &str = "route_deactivate_skipped";
pub const TRANSITION_TASK_CANCELLED: &str = "transition_task_cancelled";

// Engine facade events.
pub const ENGINE_START_OK: &str = "engine_start_ok";
pub const ENGINE_START_FAILED: &str = "engine_start_failed";
pub const ENGINE_START_REUSED: &str = "engine_start_reused";
pub const ENGINE_CONFIGURE_OK: &str = "engine_configure_ok";
pub const ENGINE_CONFIGURE_FAILED: &str = "engine_configure_failed";
pub const ENGINE_ROUTE_START_OK: &str = "engine_route_start_ok";
pub const ENGINE_ROUTE_START_FAILED: &str = "engine_route_start_failed";
pub const ENGINE_PRODUCER_CREATE_OK: &str = "engine_producer_create_ok";
pub const ENGINE_PRODUCER_CREATE_FAILED: &str = "engine_producer_create_failed";
pub const TEARDOWN_STEP_OK: &str = "teardown_step_ok";
pub const TEARDOWN_STEP_FAILED: &str = "teardown_step_failed";

// Dispatcher events.
pub const DISPATCH_ATTEMPT: &str = "dispatch_attempt";
pub const DISPATCH_OK: &str = "dispatch_ok";
pub const DISPATCH_FAILED: &str = "dispatch_failed";
pub const DISPATCH_NOT_ACTIVE: &str = "dispatch_not_active";

// Local engine events.
pub const LOCAL_ENGINE_STARTED: &str = "local_engine_started";
pub const LOCAL_ENGINE_STOPPED: &str = "local_engine_stopped";
pub const LOCAL_ENGINE_STOP_DEFERRED: &str = "local_engine_stop_deferred";
pub const LOCAL_ROUTE_CONFIGURED: &str = "local_route_configured";
pub const LOCAL_ROUTE_STARTED: &str = "local_route_started";
pub const LOCAL_ROUTE_REMOVED: &str = "local_route_removed";
pub const LOCAL_ROUTE_EXCHANGE: &str = "local_route_exchange";
pub const LOCAL_ROUTE_NO_DESTINATION: &str = "local_route_no_destination";
pub const LOCAL_ROUTE_REDELIVERY: &str = "local_route_redelivery";
pub const LOCAL_ROUTE_EXHAUSTED: &str = "local_route_exhausted";
pub const LOCAL_ROUTE_ERROR_SINK_FAILED: &str = "local_route_error_sink_failed";
pub const LOCAL_LOG_ENDPOINT_BODY: &str = "local_log_endpoint_body";
