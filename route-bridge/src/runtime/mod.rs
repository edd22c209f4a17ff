//! Runtime integration layer.
//!
//! Keeps the blocking boundary between synchronous host callbacks and the async
//! lifecycle in one place, together with the detached tasks lifecycle transitions run on.

pub(crate) mod bridge_runtime;
pub(crate) mod transition_task;
