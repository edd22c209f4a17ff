//! Detached tasks for lifecycle transitions that must finish once started.

use crate::observability::events;
use std::future::Future;
use tracing::warn;

const COMPONENT: &str = "transition_task";

/// Spawns `transition` on the current runtime and waits for it.
///
/// Dropping the returned future does not cancel the transition. Panics inside the task
/// resume on the caller; `None` means the runtime shut down before the task finished.
pub(crate) async fn run_to_completion<F>(name: &'static str, transition: F) -> Option<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match tokio::spawn(transition).await {
        Ok(output) => Some(output),
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => {
            warn!(
                event = events::TRANSITION_TASK_CANCELLED,
                component = COMPONENT,
                transition = name,
                err = %err,
                "lifecycle transition task was cancelled"
            );
            None
        }
    }
}
