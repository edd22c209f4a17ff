//! Shared runtime that drives host callbacks arriving on plain threads.

use lazy_static::lazy_static;
use std::future::Future;
use tokio::runtime::Runtime;
use tokio::task;

const BRIDGE_RUNTIME_THREADS: usize = 4;

lazy_static! {
    static ref BRIDGE_RUNTIME: Runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(BRIDGE_RUNTIME_THREADS)
        .thread_name("route-bridge")
        .enable_all()
        .build()
        .expect("Unable to create bridge runtime");
}

/// Runs `future` to completion on the bridge runtime, blocking the caller.
///
/// Callable from plain threads and from multi-thread runtime workers; panics when
/// called from a current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    task::block_in_place(|| BRIDGE_RUNTIME.block_on(future))
}
