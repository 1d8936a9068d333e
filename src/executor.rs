//! Spawning guard evaluations on the host's event loop.
//!
//! Adapters must not block the code that triggered a navigation, yet most
//! evaluations finish without waiting (no guard enabled, or only inline
//! confirmations). [`run_or_spawn`] polls an evaluation once in place and only
//! hands it to the [`Executor`] when a confirmation is still pending.

use futures::executor::LocalSpawner;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::LocalSpawnExt;
use std::future::Future;

use crate::error_log;

/// Single-threaded spawner for `'static` futures.
pub trait Executor {
    /// Run `future` to completion in the background.
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);
}

impl Executor for LocalSpawner {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        if let Err(err) = LocalSpawnExt::spawn_local(self, future) {
            error_log!("Failed to spawn guard evaluation: {}", err);
        }
    }
}

/// Create an executor from a closure, e.g. one forwarding to a runtime's
/// `spawn_local`.
///
/// ```
/// use navigation_guard::executor_fn;
///
/// let executor = executor_fn(|future| {
///     drop(future);
/// });
/// # let _ = executor;
/// ```
pub const fn executor_fn<F>(f: F) -> FnExecutor<F>
where
    F: Fn(LocalBoxFuture<'static, ()>),
{
    FnExecutor { f }
}

/// Executor created from a closure via [`executor_fn`].
pub struct FnExecutor<F> {
    f: F,
}

impl<F> Executor for FnExecutor<F>
where
    F: Fn(LocalBoxFuture<'static, ()>),
{
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        (self.f)(future);
    }
}

/// Poll `future` once; spawn the remainder on `executor` if it is not ready.
///
/// Returns `true` if the future completed in place.
pub fn run_or_spawn<F>(executor: &dyn Executor, future: F) -> bool
where
    F: Future<Output = ()> + 'static,
{
    let mut future = future.boxed_local();
    if (&mut future).now_or_never().is_some() {
        return true;
    }
    executor.spawn_local(future);
    false
}
