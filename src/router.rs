//! Programmatic-navigation adapter.
//!
//! Host frameworks expose their router as an object with `push`, `replace`
//! and `refresh`. [`GuardedRouter`] wraps any [`Router`] and implements the
//! same trait, so application code keeps calling `push` while every call is
//! gated by the evaluation protocol first.
//!
//! # Example
//!
//! ```
//! use navigation_guard::{GuardedRouter, MemoryHistory, MemoryRouter, Router, NavigateOptions};
//! use navigation_guard::{GuardDefinition, GuardRegistry};
//! use futures::executor::LocalPool;
//! use std::rc::Rc;
//!
//! let history = MemoryHistory::new("/");
//! let inner = Rc::new(MemoryRouter::new(history.clone()));
//! let registry = GuardRegistry::shared();
//! let pool = LocalPool::new();
//!
//! let router = GuardedRouter::new(inner.clone(), Rc::downgrade(&registry), Rc::new(pool.spawner()))
//!     .with_location(inner.clone());
//!
//! let id = registry.borrow_mut().allocate_id();
//! registry
//!     .borrow_mut()
//!     .register(id, GuardDefinition::new(|_| true, |_| false.into()));
//!
//! router.push("/settings", NavigateOptions::default());
//! assert_eq!(history.current_url(), "/");
//! ```

use crate::attempt::{NavigationAttempt, NavigationType, Verdict};
use crate::executor::{run_or_spawn, Executor};
use crate::protocol::Evaluation;
use crate::registry::{snapshot_weak, WeakRegistry};
use crate::debug_log;
use std::future::Future;
use std::rc::Rc;

// ============================================================================
// Collaborator traits
// ============================================================================

/// Extra arguments forwarded untouched to the wrapped router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Scroll to the top after navigating.
    pub scroll: bool,
}

impl NavigateOptions {
    /// Keep the current scroll position.
    pub const fn without_scroll() -> Self {
        Self { scroll: false }
    }
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self { scroll: true }
    }
}

/// The capability the adapter needs from a host router.
pub trait Router {
    /// Navigate to `href`, adding a history entry.
    fn push(&self, href: &str, options: NavigateOptions);

    /// Navigate to `href`, replacing the current history entry.
    fn replace(&self, href: &str, options: NavigateOptions);

    /// Re-render the current location.
    fn refresh(&self);
}

/// The document location: read the current URL, or leave it without a router.
pub trait Location {
    /// Current URL.
    fn href(&self) -> String;

    /// Navigate to `url`, adding a history entry.
    fn assign(&self, url: &str);

    /// Navigate to `url`, replacing the current history entry.
    fn replace(&self, url: &str);
}

// ============================================================================
// RouterCall
// ============================================================================

/// A router method call captured for later delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterCall {
    /// `push(href, options)`
    Push(String, NavigateOptions),
    /// `replace(href, options)`
    Replace(String, NavigateOptions),
    /// `refresh()`
    Refresh,
}

impl RouterCall {
    /// Navigation type of the call.
    pub fn kind(&self) -> NavigationType {
        match self {
            Self::Push(..) => NavigationType::Push,
            Self::Replace(..) => NavigationType::Replace,
            Self::Refresh => NavigationType::Refresh,
        }
    }

    /// Invoke the original method on `router` with the original arguments.
    pub fn apply<R: Router + ?Sized>(&self, router: &R) {
        match self {
            Self::Push(href, options) => router.push(href, *options),
            Self::Replace(href, options) => router.replace(href, *options),
            Self::Refresh => router.refresh(),
        }
    }
}

// ============================================================================
// GuardedRouter
// ============================================================================

/// A [`Router`] whose calls run the guard protocol before delegating.
///
/// Denied calls are no-ops. The adapter does not forward the wrapped router's
/// return values; use [`navigate`](Self::navigate) to await the verdict.
pub struct GuardedRouter<R: ?Sized> {
    inner: Rc<R>,
    registry: WeakRegistry,
    location: Option<Rc<dyn Location>>,
    executor: Rc<dyn Executor>,
}

impl<R: Router + ?Sized + 'static> GuardedRouter<R> {
    /// Wrap `inner`, consulting the guards of `registry`.
    ///
    /// Once the registry is dropped the router passes every call through.
    pub fn new(inner: Rc<R>, registry: WeakRegistry, executor: Rc<dyn Executor>) -> Self {
        Self {
            inner,
            registry,
            location: None,
            executor,
        }
    }

    /// Use `location` to resolve the destination of `refresh`.
    #[must_use]
    pub fn with_location(mut self, location: Rc<dyn Location>) -> Self {
        self.location = Some(location);
        self
    }

    /// The wrapped router, bypassing the guards.
    pub fn inner(&self) -> &Rc<R> {
        &self.inner
    }

    /// Evaluate `call` and delegate it on approval, resolving to the verdict.
    ///
    /// Guards are filtered when this is called, not when the future is first
    /// polled.
    pub fn navigate(&self, call: RouterCall) -> impl Future<Output = Verdict> + 'static {
        let destination = match &call {
            RouterCall::Push(href, _) | RouterCall::Replace(href, _) => href.clone(),
            RouterCall::Refresh => self.current_href(),
        };
        debug_log!("Router {} called with '{}'", call.kind(), destination);

        let attempt = NavigationAttempt::new(destination, call.kind());
        let evaluation = Evaluation::new(&snapshot_weak(&self.registry), attempt);
        let inner = Rc::clone(&self.inner);

        async move {
            let verdict = evaluation.run().await;
            if verdict.is_allow() {
                call.apply(&*inner);
            }
            verdict
        }
    }

    fn current_href(&self) -> String {
        self.location
            .as_ref()
            .map(|location| location.href())
            .unwrap_or_default()
    }

    fn dispatch(&self, call: RouterCall) {
        let navigation = self.navigate(call);
        run_or_spawn(self.executor.as_ref(), async move {
            navigation.await;
        });
    }
}

impl<R: Router + ?Sized + 'static> Router for GuardedRouter<R> {
    fn push(&self, href: &str, options: NavigateOptions) {
        self.dispatch(RouterCall::Push(href.to_string(), options));
    }

    fn replace(&self, href: &str, options: NavigateOptions) {
        self.dispatch(RouterCall::Replace(href.to_string(), options));
    }

    fn refresh(&self) {
        self.dispatch(RouterCall::Refresh);
    }
}

impl<R: ?Sized> Clone for GuardedRouter<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            registry: self.registry.clone(),
            location: self.location.clone(),
            executor: Rc::clone(&self.executor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::{Confirmation, ConfirmationSlot};
    use crate::registry::{GuardDefinition, GuardRegistry, SharedRegistry};
    use futures::executor::LocalPool;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingRouter {
        calls: RefCell<Vec<String>>,
    }

    impl Router for RecordingRouter {
        fn push(&self, href: &str, options: NavigateOptions) {
            self.calls
                .borrow_mut()
                .push(format!("push:{}:{}", href, options.scroll));
        }

        fn replace(&self, href: &str, _options: NavigateOptions) {
            self.calls.borrow_mut().push(format!("replace:{}", href));
        }

        fn refresh(&self) {
            self.calls.borrow_mut().push("refresh".to_string());
        }
    }

    struct FixedLocation(&'static str);

    impl Location for FixedLocation {
        fn href(&self) -> String {
            self.0.to_string()
        }

        fn assign(&self, _url: &str) {}

        fn replace(&self, _url: &str) {}
    }

    fn setup() -> (
        Rc<RecordingRouter>,
        SharedRegistry,
        LocalPool,
        GuardedRouter<RecordingRouter>,
    ) {
        let inner = Rc::new(RecordingRouter::default());
        let registry = GuardRegistry::shared();
        let pool = LocalPool::new();
        let router = GuardedRouter::new(
            inner.clone(),
            Rc::downgrade(&registry),
            Rc::new(pool.spawner()),
        )
        .with_location(Rc::new(FixedLocation("/current")));
        (inner, registry, pool, router)
    }

    fn add_guard(registry: &SharedRegistry, definition: GuardDefinition) {
        let id = registry.borrow_mut().allocate_id();
        registry.borrow_mut().register(id, definition);
    }

    #[test]
    fn test_unguarded_push_delegates_with_original_arguments() {
        let (inner, _registry, _pool, router) = setup();
        router.push("/a", NavigateOptions::without_scroll());
        router.replace("/b", NavigateOptions::default());
        router.refresh();
        assert_eq!(
            *inner.calls.borrow(),
            vec!["push:/a:false", "replace:/b", "refresh"]
        );
    }

    #[test]
    fn test_denied_push_is_noop() {
        let (inner, registry, _pool, router) = setup();
        add_guard(&registry, GuardDefinition::new(|_| true, |_| false.into()));

        router.push("/x", NavigateOptions::default());
        assert!(inner.calls.borrow().is_empty());
    }

    #[test]
    fn test_refresh_attempt_targets_current_location() {
        let (inner, registry, _pool, router) = setup();
        let seen = Rc::new(RefCell::new(None));
        let record = seen.clone();
        add_guard(
            &registry,
            GuardDefinition::new(|_| true, move |attempt| {
                *record.borrow_mut() = Some(attempt.clone());
                true.into()
            }),
        );

        router.refresh();
        assert_eq!(
            *seen.borrow(),
            Some(NavigationAttempt::new("/current", NavigationType::Refresh))
        );
        assert_eq!(*inner.calls.borrow(), vec!["refresh"]);
    }

    #[test]
    fn test_deferred_push_completes_on_executor() {
        let (inner, registry, mut pool, router) = setup();
        let slot = ConfirmationSlot::new();
        let pending = slot.clone();
        add_guard(
            &registry,
            GuardDefinition::new(|_| true, move |_| match pending.begin() {
                Ok(future) => Confirmation::Deferred(future),
                Err(error) => Confirmation::Failed(error),
            }),
        );

        router.push("/x", NavigateOptions::default());
        pool.run_until_stalled();
        assert!(slot.is_awaiting());
        assert!(inner.calls.borrow().is_empty());

        slot.accept();
        pool.run_until_stalled();
        assert_eq!(*inner.calls.borrow(), vec!["push:/x:true"]);
    }

    #[test]
    fn test_navigate_resolves_to_verdict() {
        let (inner, registry, _pool, router) = setup();
        add_guard(
            &registry,
            GuardDefinition::new(|a| a.kind == NavigationType::Replace, |_| false.into()),
        );

        let verdict = pollster::block_on(
            router.navigate(RouterCall::Replace("/r".into(), NavigateOptions::default())),
        );
        assert!(verdict.is_deny());
        let verdict = pollster::block_on(
            router.navigate(RouterCall::Push("/p".into(), NavigateOptions::default())),
        );
        assert!(verdict.is_allow());
        assert_eq!(*inner.calls.borrow(), vec!["push:/p:true"]);
    }

    #[test]
    fn test_dropped_registry_passes_through() {
        let (inner, registry, _pool, router) = setup();
        add_guard(&registry, GuardDefinition::new(|_| true, |_| false.into()));
        drop(registry);

        router.push("/x", NavigateOptions::default());
        assert_eq!(*inner.calls.borrow(), vec!["push:/x:true"]);
    }
}
