//! Guard registration for consumers.
//!
//! A component that wants to guard navigation obtains a [`GuardScope`] from
//! its provider and registers through it. The returned [`NavigationGuard`]
//! owns the registration: it exposes the pending-confirmation state for the
//! UI and unregisters when dropped.
//!
//! # Example
//!
//! ```
//! use navigation_guard::{GuardOptions, NavigationGuardProvider, Router, NavigateOptions};
//! use navigation_guard::{MemoryHistory, MemoryRouter};
//! use futures::executor::LocalPool;
//! use std::rc::Rc;
//!
//! let history = MemoryHistory::new("/form");
//! let router = Rc::new(MemoryRouter::new(history.clone()));
//! let mut pool = LocalPool::new();
//! let provider = NavigationGuardProvider::builder(Rc::new(pool.spawner()))
//!     .router(router.clone())
//!     .build();
//!
//! // No `confirm`: the guard waits for the UI.
//! let guard = provider.scope().use_navigation_guard(GuardOptions::new())?;
//!
//! provider.router()?.push("/elsewhere", NavigateOptions::default());
//! pool.run_until_stalled();
//! assert!(guard.active());
//!
//! guard.accept();
//! pool.run_until_stalled();
//! assert!(!guard.active());
//! assert_eq!(history.current_url(), "/elsewhere");
//! # Ok::<(), navigation_guard::GuardError>(())
//! ```

use crate::attempt::NavigationAttempt;
use crate::confirm::{Confirmation, ConfirmResolver, ConfirmationSlot};
use crate::error::{GuardError, GuardResult};
use crate::registry::{unregister_weak, ConfirmFn, EnabledFn, GuardDefinition, GuardId, WeakRegistry};
use crate::{debug_log, trace_log};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

// ============================================================================
// GuardOptions
// ============================================================================

/// When a guard wants to be consulted.
#[derive(Clone)]
pub enum Enabled {
    /// Fixed answer for every attempt.
    Always(bool),
    /// Decided per attempt.
    When(EnabledFn),
}

impl Enabled {
    fn into_predicate(self) -> EnabledFn {
        match self {
            Self::Always(enabled) => {
                let predicate: EnabledFn = Rc::new(move |_: &NavigationAttempt| enabled);
                predicate
            }
            Self::When(predicate) => predicate,
        }
    }
}

impl Default for Enabled {
    fn default() -> Self {
        Self::Always(true)
    }
}

impl From<bool> for Enabled {
    fn from(enabled: bool) -> Self {
        Self::Always(enabled)
    }
}

impl fmt::Debug for Enabled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always(enabled) => f.debug_tuple("Always").field(enabled).finish(),
            Self::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Options of one guard registration.
#[derive(Clone, Default)]
pub struct GuardOptions {
    enabled: Enabled,
    confirm: Option<ConfirmFn>,
}

impl GuardOptions {
    /// Enabled for everything, confirmed through the UI.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the guard on or off for every attempt.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Enabled::Always(enabled);
        self
    }

    /// Decide per attempt whether the guard is consulted.
    #[must_use]
    pub fn enabled_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&NavigationAttempt) -> bool + 'static,
    {
        self.enabled = Enabled::When(Rc::new(predicate));
        self
    }

    /// Confirm with a callback instead of the UI.
    #[must_use]
    pub fn confirm<F>(mut self, confirm: F) -> Self
    where
        F: Fn(&NavigationAttempt) -> Confirmation + 'static,
    {
        self.confirm = Some(Rc::new(confirm));
        self
    }

    /// Confirm with an async callback.
    ///
    /// ```
    /// use navigation_guard::GuardOptions;
    ///
    /// let options = GuardOptions::new().confirm_async(|attempt| {
    ///     let leaving_editor = !attempt.destination.starts_with("/editor");
    ///     async move { Ok(!leaving_editor) }
    /// });
    /// assert!(options.has_confirm());
    /// ```
    #[must_use]
    pub fn confirm_async<F, Fut>(self, confirm: F) -> Self
    where
        F: Fn(&NavigationAttempt) -> Fut + 'static,
        Fut: Future<Output = GuardResult<bool>> + 'static,
    {
        self.confirm(move |attempt| Confirmation::deferred(confirm(attempt)))
    }

    /// Whether a confirm callback replaces the UI-driven confirmation.
    pub fn has_confirm(&self) -> bool {
        self.confirm.is_some()
    }

    fn into_definition(self, slot: &ConfirmationSlot) -> GuardDefinition {
        let confirm = self.confirm.unwrap_or_else(|| {
            let slot = slot.clone();
            let confirm: ConfirmFn = Rc::new(move |_: &NavigationAttempt| slot.confirmation());
            confirm
        });
        GuardDefinition::from_parts(self.enabled.into_predicate(), confirm)
    }
}

impl fmt::Debug for GuardOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardOptions")
            .field("enabled", &self.enabled)
            .field("confirm", &self.confirm.is_some())
            .finish()
    }
}

// ============================================================================
// GuardScope
// ============================================================================

/// Registration handle handed to guard consumers.
///
/// Holds the registry weakly: a scope that outlives its provider refuses new
/// registrations with [`GuardError::NoProvider`].
#[derive(Clone, Debug)]
pub struct GuardScope {
    registry: WeakRegistry,
}

impl GuardScope {
    /// Create a scope over `registry`.
    pub fn new(registry: WeakRegistry) -> Self {
        Self { registry }
    }

    /// Whether the provider is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.registry.strong_count() > 0
    }

    /// Register a guard. It stays registered until the handle is dropped.
    pub fn use_navigation_guard(&self, options: GuardOptions) -> GuardResult<NavigationGuard> {
        let registry = self.registry.upgrade().ok_or(GuardError::NoProvider)?;
        let slot = ConfirmationSlot::new();
        let id = {
            let mut registry = registry.borrow_mut();
            let id = registry.allocate_id();
            registry.register(id, options.into_definition(&slot));
            id
        };
        debug_log!("Registered {}", id);

        Ok(NavigationGuard {
            id,
            registry: self.registry.clone(),
            slot,
        })
    }
}

// ============================================================================
// NavigationGuard
// ============================================================================

/// A live guard registration.
pub struct NavigationGuard {
    id: GuardId,
    registry: WeakRegistry,
    slot: ConfirmationSlot,
}

impl NavigationGuard {
    /// Registry id of this guard.
    pub fn id(&self) -> GuardId {
        self.id
    }

    /// Whether a confirmation is waiting for the user.
    pub fn active(&self) -> bool {
        self.slot.is_awaiting()
    }

    /// Allow the pending navigation. No-op if nothing is pending.
    pub fn accept(&self) {
        self.slot.accept();
    }

    /// Refuse the pending navigation. No-op if nothing is pending.
    pub fn reject(&self) {
        self.slot.reject();
    }

    /// Clonable handle for the confirmation UI.
    pub fn resolver(&self) -> ConfirmResolver {
        self.slot.resolver()
    }

    /// Call `listener` whenever [`active`](Self::active) changes.
    pub fn subscribe(&self, listener: impl Fn(bool) + 'static) {
        self.slot.subscribe(listener);
    }

    /// Replace the guard's options, keeping its place in evaluation order.
    ///
    /// A confirmation already pending is unaffected.
    pub fn set_options(&self, options: GuardOptions) -> GuardResult<()> {
        let registry = self.registry.upgrade().ok_or(GuardError::NoProvider)?;
        registry
            .borrow_mut()
            .register(self.id, options.into_definition(&self.slot));
        trace_log!("Updated options of {}", self.id);
        Ok(())
    }
}

impl Drop for NavigationGuard {
    fn drop(&mut self) {
        unregister_weak(&self.registry, self.id);
        if self.slot.abandon() {
            debug_log!("{} dropped with a pending confirmation", self.id);
        }
        trace_log!("Unregistered {}", self.id);
    }
}

impl fmt::Debug for NavigationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationGuard")
            .field("id", &self.id)
            .field("active", &self.active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::NavigationType;
    use crate::protocol::evaluate;
    use crate::registry::{GuardRegistry, SharedRegistry};
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;
    use std::cell::{Cell, RefCell};

    fn scope() -> (SharedRegistry, GuardScope) {
        let registry = GuardRegistry::shared();
        let scope = GuardScope::new(Rc::downgrade(&registry));
        (registry, scope)
    }

    fn verdict_of(registry: &SharedRegistry, attempt: NavigationAttempt) -> crate::Verdict {
        let snapshot = registry.borrow().snapshot();
        pollster::block_on(evaluate(&snapshot, attempt))
    }

    #[test]
    fn test_no_provider() {
        let (registry, scope) = scope();
        drop(registry);
        assert!(!scope.is_mounted());
        assert!(matches!(
            scope.use_navigation_guard(GuardOptions::new()),
            Err(GuardError::NoProvider)
        ));
    }

    #[test]
    fn test_drop_unregisters() {
        let (registry, scope) = scope();
        let guard = scope
            .use_navigation_guard(GuardOptions::new().confirm(|_| false.into()))
            .unwrap();
        assert!(registry.borrow().contains(guard.id()));

        drop(guard);
        assert!(registry.borrow().is_empty());
    }

    #[test]
    fn test_drop_after_provider_is_gone() {
        let (registry, scope) = scope();
        let guard = scope.use_navigation_guard(GuardOptions::new()).unwrap();
        drop(registry);
        drop(guard);
    }

    #[test]
    fn test_enabled_false_skips_confirm() {
        let (registry, scope) = scope();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let _guard = scope
            .use_navigation_guard(GuardOptions::new().enabled(false).confirm(move |_| {
                counter.set(counter.get() + 1);
                false.into()
            }))
            .unwrap();

        assert!(verdict_of(&registry, NavigationAttempt::push("/x")).is_allow());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_enabled_when_sees_attempt() {
        let (registry, scope) = scope();
        let _guard = scope
            .use_navigation_guard(
                GuardOptions::new()
                    .enabled_when(|a| a.kind == NavigationType::Replace)
                    .confirm(|_| false.into()),
            )
            .unwrap();

        assert!(verdict_of(&registry, NavigationAttempt::push("/x")).is_allow());
        assert!(verdict_of(&registry, NavigationAttempt::replace("/x")).is_deny());
    }

    #[test]
    fn test_ui_confirmation_lifecycle() {
        let (registry, scope) = scope();
        let guard = scope.use_navigation_guard(GuardOptions::new()).unwrap();
        let transitions = Rc::new(RefCell::new(Vec::new()));
        let seen = transitions.clone();
        guard.subscribe(move |active| seen.borrow_mut().push(active));

        let mut pool = LocalPool::new();
        let verdict = Rc::new(RefCell::new(None));
        let out = verdict.clone();
        let snapshot = registry.borrow().snapshot();
        pool.spawner()
            .spawn_local(async move {
                *out.borrow_mut() = Some(evaluate(&snapshot, NavigationAttempt::push("/x")).await);
            })
            .unwrap();

        pool.run_until_stalled();
        assert!(guard.active());
        assert!(guard.resolver().is_active());

        guard.reject();
        guard.reject();
        pool.run_until_stalled();
        assert!(!guard.active());
        assert!(verdict.borrow().as_ref().is_some_and(crate::Verdict::is_deny));
        assert_eq!(*transitions.borrow(), vec![true, false]);
    }

    #[test]
    fn test_dropping_guard_denies_pending() {
        let (registry, scope) = scope();
        let guard = scope.use_navigation_guard(GuardOptions::new()).unwrap();

        let mut pool = LocalPool::new();
        let verdict = Rc::new(RefCell::new(None));
        let out = verdict.clone();
        let snapshot = registry.borrow().snapshot();
        pool.spawner()
            .spawn_local(async move {
                *out.borrow_mut() = Some(evaluate(&snapshot, NavigationAttempt::push("/x")).await);
            })
            .unwrap();
        pool.run_until_stalled();

        drop(guard);
        pool.run_until_stalled();
        assert!(verdict.borrow().as_ref().is_some_and(crate::Verdict::is_deny));
    }

    #[test]
    fn test_set_options_keeps_order() {
        let (registry, scope) = scope();
        let first = scope
            .use_navigation_guard(GuardOptions::new().confirm(|_| true.into()))
            .unwrap();
        let second = scope
            .use_navigation_guard(GuardOptions::new().confirm(|_| true.into()))
            .unwrap();

        first
            .set_options(GuardOptions::new().confirm(|_| false.into()))
            .unwrap();
        let snapshot = registry.borrow().snapshot();
        let order: Vec<_> = snapshot.entries().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![first.id(), second.id()]);
        assert!(verdict_of(&registry, NavigationAttempt::push("/x")).is_deny());
    }

    #[test]
    fn test_async_confirm() {
        let (registry, scope) = scope();
        let _guard = scope
            .use_navigation_guard(
                GuardOptions::new().confirm_async(|a| {
                    let ok = a.destination != "/forbidden";
                    async move { Ok(ok) }
                }),
            )
            .unwrap();

        assert!(verdict_of(&registry, NavigationAttempt::push("/fine")).is_allow());
        assert!(verdict_of(&registry, NavigationAttempt::push("/forbidden")).is_deny());
    }
}
