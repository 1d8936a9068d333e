//! Unload adapter.
//!
//! Leaving the document (closing the tab, reloading, typing a new address)
//! can only be interrupted by the browser's own fixed "Leave site?" dialog.
//! No guard callback may run here: the decision is synchronous and the
//! confirmation UI would never get a chance to render. The adapter therefore
//! only asks whether any guard is *enabled* for an [`Unload`] attempt.
//!
//! [`Unload`]: crate::NavigationType::Unload

use crate::attempt::{NavigationAttempt, NavigationType};
use crate::registry::{snapshot_weak, WeakRegistry};
use crate::router::Location;
use crate::debug_log;
use std::rc::Rc;

/// Message handed to the browser when none is configured. Modern browsers
/// show their own text regardless.
pub const DEFAULT_UNLOAD_MESSAGE: &str = "Changes you made may not be saved.";

/// A `beforeunload` event.
pub trait BeforeUnload {
    /// Cancel the unload.
    fn prevent_default(&self);

    /// Set the legacy return value some browsers still require.
    fn set_return_value(&self, message: &str);
}

/// Prompts before the document unloads while a guard is enabled.
#[derive(Clone)]
pub struct UnloadAdapter {
    registry: WeakRegistry,
    location: Option<Rc<dyn Location>>,
    message: String,
}

impl UnloadAdapter {
    /// Create an adapter; `location` supplies the attempt's destination.
    pub fn new(registry: WeakRegistry, location: Option<Rc<dyn Location>>) -> Self {
        Self {
            registry,
            location,
            message: DEFAULT_UNLOAD_MESSAGE.to_string(),
        }
    }

    /// Use `message` as the event's return value.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// The attempt an unload represents right now.
    pub fn attempt(&self) -> NavigationAttempt {
        let destination = self
            .location
            .as_ref()
            .map(|location| location.href())
            .unwrap_or_default();
        NavigationAttempt::new(destination, NavigationType::Unload)
    }

    /// Whether the browser's leave dialog should be requested.
    pub fn should_prompt(&self) -> bool {
        snapshot_weak(&self.registry).any_enabled(&self.attempt())
    }

    /// Handle `beforeunload`. Returns whether the unload was cancelled.
    pub fn on_before_unload<E: BeforeUnload + ?Sized>(&self, event: &E) -> bool {
        if !self.should_prompt() {
            return false;
        }
        debug_log!("Guard enabled for unload, requesting leave dialog");
        event.prevent_default();
        event.set_return_value(&self.message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{GuardDefinition, GuardRegistry};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeUnload {
        prevented: Cell<bool>,
        message: RefCell<Option<String>>,
    }

    impl BeforeUnload for FakeUnload {
        fn prevent_default(&self) {
            self.prevented.set(true);
        }

        fn set_return_value(&self, message: &str) {
            *self.message.borrow_mut() = Some(message.to_string());
        }
    }

    struct Here;

    impl Location for Here {
        fn href(&self) -> String {
            "/draft/7".to_string()
        }

        fn assign(&self, _url: &str) {}

        fn replace(&self, _url: &str) {}
    }

    #[test]
    fn test_no_guard_no_prompt() {
        let registry = GuardRegistry::shared();
        let adapter = UnloadAdapter::new(Rc::downgrade(&registry), None);
        let event = FakeUnload::default();

        assert!(!adapter.on_before_unload(&event));
        assert!(!event.prevented.get());
    }

    #[test]
    fn test_enabled_guard_prompts_without_confirming() {
        let registry = GuardRegistry::shared();
        let confirmed = Rc::new(Cell::new(false));
        let seen = Rc::new(RefCell::new(None));
        let (flag, record) = (confirmed.clone(), seen.clone());
        let id = registry.borrow_mut().allocate_id();
        registry.borrow_mut().register(
            id,
            GuardDefinition::new(
                move |attempt| {
                    *record.borrow_mut() = Some(attempt.clone());
                    true
                },
                move |_| {
                    flag.set(true);
                    true.into()
                },
            ),
        );

        let adapter = UnloadAdapter::new(Rc::downgrade(&registry), Some(Rc::new(Here)))
            .with_message("Discard draft?");
        let event = FakeUnload::default();

        assert!(adapter.on_before_unload(&event));
        assert!(event.prevented.get());
        assert_eq!(event.message.borrow().as_deref(), Some("Discard draft?"));
        assert!(!confirmed.get());
        assert_eq!(
            *seen.borrow(),
            Some(NavigationAttempt::new("/draft/7", NavigationType::Unload))
        );
    }

    #[test]
    fn test_guard_disabled_for_unload() {
        let registry = GuardRegistry::shared();
        let id = registry.borrow_mut().allocate_id();
        registry.borrow_mut().register(
            id,
            GuardDefinition::new(|a| a.kind != NavigationType::Unload, |_| false.into()),
        );

        let adapter = UnloadAdapter::new(Rc::downgrade(&registry), None);
        assert!(!adapter.should_prompt());
    }
}
