//! Guard registry.
//!
//! The registry maps a [`GuardId`] to its [`GuardDefinition`] and keeps
//! registration order, which decides whose confirmation is asked first when
//! several guards are enabled at once. Adapters never read it live: they take
//! a [`GuardSnapshot`] at the start of an evaluation, so a guard mounted or
//! unmounted while a confirmation is on screen cannot change that verdict.

use crate::attempt::NavigationAttempt;
use crate::confirm::Confirmation;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Predicate deciding whether a guard cares about an attempt.
pub type EnabledFn = Rc<dyn Fn(&NavigationAttempt) -> bool>;

/// Callback asking a guard to approve an attempt.
pub type ConfirmFn = Rc<dyn Fn(&NavigationAttempt) -> Confirmation>;

/// Registry shared between a provider and its adapters.
pub type SharedRegistry = Rc<RefCell<GuardRegistry>>;

/// Non-owning registry handle held by guard consumers.
pub type WeakRegistry = Weak<RefCell<GuardRegistry>>;

// ============================================================================
// GuardId
// ============================================================================

/// Identifier of one guard consumer, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuardId(u64);

impl GuardId {
    /// Build an id from a raw value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "guard#{}", self.0)
    }
}

// ============================================================================
// GuardDefinition
// ============================================================================

/// The `{enabled, confirm}` pair registered by a guard consumer.
#[derive(Clone)]
pub struct GuardDefinition {
    enabled: EnabledFn,
    confirm: ConfirmFn,
}

impl GuardDefinition {
    /// Create a definition from an enabled predicate and a confirm callback.
    pub fn new<E, C>(enabled: E, confirm: C) -> Self
    where
        E: Fn(&NavigationAttempt) -> bool + 'static,
        C: Fn(&NavigationAttempt) -> Confirmation + 'static,
    {
        Self {
            enabled: Rc::new(enabled),
            confirm: Rc::new(confirm),
        }
    }

    /// Create a definition from already shared callbacks.
    pub fn from_parts(enabled: EnabledFn, confirm: ConfirmFn) -> Self {
        Self { enabled, confirm }
    }

    /// Whether the guard wants to be consulted for `attempt`.
    pub fn is_enabled(&self, attempt: &NavigationAttempt) -> bool {
        (self.enabled)(attempt)
    }

    /// Ask the guard to approve `attempt`.
    pub fn confirm(&self, attempt: &NavigationAttempt) -> Confirmation {
        (self.confirm)(attempt)
    }
}

impl fmt::Debug for GuardDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardDefinition").finish_non_exhaustive()
    }
}

// ============================================================================
// GuardRegistry
// ============================================================================

/// Registration-ordered mapping of guard ids to definitions.
#[derive(Debug, Default)]
pub struct GuardRegistry {
    guards: IndexMap<GuardId, Rc<GuardDefinition>>,
    next_id: u64,
}

impl GuardRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry behind a shared handle.
    pub fn shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Allocate an id no consumer of this registry has used.
    pub fn allocate_id(&mut self) -> GuardId {
        self.next_id += 1;
        GuardId(self.next_id)
    }

    /// Insert or replace the definition for `id`.
    ///
    /// Replacing keeps the guard's original position. Returns `true` if a
    /// previous definition was replaced.
    pub fn register(&mut self, id: GuardId, definition: GuardDefinition) -> bool {
        self.guards.insert(id, Rc::new(definition)).is_some()
    }

    /// Remove the definition for `id`. Returns `false` if it was absent.
    pub fn unregister(&mut self, id: GuardId) -> bool {
        self.guards.shift_remove(&id).is_some()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: GuardId) -> bool {
        self.guards.contains_key(&id)
    }

    /// Number of registered guards.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether no guard is registered.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Point-in-time copy of the registered guards, in registration order.
    pub fn snapshot(&self) -> GuardSnapshot {
        GuardSnapshot {
            entries: self
                .guards
                .iter()
                .map(|(id, definition)| GuardEntry {
                    id: *id,
                    definition: Rc::clone(definition),
                })
                .collect(),
        }
    }
}

/// Remove `id` from a registry that may already be gone.
pub(crate) fn unregister_weak(registry: &WeakRegistry, id: GuardId) -> bool {
    registry
        .upgrade()
        .is_some_and(|registry| registry.borrow_mut().unregister(id))
}

/// Snapshot a registry that may already be gone; an absent registry guards
/// nothing.
pub(crate) fn snapshot_weak(registry: &WeakRegistry) -> GuardSnapshot {
    registry
        .upgrade()
        .map(|registry| registry.borrow().snapshot())
        .unwrap_or_default()
}

// ============================================================================
// GuardSnapshot
// ============================================================================

/// One guard captured in a [`GuardSnapshot`].
#[derive(Debug, Clone)]
pub struct GuardEntry {
    /// Guard identifier.
    pub id: GuardId,
    /// Definition as registered when the snapshot was taken.
    pub definition: Rc<GuardDefinition>,
}

/// Ordered, immutable view of a registry at one moment.
#[derive(Debug, Clone, Default)]
pub struct GuardSnapshot {
    entries: Vec<GuardEntry>,
}

impl GuardSnapshot {
    /// Captured guards in registration order.
    pub fn entries(&self) -> &[GuardEntry] {
        &self.entries
    }

    /// Number of captured guards.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Guards whose predicate accepts `attempt`, in registration order.
    pub fn enabled_for(&self, attempt: &NavigationAttempt) -> Vec<GuardEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.definition.is_enabled(attempt))
            .cloned()
            .collect()
    }

    /// Whether at least one guard is enabled for `attempt`.
    pub fn any_enabled(&self, attempt: &NavigationAttempt) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.definition.is_enabled(attempt))
    }
}
