//! Navigation attempts and verdicts.
//!
//! This module defines the two values that flow through every adapter:
//!
//! - [`NavigationAttempt`]: a candidate navigation (`destination` plus a
//!   [`NavigationType`] tag), created per event and discarded after the verdict.
//! - [`Verdict`]: the allow/deny outcome of evaluating every enabled guard for
//!   one attempt.

use crate::error::GuardError;
use crate::registry::GuardId;
use std::fmt;

// ============================================================================
// NavigationType
// ============================================================================

/// Where a navigation attempt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationType {
    /// Router `push`, or a plain link click.
    Push,
    /// Router `replace`, or a link marked as replacing.
    Replace,
    /// Router `refresh` of the current location.
    Refresh,
    /// Browser back button / `history.back()`.
    TraverseBack,
    /// Browser forward button / `history.forward()`.
    TraverseForward,
    /// Tab close, reload, or leaving the application entirely.
    Unload,
}

impl NavigationType {
    /// Stable lowercase name, handy for logging and matching in predicates.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Replace => "replace",
            Self::Refresh => "refresh",
            Self::TraverseBack => "traverse-back",
            Self::TraverseForward => "traverse-forward",
            Self::Unload => "unload",
        }
    }

    /// Whether this is a back/forward history traversal.
    pub fn is_traversal(self) -> bool {
        matches!(self, Self::TraverseBack | Self::TraverseForward)
    }

    /// Traversal type for a history delta (`< 0` is back).
    pub fn traversal(delta: isize) -> Self {
        if delta < 0 {
            Self::TraverseBack
        } else {
            Self::TraverseForward
        }
    }
}

impl fmt::Display for NavigationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NavigationAttempt
// ============================================================================

/// A candidate navigation handed to guard predicates and confirm callbacks.
///
/// # Example
///
/// ```
/// use navigation_guard::{NavigationAttempt, NavigationType};
///
/// let attempt = NavigationAttempt::push("/settings");
/// assert_eq!(attempt.destination, "/settings");
/// assert_eq!(attempt.kind, NavigationType::Push);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationAttempt {
    /// URL or path being navigated to.
    pub destination: String,

    /// Which source produced the attempt.
    pub kind: NavigationType,
}

impl NavigationAttempt {
    /// Create an attempt of the given kind.
    pub fn new(destination: impl Into<String>, kind: NavigationType) -> Self {
        Self {
            destination: destination.into(),
            kind,
        }
    }

    /// Shorthand for a [`NavigationType::Push`] attempt.
    pub fn push(destination: impl Into<String>) -> Self {
        Self::new(destination, NavigationType::Push)
    }

    /// Shorthand for a [`NavigationType::Replace`] attempt.
    pub fn replace(destination: impl Into<String>) -> Self {
        Self::new(destination, NavigationType::Replace)
    }
}

// ============================================================================
// Verdict
// ============================================================================

/// Why an attempt was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The guard's confirmation answered `false`.
    Rejected {
        /// Guard that declined.
        guard: GuardId,
    },
    /// The guard's confirmation failed; denial is fail-closed.
    Failed {
        /// Guard that failed.
        guard: GuardId,
        /// Failure raised by the guard.
        error: GuardError,
    },
}

impl DenyReason {
    /// Guard that produced the denial.
    pub fn guard(&self) -> GuardId {
        match self {
            Self::Rejected { guard } | Self::Failed { guard, .. } => *guard,
        }
    }
}

/// Outcome of evaluating all enabled guards for one attempt.
///
/// # Example
///
/// ```
/// use navigation_guard::Verdict;
///
/// assert!(Verdict::Allow.is_allow());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every enabled guard approved, or none was enabled.
    Allow,
    /// A guard declined or failed; evaluation stopped there.
    Deny(DenyReason),
}

impl Verdict {
    /// Check if the navigation may proceed.
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Check if the navigation was blocked.
    pub fn is_deny(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// The denial reason, if any.
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Deny(reason) => Some(reason),
            Self::Allow => None,
        }
    }
}
