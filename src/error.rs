//! Error types for guard registration and confirmation.
//!
//! Errors never escape an evaluation: the protocol turns every
//! [`GuardError`] raised by a guard into a denial (fail-closed) and logs it.
//! They surface to application code only where the caller can act on them,
//! such as registering a guard after its provider has been torn down.
//!
//! # Examples
//!
//! ```
//! use navigation_guard::GuardError;
//!
//! let err = GuardError::callback("form state unavailable");
//! assert_eq!(err.to_string(), "guard callback failed: form state unavailable");
//! assert!(!err.is_misuse());
//! assert!(GuardError::NoProvider.is_misuse());
//! ```

use thiserror::Error;

/// Failures raised while registering or consulting a navigation guard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// A guard was registered through a scope whose provider no longer exists.
    #[error("navigation guard used outside of an active NavigationGuardProvider")]
    NoProvider,

    /// The guard was asked to confirm while an earlier confirmation is unresolved.
    #[error("guard already has a pending confirmation")]
    ConfirmationPending,

    /// The pending confirmation was dropped without being accepted or rejected.
    #[error("pending confirmation was dropped before it was resolved")]
    ConfirmationDropped,

    /// A user-supplied confirm callback failed.
    #[error("guard callback failed: {message}")]
    Callback {
        /// Human-readable failure description.
        message: String,
    },

    /// A collaborator needed by an adapter is missing in this host.
    #[error("{what} is unavailable in this environment")]
    Unavailable {
        /// Name of the missing collaborator.
        what: &'static str,
    },
}

impl GuardError {
    /// Build a [`GuardError::Callback`] from any displayable message.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }

    /// Whether the error reports misuse of the registration API rather than
    /// a guard declining or failing during evaluation.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::NoProvider)
    }
}

/// Convenience alias for results carrying a [`GuardError`].
pub type GuardResult<T> = Result<T, GuardError>;
