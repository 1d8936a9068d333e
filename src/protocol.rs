//! Guard evaluation protocol.
//!
//! Every adapter turns its navigation event into a [`NavigationAttempt`] and
//! asks this module for a [`Verdict`]:
//!
//! 1. Take a [`GuardSnapshot`] of the registry.
//! 2. Keep the guards whose `enabled` predicate accepts the attempt.
//! 3. None left: allow.
//! 4. Otherwise confirm with each guard in registration order, one at a time.
//!    The first `false` or failure denies and stops; a later guard never sees
//!    the attempt.
//!
//! Steps 1–3 are synchronous. [`Evaluation::new`] performs them eagerly so an
//! adapter can decide whether to suppress a browser default *before* any
//! confirmation is awaited.

use crate::attempt::{DenyReason, NavigationAttempt, Verdict};
use crate::registry::{GuardEntry, GuardSnapshot};
use crate::{debug_log, trace_log, warn_log};
use std::future::Future;

/// A prepared evaluation of one attempt against one snapshot.
#[derive(Debug)]
pub struct Evaluation {
    attempt: NavigationAttempt,
    enabled: Vec<GuardEntry>,
}

impl Evaluation {
    /// Filter `snapshot` down to the guards enabled for `attempt`.
    pub fn new(snapshot: &GuardSnapshot, attempt: NavigationAttempt) -> Self {
        let enabled = snapshot.enabled_for(&attempt);
        debug_log!(
            "Navigation attempt: {} to '{}' ({} of {} guards enabled)",
            attempt.kind,
            attempt.destination,
            enabled.len(),
            snapshot.len()
        );
        Self { attempt, enabled }
    }

    /// The attempt being evaluated.
    pub fn attempt(&self) -> &NavigationAttempt {
        &self.attempt
    }

    /// Whether any guard has to be asked.
    pub fn is_guarded(&self) -> bool {
        !self.enabled.is_empty()
    }

    /// Number of guards that will be asked, at most.
    pub fn enabled_count(&self) -> usize {
        self.enabled.len()
    }

    /// Ask the enabled guards in order and produce the verdict.
    pub async fn run(self) -> Verdict {
        let Self { attempt, enabled } = self;

        for GuardEntry { id, definition } in enabled {
            trace_log!(
                "Calling {} for {} to '{}'",
                id,
                attempt.kind,
                attempt.destination
            );
            match definition.confirm(&attempt).resolve().await {
                Ok(true) => {
                    trace_log!("{} approved", id);
                }
                Ok(false) => {
                    debug_log!("Navigation to '{}' blocked by {}", attempt.destination, id);
                    return Verdict::Deny(DenyReason::Rejected { guard: id });
                }
                Err(error) => {
                    warn_log!(
                        "{} failed while confirming '{}': {}",
                        id,
                        attempt.destination,
                        error
                    );
                    return Verdict::Deny(DenyReason::Failed { guard: id, error });
                }
            }
        }

        debug_log!("All guards passed for '{}'", attempt.destination);
        Verdict::Allow
    }
}

/// Evaluate `attempt` against `snapshot`.
///
/// Guards are filtered immediately; the returned future does not borrow the
/// snapshot.
pub fn evaluate(
    snapshot: &GuardSnapshot,
    attempt: NavigationAttempt,
) -> impl Future<Output = Verdict> + 'static {
    Evaluation::new(snapshot, attempt).run()
}
