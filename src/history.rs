//! History-traversal adapter.
//!
//! Back/forward cannot be cancelled: by the time `popstate` fires the
//! location has already changed. The adapter therefore *simulates* the
//! cancel:
//!
//! 1. A traversal arrives while at least one guard is enabled for it.
//! 2. The adapter immediately traverses the opposite way (`go(-delta)`), so
//!    the location looks as if nothing happened, and hides the event from the
//!    framework.
//! 3. The guards are evaluated for the entry that was being navigated to.
//! 4. On allow the adapter re-issues `go(delta)` and lets that event reach the
//!    framework, which renders the destination as native traversal would have.
//!    On deny nothing else happens.
//!
//! Events produced by the adapter's own traversals are recognised by the
//! entry they land on and never guarded again. Reverts aim at the entry the
//! user was on, measured from wherever the backend is when the revert is
//! issued, so several traversals in quick succession still end up where the
//! guards left them. With no enabled guard the adapter is a passthrough, and an
//! entry whose position is unknown (created before the adapter attached) is
//! never reverted, so an unused provider cannot corrupt history.

use crate::attempt::{NavigationAttempt, NavigationType, Verdict};
use crate::executor::{run_or_spawn, Executor};
use crate::protocol::Evaluation;
use crate::registry::{snapshot_weak, WeakRegistry};
use crate::{debug_log, trace_log};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

// ============================================================================
// Collaborator types
// ============================================================================

/// A `popstate` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopStateEvent {
    /// URL of the entry that is now current.
    pub url: String,
    /// Position of that entry in the session history, if it was stamped.
    pub index: Option<usize>,
}

impl PopStateEvent {
    /// Create an event for the entry at `index`.
    pub fn new(url: impl Into<String>, index: Option<usize>) -> Self {
        Self {
            url: url.into(),
            index,
        }
    }
}

/// Whether a `popstate` event may reach the framework's own listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopStateDisposition {
    /// Let the framework react to the new entry.
    Propagate,
    /// Hide the event; the adapter is handling it.
    Suppress,
}

/// Session history as seen by the adapter.
pub trait HistoryBackend {
    /// Traverse `delta` entries (negative is back). Returns whether a
    /// traversal was started, i.e. whether a `popstate` will follow.
    fn go(&self, delta: isize) -> bool;

    /// Position of the current entry, if known.
    fn current_index(&self) -> Option<usize>;

    /// Start delivering this history's events to `adapter`.
    ///
    /// Called once by the provider after it creates the adapter. Backends
    /// whose events arrive from elsewhere (the DOM listeners of
    /// `web::attach`) keep the default, which does nothing.
    fn connect(&self, _adapter: &HistoryAdapter) {}
}

// ============================================================================
// HistoryAdapter
// ============================================================================

#[derive(Debug, Default)]
struct TraversalState {
    /// The entry the user is on as far as the guards are concerned.
    current_index: Option<usize>,
    /// Landing entry and disposition of each `go` we issued, in issue order.
    own_traversals: VecDeque<(usize, PopStateDisposition)>,
    evaluating: bool,
}

impl TraversalState {
    /// Claim `index` as the landing of one of our own traversals. Older
    /// entries still queued in front of it will never land and are dropped.
    fn take_own(&mut self, index: Option<usize>) -> Option<PopStateDisposition> {
        let index = index?;
        let position = self
            .own_traversals
            .iter()
            .position(|(landing, _)| *landing == index)?;
        let (_, disposition) = self.own_traversals.drain(..=position).last()?;
        Some(disposition)
    }
}

struct HistoryInner {
    registry: WeakRegistry,
    backend: Rc<dyn HistoryBackend>,
    executor: Rc<dyn Executor>,
    state: RefCell<TraversalState>,
}

/// Guards back/forward traversals of one session history.
#[derive(Clone)]
pub struct HistoryAdapter {
    inner: Rc<HistoryInner>,
}

impl HistoryAdapter {
    /// Attach to `backend`, recording the current entry's position.
    pub fn new(
        registry: WeakRegistry,
        backend: Rc<dyn HistoryBackend>,
        executor: Rc<dyn Executor>,
    ) -> Self {
        let current_index = backend.current_index();
        debug_log!("History adapter attached at index {:?}", current_index);
        Self {
            inner: Rc::new(HistoryInner {
                registry,
                backend,
                executor,
                state: RefCell::new(TraversalState {
                    current_index,
                    ..TraversalState::default()
                }),
            }),
        }
    }

    /// Non-owning handle, for listeners stored inside the backend itself.
    pub fn downgrade(&self) -> WeakHistoryAdapter {
        WeakHistoryAdapter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Position the adapter believes is current.
    pub fn current_index(&self) -> Option<usize> {
        self.inner.state.borrow().current_index
    }

    /// Whether a traversal is waiting for its verdict.
    pub fn is_evaluating(&self) -> bool {
        self.inner.state.borrow().evaluating
    }

    /// Record a new current entry created by `pushState`/`replaceState`.
    pub fn entry_changed(&self, index: Option<usize>) {
        self.inner.state.borrow_mut().current_index = index;
    }

    /// Handle a `popstate` event before any framework listener sees it.
    pub fn on_pop_state(&self, event: &PopStateEvent) -> PopStateDisposition {
        let (from, to) = {
            let mut state = self.inner.state.borrow_mut();
            if let Some(disposition) = state.take_own(event.index) {
                trace_log!("Own traversal landed on '{}' ({:?})", event.url, disposition);
                state.current_index = event.index;
                return disposition;
            }

            match (state.current_index, event.index) {
                (Some(from), Some(to)) if from != to => (from, to),
                (Some(_), Some(_)) => return PopStateDisposition::Propagate,
                _ => {
                    state.current_index = event.index;
                    debug_log!("Traversal to '{}' has no known position, not guarding", event.url);
                    return PopStateDisposition::Propagate;
                }
            }
        };

        let delta = offset(from, to);
        let attempt = NavigationAttempt::new(event.url.clone(), NavigationType::traversal(delta));
        let evaluation = Evaluation::new(&snapshot_weak(&self.inner.registry), attempt);
        if !evaluation.is_guarded() {
            self.inner.state.borrow_mut().current_index = Some(to);
            return PopStateDisposition::Propagate;
        }

        debug_log!("Reverting traversal by {} to '{}'", delta, event.url);
        self.traverse_to(from, to, PopStateDisposition::Suppress);

        if std::mem::replace(&mut self.inner.state.borrow_mut().evaluating, true) {
            debug_log!("Traversal evaluation already pending, ignoring '{}'", event.url);
            return PopStateDisposition::Suppress;
        }

        let adapter = self.clone();
        run_or_spawn(self.inner.executor.as_ref(), async move {
            let verdict = evaluation.run().await;
            adapter.finish(from, to, &verdict);
        });
        PopStateDisposition::Suppress
    }

    fn finish(&self, from: usize, to: usize, verdict: &Verdict) {
        self.inner.state.borrow_mut().evaluating = false;
        if verdict.is_allow() {
            debug_log!("Re-applying traversal to index {}", to);
            self.traverse_to(to, from, PopStateDisposition::Propagate);
        }
    }

    /// Issue a `go` landing on `target`, measured from the backend's current
    /// entry (`assumed` when the backend cannot tell), and remember how the
    /// resulting event is to be handled.
    fn traverse_to(&self, target: usize, assumed: usize, disposition: PopStateDisposition) {
        let position = self.inner.backend.current_index().unwrap_or(assumed);
        let delta = offset(position, target);
        if delta == 0 {
            trace_log!("Already on index {}", target);
            return;
        }
        if self.inner.backend.go(delta) {
            self.inner
                .state
                .borrow_mut()
                .own_traversals
                .push_back((target, disposition));
        } else {
            debug_log!("Traversal by {} to index {} was not started", delta, target);
        }
    }
}

impl fmt::Debug for HistoryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryAdapter")
            .field("state", &self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Weak counterpart of [`HistoryAdapter`].
#[derive(Clone)]
pub struct WeakHistoryAdapter {
    inner: Weak<HistoryInner>,
}

impl WeakHistoryAdapter {
    /// The adapter, if it still exists.
    pub fn upgrade(&self) -> Option<HistoryAdapter> {
        self.inner.upgrade().map(|inner| HistoryAdapter { inner })
    }

    /// Forward a new current entry to the adapter, if it still exists.
    pub fn entry_changed(&self, index: Option<usize>) {
        if let Some(adapter) = self.upgrade() {
            adapter.entry_changed(index);
        }
    }

    /// Forward `event` to the adapter; a dropped adapter lets everything through.
    pub fn on_pop_state(&self, event: &PopStateEvent) -> PopStateDisposition {
        self.upgrade()
            .map_or(PopStateDisposition::Propagate, |adapter| {
                adapter.on_pop_state(event)
            })
    }
}

#[allow(clippy::cast_possible_wrap)]
fn offset(from: usize, to: usize) -> isize {
    to as isize - from as isize
}
