//! Confirmation state machine.
//!
//! A guard's confirm step either answers inline or has to wait for the user
//! (a rendered dialog, a toast with "Leave"/"Stay" buttons, ...). Both shapes
//! are expressed as a [`Confirmation`], which the evaluation protocol awaits
//! uniformly.
//!
//! For the waiting case each guard owns a [`ConfirmationSlot`]:
//!
//! ```text
//!            begin()                   accept() / reject()
//!   Idle ─────────────▶ Awaiting ─────────────────────────▶ Idle
//!                          │
//!                          └── abandon() (guard dropped) ──▶ Idle, resolves as failure
//! ```
//!
//! `begin` hands the protocol a future; the UI gets a [`ConfirmResolver`]
//! that supplies the answer. Resolving twice is a no-op.

use crate::error::{GuardError, GuardResult};
use crate::trace_log;
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::mem;
use std::rc::Rc;

/// Boxed awaitable answer of a deferred confirmation.
pub type ConfirmFuture = LocalBoxFuture<'static, GuardResult<bool>>;

// ============================================================================
// Confirmation
// ============================================================================

/// Answer returned by a guard's confirm callback.
///
/// # Example
///
/// ```
/// use navigation_guard::Confirmation;
///
/// let inline: Confirmation = true.into();
/// assert!(inline.is_ready());
///
/// let later = Confirmation::deferred(async { Ok(false) });
/// assert!(!later.is_ready());
/// ```
pub enum Confirmation {
    /// Answer known synchronously.
    Ready(bool),
    /// Answer supplied later.
    Deferred(ConfirmFuture),
    /// The callback failed before producing an answer.
    Failed(GuardError),
}

impl Confirmation {
    /// Wrap a future as a deferred confirmation.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = GuardResult<bool>> + 'static,
    {
        Self::Deferred(future.boxed_local())
    }

    /// Whether the answer is available without awaiting.
    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::Deferred(_))
    }

    /// Await the answer, whatever its shape.
    pub async fn resolve(self) -> GuardResult<bool> {
        match self {
            Self::Ready(answer) => Ok(answer),
            Self::Deferred(future) => future.await,
            Self::Failed(error) => Err(error),
        }
    }
}

impl From<bool> for Confirmation {
    fn from(answer: bool) -> Self {
        Self::Ready(answer)
    }
}

impl From<GuardResult<bool>> for Confirmation {
    fn from(result: GuardResult<bool>) -> Self {
        match result {
            Ok(answer) => Self::Ready(answer),
            Err(error) => Self::Failed(error),
        }
    }
}

impl fmt::Debug for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(answer) => f.debug_tuple("Ready").field(answer).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
        }
    }
}

// ============================================================================
// ConfirmationSlot
// ============================================================================

type ActiveListener = Rc<dyn Fn(bool)>;

enum SlotState {
    Idle,
    Awaiting(oneshot::Sender<bool>),
}

struct SlotInner {
    state: SlotState,
    listeners: Vec<ActiveListener>,
}

/// Per-guard holder of at most one pending confirmation.
#[derive(Clone)]
pub struct ConfirmationSlot {
    inner: Rc<RefCell<SlotInner>>,
}

impl ConfirmationSlot {
    /// Create an idle slot.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SlotInner {
                state: SlotState::Idle,
                listeners: Vec::new(),
            })),
        }
    }

    /// Whether a confirmation is waiting for [`accept`](Self::accept) or
    /// [`reject`](Self::reject).
    pub fn is_awaiting(&self) -> bool {
        matches!(self.inner.borrow().state, SlotState::Awaiting(_))
    }

    /// Enter `Awaiting` and return the future that completes on resolution.
    ///
    /// Fails with [`GuardError::ConfirmationPending`] if a confirmation is
    /// already waiting; the earlier one is left untouched.
    pub fn begin(&self) -> GuardResult<ConfirmFuture> {
        let receiver = {
            let mut inner = self.inner.borrow_mut();
            if matches!(inner.state, SlotState::Awaiting(_)) {
                return Err(GuardError::ConfirmationPending);
            }
            let (sender, receiver) = oneshot::channel();
            inner.state = SlotState::Awaiting(sender);
            receiver
        };
        trace_log!("Confirmation pending");
        self.notify(true);

        Ok(async move { receiver.await.map_err(|_| GuardError::ConfirmationDropped) }.boxed_local())
    }

    /// [`begin`](Self::begin) as a [`Confirmation`]; a refused begin becomes
    /// [`Confirmation::Failed`].
    pub fn confirmation(&self) -> Confirmation {
        self.begin().map_or_else(Confirmation::Failed, Confirmation::Deferred)
    }

    /// Resolve the pending confirmation with `true`. Returns whether one was pending.
    pub fn accept(&self) -> bool {
        self.resolve(true)
    }

    /// Resolve the pending confirmation with `false`. Returns whether one was pending.
    pub fn reject(&self) -> bool {
        self.resolve(false)
    }

    /// Drop the pending confirmation without answering; its future fails with
    /// [`GuardError::ConfirmationDropped`].
    pub fn abandon(&self) -> bool {
        let sender = self.take_sender();
        let was_pending = sender.is_some();
        drop(sender);
        if was_pending {
            trace_log!("Confirmation abandoned");
            self.notify(false);
        }
        was_pending
    }

    /// Register a listener called with the new `active` value on every
    /// `Idle <-> Awaiting` transition.
    pub fn subscribe(&self, listener: impl Fn(bool) + 'static) {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
    }

    /// UI-facing handle for this slot.
    pub fn resolver(&self) -> ConfirmResolver {
        ConfirmResolver { slot: self.clone() }
    }

    fn resolve(&self, answer: bool) -> bool {
        let Some(sender) = self.take_sender() else {
            return false;
        };
        trace_log!("Confirmation resolved: {}", answer);
        // The evaluation may already be gone; nothing is waiting then.
        let _ = sender.send(answer);
        self.notify(false);
        true
    }

    fn take_sender(&self) -> Option<oneshot::Sender<bool>> {
        let mut inner = self.inner.borrow_mut();
        match mem::replace(&mut inner.state, SlotState::Idle) {
            SlotState::Awaiting(sender) => Some(sender),
            SlotState::Idle => None,
        }
    }

    fn notify(&self, active: bool) {
        // Listeners may call back into the slot.
        let listeners = self.inner.borrow().listeners.clone();
        for listener in listeners {
            listener(active);
        }
    }
}

impl Default for ConfirmationSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfirmationSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationSlot")
            .field("awaiting", &self.is_awaiting())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConfirmResolver
// ============================================================================

/// Handle given to the confirmation UI: shows whether a prompt is due and
/// answers it.
#[derive(Clone, Debug)]
pub struct ConfirmResolver {
    slot: ConfirmationSlot,
}

impl ConfirmResolver {
    /// Whether a prompt should currently be shown.
    pub fn is_active(&self) -> bool {
        self.slot.is_awaiting()
    }

    /// Let the navigation proceed. No-op if nothing is pending.
    pub fn accept(&self) {
        self.slot.accept();
    }

    /// Keep the user where they are. No-op if nothing is pending.
    pub fn reject(&self) {
        self.slot.reject();
    }
}
