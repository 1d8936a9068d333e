//! In-memory collaborators.
//!
//! [`MemoryHistory`] models a browser session history: a stack of entries with
//! a cursor, where traversals move the cursor immediately but `popstate`
//! notifications are queued and delivered later by [`flush`](MemoryHistory::flush),
//! as the browser's event loop would. [`MemoryRouter`] is a minimal framework
//! router and location on top of it. Together they let the adapters run in
//! headless hosts and tests.

use crate::history::{HistoryAdapter, HistoryBackend, PopStateDisposition, PopStateEvent};
use crate::router::{Location, NavigateOptions, Router};
use crate::trace_log;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type PopStateListener = Rc<dyn Fn(&PopStateEvent) -> PopStateDisposition>;
type EntryListener = Rc<dyn Fn(usize)>;

// ============================================================================
// MemoryHistory
// ============================================================================

struct HistoryState {
    /// Navigation history stack
    entries: Vec<String>,
    /// Current position in history
    current: usize,
    /// Undelivered `popstate` events
    queue: VecDeque<PopStateEvent>,
    /// Listeners in dispatch order; capture listeners come first
    listeners: Vec<PopStateListener>,
    /// Told about entries created by `push_state`/`replace_state`
    entry_listeners: Vec<EntryListener>,
}

/// Session history kept in memory. Clones share the same history.
#[derive(Clone)]
pub struct MemoryHistory {
    state: Rc<RefCell<HistoryState>>,
}

impl MemoryHistory {
    /// Create a history with a single entry.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            state: Rc::new(RefCell::new(HistoryState {
                entries: vec![initial.into()],
                current: 0,
                queue: VecDeque::new(),
                listeners: Vec::new(),
                entry_listeners: Vec::new(),
            })),
        }
    }

    /// URL of the current entry.
    pub fn current_url(&self) -> String {
        let state = self.state.borrow();
        state.entries[state.current].clone()
    }

    /// Position of the current entry.
    pub fn index(&self) -> usize {
        self.state.borrow().current
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Whether the history is empty. It never is: it starts with one entry.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    /// Add an entry after the current one, dropping forward history.
    pub fn push_state(&self, url: impl Into<String>) {
        let next = {
            let mut state = self.state.borrow_mut();
            let next = state.current + 1;
            state.entries.truncate(next);
            state.entries.push(url.into());
            state.current = next;
            next
        };
        self.entry_changed(next);
    }

    /// Replace the current entry.
    pub fn replace_state(&self, url: impl Into<String>) {
        let current = {
            let mut state = self.state.borrow_mut();
            let current = state.current;
            state.entries[current] = url.into();
            current
        };
        self.entry_changed(current);
    }

    fn entry_changed(&self, index: usize) {
        let listeners = self.state.borrow().entry_listeners.clone();
        for listener in listeners {
            listener(index);
        }
    }

    /// Move the cursor by `delta` and queue a `popstate` event.
    ///
    /// Out-of-range traversals and `go(0)` do nothing and return `false`.
    pub fn go(&self, delta: isize) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(target) = state.current.checked_add_signed(delta) else {
            return false;
        };
        if delta == 0 || target >= state.entries.len() {
            return false;
        }
        state.current = target;
        let event = PopStateEvent::new(state.entries[target].clone(), Some(target));
        trace_log!("Queued popstate to '{}' ({})", event.url, target);
        state.queue.push_back(event);
        true
    }

    /// `go(-1)`
    pub fn back(&self) {
        let _ = self.go(-1);
    }

    /// `go(1)`
    pub fn forward(&self) {
        let _ = self.go(1);
    }

    /// Check if can go back.
    pub fn can_go_back(&self) -> bool {
        self.state.borrow().current > 0
    }

    /// Check if can go forward.
    pub fn can_go_forward(&self) -> bool {
        let state = self.state.borrow();
        state.current + 1 < state.entries.len()
    }

    /// Listen for `popstate` after already registered listeners.
    pub fn add_listener(&self, listener: impl Fn(&PopStateEvent) -> PopStateDisposition + 'static) {
        self.state.borrow_mut().listeners.push(Rc::new(listener));
    }

    /// Listen for `popstate` before every other listener.
    pub fn add_capture_listener(
        &self,
        listener: impl Fn(&PopStateEvent) -> PopStateDisposition + 'static,
    ) {
        self.state.borrow_mut().listeners.insert(0, Rc::new(listener));
    }

    /// Route `popstate` through `adapter` ahead of the framework and keep it
    /// informed of pushed and replaced entries.
    pub fn attach(&self, adapter: &HistoryAdapter) {
        let weak = adapter.downgrade();
        self.add_capture_listener(move |event| weak.on_pop_state(event));
        let weak = adapter.downgrade();
        self.state
            .borrow_mut()
            .entry_listeners
            .push(Rc::new(move |index: usize| weak.entry_changed(Some(index))));
        adapter.entry_changed(Some(self.index()));
    }

    /// Whether events are waiting for [`flush`](Self::flush).
    pub fn has_pending_events(&self) -> bool {
        !self.state.borrow().queue.is_empty()
    }

    /// Deliver queued events, including those queued by listeners meanwhile.
    ///
    /// Returns the number of events delivered.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let (event, listeners) = {
                let mut state = self.state.borrow_mut();
                let Some(event) = state.queue.pop_front() else {
                    break;
                };
                (event, state.listeners.clone())
            };
            for listener in listeners {
                if listener(&event) == PopStateDisposition::Suppress {
                    break;
                }
            }
            delivered += 1;
        }
        delivered
    }
}

impl HistoryBackend for MemoryHistory {
    fn go(&self, delta: isize) -> bool {
        MemoryHistory::go(self, delta)
    }

    fn current_index(&self) -> Option<usize> {
        Some(self.index())
    }

    fn connect(&self, adapter: &HistoryAdapter) {
        self.attach(adapter);
    }
}

impl fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryHistory")
            .field("entries", &state.entries)
            .field("current", &state.current)
            .field("queued", &state.queue.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// MemoryRouter
// ============================================================================

/// Framework-side router over a [`MemoryHistory`].
///
/// Tracks the location it has *rendered*, which only follows `popstate`
/// events that were allowed to propagate.
pub struct MemoryRouter {
    history: MemoryHistory,
    rendered: Rc<RefCell<String>>,
    refreshes: Cell<usize>,
}

impl MemoryRouter {
    /// Create a router rendering the history's current entry.
    pub fn new(history: MemoryHistory) -> Self {
        let rendered = Rc::new(RefCell::new(history.current_url()));
        let on_pop = Rc::clone(&rendered);
        history.add_listener(move |event| {
            on_pop.borrow_mut().clone_from(&event.url);
            PopStateDisposition::Propagate
        });
        Self {
            history,
            rendered,
            refreshes: Cell::new(0),
        }
    }

    /// The underlying history.
    pub fn history(&self) -> &MemoryHistory {
        &self.history
    }

    /// Location the framework currently shows.
    pub fn rendered(&self) -> String {
        self.rendered.borrow().clone()
    }

    /// How many times [`refresh`](Router::refresh) ran.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.get()
    }

    fn show(&self, url: &str) {
        url.clone_into(&mut self.rendered.borrow_mut());
    }
}

impl Router for MemoryRouter {
    fn push(&self, href: &str, _options: NavigateOptions) {
        self.history.push_state(href);
        self.show(href);
    }

    fn replace(&self, href: &str, _options: NavigateOptions) {
        self.history.replace_state(href);
        self.show(href);
    }

    fn refresh(&self) {
        self.refreshes.set(self.refreshes.get() + 1);
    }
}

impl Location for MemoryRouter {
    fn href(&self) -> String {
        self.history.current_url()
    }

    fn assign(&self, url: &str) {
        Router::push(self, url, NavigateOptions::default());
    }

    fn replace(&self, url: &str) {
        Router::replace(self, url, NavigateOptions::default());
    }
}

impl fmt::Debug for MemoryRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRouter")
            .field("history", &self.history)
            .field("rendered", &self.rendered())
            .finish_non_exhaustive()
    }
}
