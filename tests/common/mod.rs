//! Test utilities for navigation guard tests
//!
//! Provides a mounted in-memory application, DOM fakes for link clicks and
//! unload events, and small guard helpers.

#![allow(dead_code)]

use futures::executor::LocalPool;
use navigation_guard::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Route test logs through `env_logger`; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A provider mounted over an in-memory history and router.
pub struct TestApp {
    pub history: MemoryHistory,
    pub router: Rc<MemoryRouter>,
    pub pool: LocalPool,
    pub provider: NavigationGuardProvider,
}

impl TestApp {
    /// Mount at `urls[0]` and push the remaining URLs before mounting.
    pub fn new(urls: &[&str]) -> Self {
        Self::with_config(urls, InterceptConfig::default())
    }

    pub fn with_config(urls: &[&str], config: InterceptConfig) -> Self {
        init_logging();
        let history = MemoryHistory::new(urls[0]);
        for url in &urls[1..] {
            history.push_state(*url);
        }
        let router = Rc::new(MemoryRouter::new(history.clone()));
        let pool = LocalPool::new();
        let provider = NavigationGuardProvider::builder(Rc::new(pool.spawner()))
            .config(config)
            .router(router.clone())
            .location(router.clone())
            .history(Rc::new(history.clone()))
            .build();
        Self {
            history,
            router,
            pool,
            provider,
        }
    }

    pub fn scope(&self) -> GuardScope {
        self.provider.scope()
    }

    pub fn push(&self, href: &str) {
        self.provider
            .router()
            .expect("router configured")
            .push(href, NavigateOptions::default());
    }

    /// Run spawned evaluations and deliver queued `popstate` events until
    /// nothing is left to do.
    pub fn settle(&mut self) {
        loop {
            self.pool.run_until_stalled();
            if self.history.flush() == 0 {
                break;
            }
        }
    }

    pub fn url(&self) -> String {
        self.history.current_url()
    }
}

/// Guard options whose confirm callback counts calls and answers `answer`.
pub fn counting(answer: bool) -> (GuardOptions, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let options = GuardOptions::new().confirm(move |_| {
        counter.set(counter.get() + 1);
        answer.into()
    });
    (options, calls)
}

/// Guard options recording every attempt it is asked about.
pub fn recording(answer: bool) -> (GuardOptions, Rc<RefCell<Vec<NavigationAttempt>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = seen.clone();
    let options = GuardOptions::new().confirm(move |attempt| {
        record.borrow_mut().push(attempt.clone());
        answer.into()
    });
    (options, seen)
}

// ============================================================================
// DOM fakes
// ============================================================================

#[derive(Clone, Default)]
pub struct FakeAnchor {
    attributes: Rc<RefCell<HashMap<String, String>>>,
}

impl FakeAnchor {
    pub fn new(attributes: &[(&str, &str)]) -> Self {
        let anchor = Self::default();
        for (name, value) in attributes {
            anchor.set_attribute(name, value);
        }
        anchor
    }

    pub fn link(href: &str) -> Self {
        Self::new(&[("href", href)])
    }
}

impl AnchorElement for FakeAnchor {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&self, name: &str) {
        self.attributes.borrow_mut().remove(name);
    }
}

pub struct FakeClick {
    pub anchor: FakeAnchor,
    pub modifiers: Modifiers,
    pub suppressed: Cell<bool>,
}

impl FakeClick {
    pub fn on(anchor: &FakeAnchor) -> Self {
        Self {
            anchor: anchor.clone(),
            modifiers: Modifiers::default(),
            suppressed: Cell::new(false),
        }
    }
}

impl ClickEvent for FakeClick {
    type Anchor = FakeAnchor;

    fn anchor(&self) -> Option<FakeAnchor> {
        Some(self.anchor.clone())
    }

    fn button(&self) -> i16 {
        0
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn suppress(&self) {
        self.suppressed.set(true);
    }
}

#[derive(Default)]
pub struct FakeUnload {
    pub prevented: Cell<bool>,
    pub message: RefCell<Option<String>>,
}

impl BeforeUnload for FakeUnload {
    fn prevent_default(&self) {
        self.prevented.set(true);
    }

    fn set_return_value(&self, message: &str) {
        *self.message.borrow_mut() = Some(message.to_string());
    }
}
