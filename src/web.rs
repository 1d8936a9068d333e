//! Browser bindings (feature `web`).
//!
//! `web-sys` implementations of the collaborator traits plus [`attach`],
//! which installs the DOM listeners feeding a provider's adapters:
//!
//! - `click` on the document, capture phase, for the link adapter;
//! - `popstate` on the window, capture phase, for the history adapter;
//! - `beforeunload` on the window for the unload adapter.
//!
//! Session history entries carry no position in the browser, so `attach`
//! also wraps `history.pushState`/`history.replaceState` to stamp every new
//! entry's state with its index under
//! [`InterceptConfig::history_state_key`](crate::InterceptConfig::history_state_key).
//! Entries created before `attach` stay unstamped and are never reverted.
//!
//! Call `attach` before the framework registers its own `popstate` listener,
//! so suppressed traversals never reach it.
//!
//! ```ignore
//! let provider = navigation_guard::web::builder(InterceptConfig::default())?
//!     .router(app_router)
//!     .build();
//! let _listeners = navigation_guard::web::attach(&provider);
//! ```

use crate::config::InterceptConfig;
use crate::executor::Executor;
use crate::history::{HistoryAdapter, HistoryBackend, PopStateDisposition, PopStateEvent};
use crate::links::{AnchorElement, ClickEvent, ClickOutcome, Modifiers};
use crate::provider::{NavigationGuardProvider, ProviderBuilder};
use crate::router::Location;
use crate::unload::BeforeUnload;
use crate::{debug_log, error_log, warn_log};
use futures::future::LocalBoxFuture;
use js_sys::{Function, Object, Reflect};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{BeforeUnloadEvent, Document, Element, MouseEvent, Window};

// ============================================================================
// Executor and builder
// ============================================================================

/// Runs evaluations on the browser's microtask queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmExecutor;

impl Executor for WasmExecutor {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}

/// A provider builder preloaded with the browser's executor, location and
/// history. `None` outside a browser.
pub fn builder(config: InterceptConfig) -> Option<ProviderBuilder> {
    let window = web_sys::window()?;
    let history = BrowserHistory::from_window(&window, &config.history_state_key)?;
    Some(
        NavigationGuardProvider::builder(Rc::new(WasmExecutor))
            .location(Rc::new(BrowserLocation::from_window(&window)))
            .history(Rc::new(history))
            .config(config),
    )
}

// ============================================================================
// Location
// ============================================================================

/// `window.location`.
#[derive(Debug, Clone)]
pub struct BrowserLocation {
    location: web_sys::Location,
}

impl BrowserLocation {
    /// Location of `window`.
    pub fn from_window(window: &Window) -> Self {
        Self {
            location: window.location(),
        }
    }
}

impl Location for BrowserLocation {
    fn href(&self) -> String {
        self.location.href().unwrap_or_default()
    }

    fn assign(&self, url: &str) {
        if let Err(err) = self.location.assign(url) {
            error_log!("location.assign('{}') failed: {:?}", url, err);
        }
    }

    fn replace(&self, url: &str) {
        if let Err(err) = self.location.replace(url) {
            error_log!("location.replace('{}') failed: {:?}", url, err);
        }
    }
}

// ============================================================================
// History
// ============================================================================

/// `window.history`, reading entry positions from the stamped state.
#[derive(Debug, Clone)]
pub struct BrowserHistory {
    history: web_sys::History,
    key: JsValue,
}

impl BrowserHistory {
    /// History of `window`; `None` if the browser denies access.
    pub fn from_window(window: &Window, state_key: &str) -> Option<Self> {
        let history = window.history().ok()?;
        Some(Self {
            history,
            key: JsValue::from_str(state_key),
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn index_of(&self, state: &JsValue) -> Option<usize> {
        if !state.is_object() {
            return None;
        }
        Reflect::get(state, &self.key)
            .ok()?
            .as_f64()
            .filter(|index| *index >= 0.0)
            .map(|index| index as usize)
    }

    /// Copy of `state` carrying `index`.
    #[allow(clippy::cast_precision_loss)]
    fn stamped(&self, state: &JsValue, index: usize) -> JsValue {
        let stamped = Object::new();
        if let Some(state) = state.dyn_ref::<Object>() {
            Object::assign(&stamped, state);
        }
        if let Err(err) = Reflect::set(&stamped, &self.key, &JsValue::from_f64(index as f64)) {
            warn_log!("Could not stamp history entry: {:?}", err);
        }
        stamped.into()
    }

    fn state(&self) -> JsValue {
        self.history.state().unwrap_or(JsValue::NULL)
    }

    /// Stamp the current entry if it carries no index yet, assuming it is the
    /// last one (a fresh page load).
    fn stamp_current(&self) -> Option<usize> {
        let state = self.state();
        if let Some(index) = self.index_of(&state) {
            return Some(index);
        }
        let length = usize::try_from(self.history.length().ok()?).ok()?;
        let index = length.checked_sub(1)?;
        self.history
            .replace_state(&self.stamped(&state, index), "")
            .ok()?;
        Some(index)
    }
}

impl HistoryBackend for BrowserHistory {
    fn go(&self, delta: isize) -> bool {
        let Ok(delta) = i32::try_from(delta) else {
            warn_log!("Traversal delta {} out of range", delta);
            return false;
        };
        match self.history.go_with_delta(delta) {
            Ok(()) => true,
            Err(err) => {
                error_log!("history.go({}) failed: {:?}", delta, err);
                false
            }
        }
    }

    fn current_index(&self) -> Option<usize> {
        self.index_of(&self.state())
    }
}

type StateFn = dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>;

/// `pushState`/`replaceState` replaced by stamping versions; the originals
/// are restored on drop.
struct StateStamping {
    history: web_sys::History,
    original_push: Function,
    original_replace: Function,
    _push: Closure<StateFn>,
    _replace: Closure<StateFn>,
}

impl StateStamping {
    fn install(backend: &BrowserHistory, adapter: &HistoryAdapter) -> Option<Self> {
        let target: &JsValue = backend.history.as_ref();
        let original_push = Reflect::get(target, &"pushState".into())
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        let original_replace = Reflect::get(target, &"replaceState".into())
            .ok()?
            .dyn_into::<Function>()
            .ok()?;

        let push = {
            let (backend, adapter, original) =
                (backend.clone(), adapter.downgrade(), original_push.clone());
            Closure::wrap(Box::new(move |state: JsValue, title: JsValue, url: JsValue| {
                let index = backend.current_index().map(|index| index + 1);
                let state = match index {
                    Some(index) => backend.stamped(&state, index),
                    None => state,
                };
                let result = original.call3(backend.history.as_ref(), &state, &title, &url)?;
                adapter.entry_changed(index);
                Ok(result)
            }) as Box<StateFn>)
        };

        let replace = {
            let (backend, adapter, original) =
                (backend.clone(), adapter.downgrade(), original_replace.clone());
            Closure::wrap(Box::new(move |state: JsValue, title: JsValue, url: JsValue| {
                let index = backend.current_index();
                let state = match index {
                    Some(index) => backend.stamped(&state, index),
                    None => state,
                };
                let result = original.call3(backend.history.as_ref(), &state, &title, &url)?;
                adapter.entry_changed(index);
                Ok(result)
            }) as Box<StateFn>)
        };

        Reflect::set(target, &"pushState".into(), push.as_ref()).ok()?;
        Reflect::set(target, &"replaceState".into(), replace.as_ref()).ok()?;

        Some(Self {
            history: backend.history.clone(),
            original_push,
            original_replace,
            _push: push,
            _replace: replace,
        })
    }
}

impl Drop for StateStamping {
    fn drop(&mut self) {
        let target: &JsValue = self.history.as_ref();
        let restored = Reflect::set(target, &"pushState".into(), &self.original_push)
            .and_then(|_| Reflect::set(target, &"replaceState".into(), &self.original_replace));
        if let Err(err) = restored {
            error_log!("Could not restore history methods: {:?}", err);
        }
    }
}

// ============================================================================
// DOM events
// ============================================================================

/// An anchor element in the document.
#[derive(Debug, Clone)]
pub struct BrowserAnchor(Element);

impl AnchorElement for BrowserAnchor {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(err) = self.0.set_attribute(name, value) {
            warn_log!("Could not set '{}' on anchor: {:?}", name, err);
        }
    }

    fn remove_attribute(&self, name: &str) {
        if let Err(err) = self.0.remove_attribute(name) {
            warn_log!("Could not remove '{}' from anchor: {:?}", name, err);
        }
    }
}

impl ClickEvent for MouseEvent {
    type Anchor = BrowserAnchor;

    fn anchor(&self) -> Option<BrowserAnchor> {
        let element = self.target()?.dyn_into::<Element>().ok()?;
        element.closest("a[href]").ok().flatten().map(BrowserAnchor)
    }

    fn button(&self) -> i16 {
        MouseEvent::button(self)
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers {
            meta: self.meta_key(),
            ctrl: self.ctrl_key(),
            shift: self.shift_key(),
            alt: self.alt_key(),
        }
    }

    fn suppress(&self) {
        self.prevent_default();
        self.stop_immediate_propagation();
    }
}

impl BeforeUnload for BeforeUnloadEvent {
    fn prevent_default(&self) {
        web_sys::Event::prevent_default(self);
    }

    fn set_return_value(&self, message: &str) {
        BeforeUnloadEvent::set_return_value(self, message);
    }
}

// ============================================================================
// attach
// ============================================================================

/// DOM listeners installed by [`attach`]; removed on drop.
pub struct WebListeners {
    window: Window,
    document: Document,
    click: Option<Closure<dyn FnMut(MouseEvent)>>,
    popstate: Option<Closure<dyn FnMut(web_sys::PopStateEvent)>>,
    beforeunload: Option<Closure<dyn FnMut(BeforeUnloadEvent)>>,
    _stamping: Option<StateStamping>,
}

impl Drop for WebListeners {
    fn drop(&mut self) {
        if let Some(click) = &self.click {
            unlisten(&self.document, "click", click.as_ref().unchecked_ref(), true);
        }
        if let Some(popstate) = &self.popstate {
            unlisten(&self.window, "popstate", popstate.as_ref().unchecked_ref(), true);
        }
        if let Some(beforeunload) = &self.beforeunload {
            unlisten(&self.window, "beforeunload", beforeunload.as_ref().unchecked_ref(), false);
        }
        debug_log!("Browser listeners removed");
    }
}

/// Feed `provider`'s adapters from the DOM. `None` outside a browser.
pub fn attach(provider: &NavigationGuardProvider) -> Option<WebListeners> {
    let window = web_sys::window()?;
    let document = window.document()?;

    let click = provider.link_adapter().cloned().map(|adapter| {
        Closure::wrap(Box::new(move |event: MouseEvent| {
            if adapter.handle_click(&event) == ClickOutcome::Intercepted {
                debug_log!("Link click held for guards");
            }
        }) as Box<dyn FnMut(MouseEvent)>)
    });
    if let Some(click) = &click {
        listen(&document, "click", click.as_ref().unchecked_ref(), true);
    }

    let mut stamping = None;
    let backend = BrowserHistory::from_window(&window, &provider.config().history_state_key);
    let popstate = provider.history_adapter().zip(backend).map(|(adapter, backend)| {
        adapter.entry_changed(backend.stamp_current());
        stamping = StateStamping::install(&backend, adapter);
        if stamping.is_none() {
            warn_log!("Could not wrap history methods; new entries will not be guarded");
        }

        let (adapter, location) = (adapter.downgrade(), BrowserLocation::from_window(&window));
        let closure = Closure::wrap(Box::new(move |event: web_sys::PopStateEvent| {
            let pop = PopStateEvent::new(location.href(), backend.index_of(&event.state()));
            if adapter.on_pop_state(&pop) == PopStateDisposition::Suppress {
                event.stop_immediate_propagation();
            }
        }) as Box<dyn FnMut(web_sys::PopStateEvent)>);
        listen(&window, "popstate", closure.as_ref().unchecked_ref(), true);
        closure
    });

    let beforeunload = provider.unload_adapter().cloned().map(|adapter| {
        let closure = Closure::wrap(Box::new(move |event: BeforeUnloadEvent| {
            adapter.on_before_unload(&event);
        }) as Box<dyn FnMut(BeforeUnloadEvent)>);
        listen(&window, "beforeunload", closure.as_ref().unchecked_ref(), false);
        closure
    });

    debug_log!(
        "Browser listeners attached (click: {}, popstate: {}, beforeunload: {})",
        click.is_some(),
        popstate.is_some(),
        beforeunload.is_some()
    );

    Some(WebListeners {
        window,
        document,
        click,
        popstate,
        beforeunload,
        _stamping: stamping,
    })
}

fn listen(target: &web_sys::EventTarget, event: &str, callback: &Function, capture: bool) {
    if let Err(err) = target.add_event_listener_with_callback_and_bool(event, callback, capture) {
        error_log!("Could not listen for '{}': {:?}", event, err);
    }
}

fn unlisten(target: &web_sys::EventTarget, event: &str, callback: &Function, capture: bool) {
    if let Err(err) = target.remove_event_listener_with_callback_and_bool(event, callback, capture) {
        warn_log!("Could not stop listening for '{}': {:?}", event, err);
    }
}
