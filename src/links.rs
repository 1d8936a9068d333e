//! Link-click adapter.
//!
//! Clicks on in-app anchors are inspected in the capture phase, before the
//! framework's own link handling. A click is only considered when it is a
//! plain primary-button click on a same-application link:
//!
//! | Skipped when                                  | Why                          |
//! |-----------------------------------------------|------------------------------|
//! | no enclosing anchor with `href`               | not a link                   |
//! | anchor already being evaluated                | double click                 |
//! | `href` has a scheme or starts with `//`       | leaves the application       |
//! | `href` starts with `#`                        | in-page jump                 |
//! | `target` other than `_self`                   | opens another browsing context |
//! | `download` attribute                          | not a navigation             |
//! | meta/ctrl/shift/alt held, or non-primary button | user asked for a new tab/window |
//!
//! With no enabled guard the browser proceeds untouched. Otherwise the
//! default action is cancelled synchronously (it cannot be deferred), the
//! guards are evaluated, and on approval the navigation is performed
//! programmatically with the same push/replace distinction.

use crate::attempt::{NavigationAttempt, NavigationType};
use crate::config::InterceptConfig;
use crate::executor::{run_or_spawn, Executor};
use crate::protocol::Evaluation;
use crate::registry::{snapshot_weak, WeakRegistry};
use crate::router::{Location, NavigateOptions, Router};
use crate::{debug_log, trace_log, warn_log};
use std::rc::Rc;

// ============================================================================
// Collaborator traits
// ============================================================================

/// An anchor element, accessed through its attributes.
pub trait AnchorElement {
    /// Value of attribute `name`, if present.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Set attribute `name`.
    fn set_attribute(&self, name: &str, value: &str);

    /// Remove attribute `name`.
    fn remove_attribute(&self, name: &str);
}

/// Keyboard modifiers held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Command / Windows key.
    pub meta: bool,
    /// Control key.
    pub ctrl: bool,
    /// Shift key.
    pub shift: bool,
    /// Alt / Option key.
    pub alt: bool,
}

impl Modifiers {
    /// Whether any modifier is held.
    pub fn any(self) -> bool {
        self.meta || self.ctrl || self.shift || self.alt
    }
}

/// A click event as delivered to the capture-phase listener.
pub trait ClickEvent {
    /// Anchor type resolved from the event target.
    type Anchor: AnchorElement + 'static;

    /// Closest anchor carrying an `href`, starting at the event target.
    fn anchor(&self) -> Option<Self::Anchor>;

    /// Mouse button (`0` is primary).
    fn button(&self) -> i16;

    /// Modifiers held.
    fn modifiers(&self) -> Modifiers;

    /// Cancel the default action and stop the event reaching other listeners.
    fn suppress(&self);
}

// ============================================================================
// Outcome
// ============================================================================

/// Why a click was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No anchor with an `href`.
    NotALink,
    /// The anchor's previous click is still being evaluated.
    Processing,
    /// Absolute or protocol-relative URL.
    External,
    /// Fragment-only link.
    Fragment,
    /// Opens in another browsing context.
    Target,
    /// Download link.
    Download,
    /// A modifier key was held.
    Modifier,
    /// Not the primary button.
    Button,
}

/// What the adapter did with a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not eligible for guarding; native handling continues.
    Skipped(SkipReason),
    /// Eligible but no guard enabled; native handling continues.
    Unguarded,
    /// Default suppressed; the guards decide.
    Intercepted,
}

/// Whether `href` leaves the application: protocol-relative, or carrying a
/// URL scheme (`https:`, `mailto:`, ...).
pub fn is_external_href(href: &str) -> bool {
    if href.starts_with("//") {
        return true;
    }
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

// ============================================================================
// LinkAdapter
// ============================================================================

enum LinkNavigator {
    Router(Rc<dyn Router>),
    Location(Rc<dyn Location>),
    Unavailable,
}

impl LinkNavigator {
    fn navigate(&self, kind: NavigationType, href: &str) {
        match (self, kind) {
            (Self::Router(router), NavigationType::Replace) => {
                router.replace(href, NavigateOptions::default());
            }
            (Self::Router(router), _) => router.push(href, NavigateOptions::default()),
            (Self::Location(location), NavigationType::Replace) => location.replace(href),
            (Self::Location(location), _) => location.assign(href),
            (Self::Unavailable, _) => {
                warn_log!("No router or location to follow approved link '{}'", href);
            }
        }
    }
}

struct LinkInner {
    registry: WeakRegistry,
    executor: Rc<dyn Executor>,
    navigator: LinkNavigator,
    replace_attribute: String,
    processing_attribute: String,
}

/// Guards clicks on in-app anchors.
#[derive(Clone)]
pub struct LinkAdapter {
    inner: Rc<LinkInner>,
}

impl LinkAdapter {
    /// Create an adapter that follows approved links through `router`.
    ///
    /// `router` must be the raw framework router: the guards have already
    /// approved the navigation.
    pub fn with_router(
        registry: WeakRegistry,
        executor: Rc<dyn Executor>,
        router: Rc<dyn Router>,
        config: &InterceptConfig,
    ) -> Self {
        Self::build(registry, executor, LinkNavigator::Router(router), config)
    }

    /// Create an adapter that follows approved links by assigning the location.
    pub fn with_location(
        registry: WeakRegistry,
        executor: Rc<dyn Executor>,
        location: Rc<dyn Location>,
        config: &InterceptConfig,
    ) -> Self {
        Self::build(registry, executor, LinkNavigator::Location(location), config)
    }

    /// Create an adapter with nowhere to navigate; approved clicks are logged.
    pub fn detached(registry: WeakRegistry, executor: Rc<dyn Executor>, config: &InterceptConfig) -> Self {
        Self::build(registry, executor, LinkNavigator::Unavailable, config)
    }

    fn build(
        registry: WeakRegistry,
        executor: Rc<dyn Executor>,
        navigator: LinkNavigator,
        config: &InterceptConfig,
    ) -> Self {
        Self {
            inner: Rc::new(LinkInner {
                registry,
                executor,
                navigator,
                replace_attribute: config.replace_attribute.clone(),
                processing_attribute: config.processing_attribute.clone(),
            }),
        }
    }

    /// Classify a click without side effects: the attempt it would produce,
    /// or why it is skipped.
    pub fn classify<E: ClickEvent>(&self, event: &E) -> Result<(E::Anchor, NavigationAttempt), SkipReason> {
        let anchor = event.anchor().ok_or(SkipReason::NotALink)?;
        if anchor.attribute(&self.inner.processing_attribute).as_deref() == Some("true") {
            return Err(SkipReason::Processing);
        }
        let href = anchor
            .attribute("href")
            .filter(|href| !href.is_empty())
            .ok_or(SkipReason::NotALink)?;
        if is_external_href(&href) {
            return Err(SkipReason::External);
        }
        if href.starts_with('#') {
            return Err(SkipReason::Fragment);
        }
        if anchor
            .attribute("target")
            .is_some_and(|target| !target.is_empty() && target != "_self")
        {
            return Err(SkipReason::Target);
        }
        if anchor.attribute("download").is_some() {
            return Err(SkipReason::Download);
        }
        if event.modifiers().any() {
            return Err(SkipReason::Modifier);
        }
        if event.button() != 0 {
            return Err(SkipReason::Button);
        }

        let kind = if anchor.attribute(&self.inner.replace_attribute).as_deref() == Some("true") {
            NavigationType::Replace
        } else {
            NavigationType::Push
        };
        Ok((anchor, NavigationAttempt::new(href, kind)))
    }

    /// Handle a capture-phase click.
    pub fn handle_click<E: ClickEvent>(&self, event: &E) -> ClickOutcome {
        let (anchor, attempt) = match self.classify(event) {
            Ok(eligible) => eligible,
            Err(reason) => {
                trace_log!("Link click skipped: {:?}", reason);
                return ClickOutcome::Skipped(reason);
            }
        };

        let evaluation = Evaluation::new(&snapshot_weak(&self.inner.registry), attempt);
        if !evaluation.is_guarded() {
            debug_log!("No guards enabled, allowing link to '{}'", evaluation.attempt().destination);
            return ClickOutcome::Unguarded;
        }

        event.suppress();
        anchor.set_attribute(&self.inner.processing_attribute, "true");
        debug_log!("Intercepted link click to '{}'", evaluation.attempt().destination);

        let inner = Rc::clone(&self.inner);
        let NavigationAttempt { destination, kind } = evaluation.attempt().clone();
        run_or_spawn(self.inner.executor.as_ref(), async move {
            let verdict = evaluation.run().await;
            anchor.remove_attribute(&inner.processing_attribute);
            if verdict.is_allow() {
                debug_log!("Following approved link to '{}'", destination);
                inner.navigator.navigate(kind, &destination);
            }
        });
        ClickOutcome::Intercepted
    }
}
