//! The provider: one guard registry and the adapters that consult it.
//!
//! [`NavigationGuardProvider`] is mounted once per application (or per
//! independent region) and owns the only strong reference to its registry.
//! Everything else, including guard handles, the [`GuardedRouter`] and the
//! adapters, holds it weakly, so unmounting the provider turns every adapter
//! into a passthrough.
//!
//! Which adapters exist depends on the collaborators the host supplies and on
//! [`InterceptConfig`]:
//!
//! | Adapter                 | Needs                     | Switch              |
//! |-------------------------|---------------------------|---------------------|
//! | [`GuardedRouter`]       | a [`Router`]              | always              |
//! | [`HistoryAdapter`]      | a [`HistoryBackend`]      | `history` feature + config |
//! | [`LinkAdapter`]         | nothing (router/location to follow links) | `links` feature + config |
//! | [`UnloadAdapter`]       | nothing (location for the destination)    | `unload` feature + config |

use crate::config::InterceptConfig;
use crate::coordinator::GuardScope;
use crate::error::{GuardError, GuardResult};
use crate::executor::Executor;
#[cfg(feature = "history")]
use crate::history::{HistoryAdapter, HistoryBackend};
#[cfg(feature = "links")]
use crate::links::LinkAdapter;
use crate::registry::{GuardRegistry, SharedRegistry};
use crate::router::{GuardedRouter, Location, Router};
#[cfg(feature = "unload")]
use crate::unload::UnloadAdapter;
use crate::{debug_log, info_log};
use std::fmt;
use std::rc::Rc;

// ============================================================================
// ProviderBuilder
// ============================================================================

/// Collects collaborators for a [`NavigationGuardProvider`].
pub struct ProviderBuilder {
    executor: Rc<dyn Executor>,
    config: InterceptConfig,
    router: Option<Rc<dyn Router>>,
    location: Option<Rc<dyn Location>>,
    #[cfg(feature = "history")]
    history: Option<Rc<dyn HistoryBackend>>,
}

impl ProviderBuilder {
    /// Use `config` instead of [`InterceptConfig::default`].
    #[must_use]
    pub fn config(mut self, config: InterceptConfig) -> Self {
        self.config = config;
        self
    }

    /// The host framework's router.
    #[must_use]
    pub fn router<R: Router + 'static>(mut self, router: Rc<R>) -> Self {
        self.router = Some(router);
        self
    }

    /// The document location.
    #[must_use]
    pub fn location<L: Location + 'static>(mut self, location: Rc<L>) -> Self {
        self.location = Some(location);
        self
    }

    /// The session history to guard traversals of.
    ///
    /// [`build`](Self::build) connects the new [`HistoryAdapter`] through
    /// [`HistoryBackend::connect`], so a [`MemoryHistory`](crate::MemoryHistory)
    /// needs no further wiring. In the browser the events come from
    /// `web::attach` instead.
    #[cfg(feature = "history")]
    #[must_use]
    pub fn history<H: HistoryBackend + 'static>(mut self, history: Rc<H>) -> Self {
        self.history = Some(history);
        self
    }

    /// Mount the provider.
    pub fn build(self) -> NavigationGuardProvider {
        let registry = GuardRegistry::shared();
        let weak = Rc::downgrade(&registry);
        let config = self.config;

        let router = self.router.as_ref().map(|router| {
            let guarded = GuardedRouter::new(Rc::clone(router), weak.clone(), Rc::clone(&self.executor));
            match &self.location {
                Some(location) => guarded.with_location(Rc::clone(location)),
                None => guarded,
            }
        });

        #[cfg(feature = "history")]
        let history = self
            .history
            .filter(|_| config.history)
            .map(|backend| {
                let adapter =
                    HistoryAdapter::new(weak.clone(), Rc::clone(&backend), Rc::clone(&self.executor));
                backend.connect(&adapter);
                adapter
            });

        #[cfg(feature = "links")]
        let links = config.links.then(|| {
            let executor = Rc::clone(&self.executor);
            match (&self.router, &self.location) {
                (Some(router), _) => LinkAdapter::with_router(weak.clone(), executor, Rc::clone(router), &config),
                (None, Some(location)) => {
                    LinkAdapter::with_location(weak.clone(), executor, Rc::clone(location), &config)
                }
                (None, None) => LinkAdapter::detached(weak.clone(), executor, &config),
            }
        });

        #[cfg(feature = "unload")]
        let unload = config.unload.then(|| {
            let adapter = UnloadAdapter::new(weak.clone(), self.location.clone());
            match &config.unload_message {
                Some(message) => adapter.with_message(message.clone()),
                None => adapter,
            }
        });

        info_log!(
            "Navigation guard provider mounted (router: {}, location: {})",
            router.is_some(),
            self.location.is_some()
        );

        NavigationGuardProvider {
            registry,
            config,
            location: self.location,
            router,
            #[cfg(feature = "history")]
            history,
            #[cfg(feature = "links")]
            links,
            #[cfg(feature = "unload")]
            unload,
        }
    }
}

// ============================================================================
// NavigationGuardProvider
// ============================================================================

/// Owner of a guard registry and its adapters.
pub struct NavigationGuardProvider {
    registry: SharedRegistry,
    config: InterceptConfig,
    location: Option<Rc<dyn Location>>,
    router: Option<GuardedRouter<dyn Router>>,
    #[cfg(feature = "history")]
    history: Option<HistoryAdapter>,
    #[cfg(feature = "links")]
    links: Option<LinkAdapter>,
    #[cfg(feature = "unload")]
    unload: Option<UnloadAdapter>,
}

impl NavigationGuardProvider {
    /// Start building a provider that runs deferred evaluations on `executor`.
    pub fn builder(executor: Rc<dyn Executor>) -> ProviderBuilder {
        ProviderBuilder {
            executor,
            config: InterceptConfig::default(),
            router: None,
            location: None,
            #[cfg(feature = "history")]
            history: None,
        }
    }

    /// Handle through which guards register.
    pub fn scope(&self) -> GuardScope {
        GuardScope::new(Rc::downgrade(&self.registry))
    }

    /// Active configuration.
    pub fn config(&self) -> &InterceptConfig {
        &self.config
    }

    /// Document location, if supplied.
    pub fn location(&self) -> Option<&Rc<dyn Location>> {
        self.location.as_ref()
    }

    /// Number of registered guards.
    pub fn guard_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// The guarded router for application code.
    pub fn router(&self) -> GuardResult<&GuardedRouter<dyn Router>> {
        self.router
            .as_ref()
            .ok_or(GuardError::Unavailable { what: "router" })
    }

    /// The history-traversal adapter, if a history was supplied and enabled.
    #[cfg(feature = "history")]
    pub fn history_adapter(&self) -> Option<&HistoryAdapter> {
        self.history.as_ref()
    }

    /// The link-click adapter, if enabled.
    #[cfg(feature = "links")]
    pub fn link_adapter(&self) -> Option<&LinkAdapter> {
        self.links.as_ref()
    }

    /// The unload adapter, if enabled.
    #[cfg(feature = "unload")]
    pub fn unload_adapter(&self) -> Option<&UnloadAdapter> {
        self.unload.as_ref()
    }

    /// Tear the provider down. Guards registered through it stop being
    /// consulted and new registrations fail with [`GuardError::NoProvider`].
    pub fn unmount(self) {
        debug_log!("Unmounting with {} guards registered", self.guard_count());
    }
}

impl Drop for NavigationGuardProvider {
    fn drop(&mut self) {
        info_log!("Navigation guard provider unmounted");
    }
}

impl fmt::Debug for NavigationGuardProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationGuardProvider")
            .field("guards", &self.guard_count())
            .field("config", &self.config)
            .field("router", &self.router.is_some())
            .finish_non_exhaustive()
    }
}
