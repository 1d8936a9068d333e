//! # navigation-guard
//!
//! Navigation guards for single-page applications. A guard is a component
//! that may veto leaving the current view, typically to protect unsaved
//! input. Guards register with a [`NavigationGuardProvider`]; the provider's
//! adapters consult them whenever the application is about to navigate:
//!
//! | Source                         | Adapter            | Can cancel? |
//! |--------------------------------|--------------------|-------------|
//! | `router.push/replace/refresh`  | [`GuardedRouter`]  | yes |
//! | browser back / forward         | [`HistoryAdapter`] | simulated (traverse back, re-apply on allow) |
//! | clicks on in-app links         | [`LinkAdapter`]    | yes, before the browser acts |
//! | tab close / reload             | [`UnloadAdapter`]  | browser's own dialog only |
//!
//! Each attempt is evaluated against a snapshot of the registered guards:
//! the enabled ones are asked in registration order and the first refusal
//! (or failure) wins. A guard without a `confirm` callback waits for the UI,
//! which reads [`NavigationGuard::active`] and calls `accept`/`reject`.
//!
//! # Quick start
//!
//! ```
//! use navigation_guard::{GuardOptions, NavigationGuardProvider, NavigateOptions, Router};
//! use navigation_guard::{MemoryHistory, MemoryRouter};
//! use futures::executor::LocalPool;
//! use std::rc::Rc;
//!
//! let history = MemoryHistory::new("/editor");
//! let router = Rc::new(MemoryRouter::new(history.clone()));
//! let pool = LocalPool::new();
//! let provider = NavigationGuardProvider::builder(Rc::new(pool.spawner()))
//!     .router(router)
//!     .build();
//!
//! let dirty = true;
//! let _guard = provider.scope().use_navigation_guard(
//!     GuardOptions::new()
//!         .enabled(dirty)
//!         .confirm(|_attempt| false.into()),
//! )?;
//!
//! provider.router()?.push("/home", NavigateOptions::default());
//! assert_eq!(history.current_url(), "/editor");
//! # Ok::<(), navigation_guard::GuardError>(())
//! ```
//!
//! # Features
//!
//! | Feature   | Default | Enables |
//! |-----------|---------|---------|
//! | `history` | yes     | [`HistoryAdapter`] |
//! | `links`   | yes     | [`LinkAdapter`] |
//! | `unload`  | yes     | [`UnloadAdapter`] |
//! | `log`     | yes     | logging through `log` |
//! | `tracing` | no      | logging through `tracing` (instead of `log`) |
//! | `web`     | no      | `web-sys` bindings in [`web`] |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod logging;

mod attempt;
mod config;
mod confirm;
mod coordinator;
mod error;
mod executor;
mod protocol;
mod provider;
mod registry;
mod router;

#[cfg(feature = "history")]
mod history;
#[cfg(feature = "history")]
mod memory;
#[cfg(feature = "links")]
mod links;
#[cfg(feature = "unload")]
mod unload;

#[cfg(feature = "web")]
#[cfg_attr(docsrs, doc(cfg(feature = "web")))]
pub mod web;

pub use attempt::{DenyReason, NavigationAttempt, NavigationType, Verdict};
pub use config::{
    InterceptConfig, DEFAULT_HISTORY_STATE_KEY, DEFAULT_PROCESSING_ATTRIBUTE,
    DEFAULT_REPLACE_ATTRIBUTE,
};
pub use confirm::{ConfirmFuture, ConfirmResolver, Confirmation, ConfirmationSlot};
pub use coordinator::{Enabled, GuardOptions, GuardScope, NavigationGuard};
pub use error::{GuardError, GuardResult};
pub use executor::{executor_fn, run_or_spawn, Executor, FnExecutor};
pub use protocol::{evaluate, Evaluation};
pub use provider::{NavigationGuardProvider, ProviderBuilder};
pub use registry::{
    ConfirmFn, EnabledFn, GuardDefinition, GuardEntry, GuardId, GuardRegistry, GuardSnapshot,
    SharedRegistry, WeakRegistry,
};
pub use router::{GuardedRouter, Location, NavigateOptions, Router, RouterCall};

#[cfg(feature = "history")]
#[cfg_attr(docsrs, doc(cfg(feature = "history")))]
pub use history::{
    HistoryAdapter, HistoryBackend, PopStateDisposition, PopStateEvent, WeakHistoryAdapter,
};
#[cfg(feature = "history")]
#[cfg_attr(docsrs, doc(cfg(feature = "history")))]
pub use memory::{MemoryHistory, MemoryRouter};
#[cfg(feature = "links")]
#[cfg_attr(docsrs, doc(cfg(feature = "links")))]
pub use links::{
    is_external_href, AnchorElement, ClickEvent, ClickOutcome, LinkAdapter, Modifiers, SkipReason,
};
#[cfg(feature = "unload")]
#[cfg_attr(docsrs, doc(cfg(feature = "unload")))]
pub use unload::{BeforeUnload, UnloadAdapter, DEFAULT_UNLOAD_MESSAGE};
