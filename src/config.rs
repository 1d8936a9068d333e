//! Runtime configuration for the interception adapters.
//!
//! Compile-time selection happens through Cargo features (`history`, `links`,
//! `unload`); [`InterceptConfig`] switches compiled adapters on or off per
//! provider and carries the DOM conventions the adapters rely on.
//!
//! # Example
//!
//! ```
//! use navigation_guard::InterceptConfig;
//!
//! let config = InterceptConfig::new()
//!     .intercept_unload(false)
//!     .replace_attribute("data-nav-replace");
//! assert!(!config.unload);
//! assert_eq!(config.replace_attribute, "data-nav-replace");
//! ```

/// Default anchor attribute marking a link as replacing the current entry.
pub const DEFAULT_REPLACE_ATTRIBUTE: &str = "data-replace";

/// Default anchor attribute set while a click on it is being evaluated.
pub const DEFAULT_PROCESSING_ATTRIBUTE: &str = "data-guard-processing";

/// Default key under which history entries carry their position.
pub const DEFAULT_HISTORY_STATE_KEY: &str = "__navigationGuardIndex";

/// Which sources a provider intercepts and how it talks to the DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptConfig {
    /// Guard browser back/forward.
    pub history: bool,
    /// Guard in-app anchor clicks.
    pub links: bool,
    /// Offer the native unload dialog.
    pub unload: bool,
    /// Anchor attribute that turns a link click into a `replace`.
    pub replace_attribute: String,
    /// Anchor attribute used as the per-link "processing" marker.
    pub processing_attribute: String,
    /// Key stamped into `history.state` to recover entry positions.
    pub history_state_key: String,
    /// Value handed to `beforeunload`'s `returnValue`. Browsers show their own
    /// wording regardless; some still require a non-empty value.
    pub unload_message: Option<String>,
}

impl InterceptConfig {
    /// Intercept every source with the default DOM conventions.
    pub fn new() -> Self {
        Self {
            history: true,
            links: true,
            unload: true,
            replace_attribute: DEFAULT_REPLACE_ATTRIBUTE.to_string(),
            processing_attribute: DEFAULT_PROCESSING_ATTRIBUTE.to_string(),
            history_state_key: DEFAULT_HISTORY_STATE_KEY.to_string(),
            unload_message: None,
        }
    }

    /// Enable or disable the history-traversal adapter.
    #[must_use]
    pub fn intercept_history(mut self, enabled: bool) -> Self {
        self.history = enabled;
        self
    }

    /// Enable or disable the link-click adapter.
    #[must_use]
    pub fn intercept_links(mut self, enabled: bool) -> Self {
        self.links = enabled;
        self
    }

    /// Enable or disable the unload adapter.
    #[must_use]
    pub fn intercept_unload(mut self, enabled: bool) -> Self {
        self.unload = enabled;
        self
    }

    /// Use a different replace marker attribute.
    #[must_use]
    pub fn replace_attribute(mut self, name: impl Into<String>) -> Self {
        self.replace_attribute = name.into();
        self
    }

    /// Use a different processing marker attribute.
    #[must_use]
    pub fn processing_attribute(mut self, name: impl Into<String>) -> Self {
        self.processing_attribute = name.into();
        self
    }

    /// Use a different history-state key.
    #[must_use]
    pub fn history_state_key(mut self, key: impl Into<String>) -> Self {
        self.history_state_key = key.into();
        self
    }

    /// Set the `beforeunload` return value.
    #[must_use]
    pub fn unload_message(mut self, message: impl Into<String>) -> Self {
        self.unload_message = Some(message.into());
        self
    }
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self::new()
    }
}
