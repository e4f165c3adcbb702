//! Session configuration
//!
//! Configuration is a plain value handed to the session at construction.
//! Propagating the API key to other collaborators is an explicit step
//! performed by whoever composes them, see [`apply_api_key`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::style::{StyleId, DEFAULT_ASSET_ROOT};

/// Locale used when nothing can be read from the environment
pub const FALLBACK_LOCALE: &str = "en-US";

/// A non-empty API key
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank keys
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keys end up in logs through Debug, so only a prefix is shown.
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "ApiKey({}…)", prefix)
    }
}

/// A BCP-47 or POSIX locale identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale(String);

impl Locale {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, falling back to `en-US`
    pub fn system() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(Locale::new)
            .find(|locale| locale.language_code().is_some())
            .unwrap_or_else(|| Locale::new(FALLBACK_LOCALE))
    }

    pub fn identifier(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, lower-cased.
    ///
    /// Resolves only when the subtag is 2 or 3 ASCII letters, so `C` and
    /// `POSIX` have no language code.
    pub fn language_code(&self) -> Option<String> {
        let primary = self.0.split(['-', '_', '.', '@']).next()?;
        let valid = (2..=3).contains(&primary.len())
            && primary.chars().all(|c| c.is_ascii_alphabetic());
        valid.then(|| primary.to_ascii_lowercase())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration for a map session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// API key sent with every scene load
    #[serde(default)]
    pub api_key: Option<String>,

    /// Locale used for style loads without an explicit one (system locale when unset)
    #[serde(default)]
    pub locale: Option<String>,

    /// Directory the house-style assets are installed under
    #[serde(default = "default_asset_root")]
    pub asset_root: String,

    /// Style used when a session is rebuilt before any style was loaded
    #[serde(default = "default_style")]
    pub default_style: StyleId,
}

fn default_asset_root() -> String {
    DEFAULT_ASSET_ROOT.to_string()
}

fn default_style() -> StyleId {
    StyleId::BubbleWrap
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            locale: None,
            asset_root: default_asset_root(),
            default_style: default_style(),
        }
    }
}

impl SessionConfig {
    /// The configured key, if it is non-blank
    pub fn api_key(&self) -> Option<ApiKey> {
        self.api_key.clone().and_then(ApiKey::new)
    }

    /// The configured locale, or the system locale
    pub fn locale(&self) -> Locale {
        self.locale
            .as_ref()
            .map(|l| Locale::new(l.clone()))
            .unwrap_or_else(Locale::system)
    }
}

/// A collaborator that needs the API key (search, routing, ...)
pub trait ApiKeyConsumer {
    fn apply_api_key(&mut self, key: &ApiKey);
}

/// Hand `key` to every collaborator in `consumers`
pub fn apply_api_key(key: &ApiKey, consumers: &mut [&mut dyn ApiKeyConsumer]) {
    for consumer in consumers.iter_mut() {
        consumer.apply_api_key(key);
    }
    tracing::debug!("Applied API key to {} collaborators", consumers.len());
}
