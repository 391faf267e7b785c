//! Engine configuration.
//!
//! Loaded from TOML; every key is optional. Read-only once the engine is
//! built.

use serde::Deserialize;

use pushnav_types::error::{NavError, Result};

use crate::cache::CachePolicy;

/// How raw responses are decoded before the body is extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// The raw text is the body.
    #[default]
    Text,
    /// The raw text is JSON.
    Json,
}

/// Navigation engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Region filled when a state names no target.
    pub default_target: Option<String>,
    /// Action run when a state names no action.
    pub default_action: Option<String>,
    pub response_format: ResponseFormat,
    /// Key holding the body inside a decoded JSON object.
    pub response_body_key: Option<String>,
    /// `0` disables caching, negative is unlimited, positive bounds the
    /// entry count.
    pub cache_capacity: i64,
    /// Class marking links the engine intercepts.
    pub link_class: String,
    /// Class marking links that open in a new browsing context.
    pub outbound_class: String,
    /// Link class: instate without pushing history.
    pub no_history_class: String,
    /// Link class: do not cache the response.
    pub no_cache_class: String,
    /// Link attribute naming the target region.
    pub target_attribute: String,
    /// Link attribute naming the action.
    pub action_attribute: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            default_target: None,
            default_action: None,
            response_format: ResponseFormat::Text,
            response_body_key: None,
            cache_capacity: 32,
            link_class: "pushnav".to_string(),
            outbound_class: "pushnav-external".to_string(),
            no_history_class: "pushnav-no-history".to_string(),
            no_cache_class: "pushnav-no-cache".to_string(),
            target_attribute: "data-target".to_string(),
            action_attribute: "data-action".to_string(),
        }
    }
}

impl NavConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| NavError::Config(format!("pushnav config: {e}")))
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::from(self.cache_capacity)
    }
}
