//! # Cart Configuration
//!
//! Settings a cart instance is built from.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CART_SESSION_KEY_PREFIX=shop                                       │
//! │     CART_NUMBER_FORMAT=disabled                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     path given by the host (e.g. cart.toml)                            │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     prefix "cart", 2 decimals                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # cart.toml
//! item_model_type = "product"
//! session_key_prefix = "cart"
//! instance_name = "cart"
//!
//! [number_format]
//! mode = "fixed"            # fixed | disabled
//! decimals = 2
//! decimal_separator = "."
//! thousands_separator = ""
//! ```
//!
//! This is the one place cart-core touches the file system, and only at
//! startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::number_format::NumberFormat;
use crate::store::SessionKeys;

/// Largest number of decimals accepted in `[number_format]`.
pub const MAX_DECIMALS: u32 = 10;

/// Cart instance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartConfig {
    /// Kind of catalog model items resolve to (e.g. "product").
    /// Informational for the host; the cart only sees the `Catalog` trait.
    #[serde(default = "default_item_model_type")]
    pub item_model_type: String,

    /// Prefix of the two session store keys.
    #[serde(default = "default_session_key_prefix")]
    pub session_key_prefix: String,

    /// Name the host registers this cart instance under.
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default)]
    pub number_format: NumberFormat,
}

fn default_item_model_type() -> String {
    "product".to_string()
}

fn default_session_key_prefix() -> String {
    "cart".to_string()
}

fn default_instance_name() -> String {
    "cart".to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            item_model_type: default_item_model_type(),
            session_key_prefix: default_session_key_prefix(),
            instance_name: default_instance_name(),
            number_format: NumberFormat::default(),
        }
    }
}

impl CartConfig {
    /// Loads configuration: defaults, then the TOML file (if it exists), then
    /// environment overrides, then validation.
    pub fn load(config_path: Option<PathBuf>) -> CoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                info!(?path, "Loading cart config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Like [`CartConfig::load`], but falls back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load cart config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [
            ("item_model_type", &self.item_model_type),
            ("session_key_prefix", &self.session_key_prefix),
            ("instance_name", &self.instance_name),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidConfig(format!("{field} must not be empty")));
            }
        }

        if let Some(decimals) = self.number_format.decimals() {
            if decimals > MAX_DECIMALS {
                return Err(CoreError::InvalidConfig(format!(
                    "number_format.decimals must be at most {MAX_DECIMALS}, got {decimals}"
                )));
            }
        }

        Ok(())
    }

    /// Session store keys derived from the prefix.
    pub fn session_keys(&self) -> SessionKeys {
        SessionKeys::from_prefix(&self.session_key_prefix)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model_type) = lookup("CART_ITEM_MODEL_TYPE") {
            self.item_model_type = model_type;
        }

        if let Some(prefix) = lookup("CART_SESSION_KEY_PREFIX") {
            debug!(prefix = %prefix, "Overriding session key prefix from environment");
            self.session_key_prefix = prefix;
        }

        if let Some(name) = lookup("CART_INSTANCE_NAME") {
            self.instance_name = name;
        }

        if let Some(mode) = lookup("CART_NUMBER_FORMAT") {
            match mode.to_lowercase().as_str() {
                "disabled" | "off" => self.number_format = NumberFormat::Disabled,
                "fixed" => {
                    if self.number_format.is_disabled() {
                        self.number_format = NumberFormat::default();
                    }
                }
                _ => warn!(mode = %mode, "Unknown number format mode in environment"),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CartConfig::default();
        assert_eq!(config.session_key_prefix, "cart");
        assert_eq!(config.instance_name, "cart");
        assert_eq!(config.number_format, NumberFormat::fixed(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: CartConfig = toml::from_str(
            r#"
            session_key_prefix = "shop"

            [number_format]
            mode = "disabled"
            "#,
        )
        .unwrap();

        assert_eq!(config.session_key_prefix, "shop");
        assert_eq!(config.item_model_type, "product");
        assert!(config.number_format.is_disabled());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CartConfig::default();
        config.apply_overrides(overrides(&[
            ("CART_SESSION_KEY_PREFIX", "shop42"),
            ("CART_NUMBER_FORMAT", "disabled"),
        ]));

        assert_eq!(config.session_key_prefix, "shop42");
        assert_eq!(config.number_format, NumberFormat::Disabled);

        config.apply_overrides(overrides(&[("CART_NUMBER_FORMAT", "fixed")]));
        assert_eq!(config.number_format, NumberFormat::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = CartConfig::default();
        config.session_key_prefix = "  ".to_string();
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));

        let mut config = CartConfig::default();
        config.number_format = NumberFormat::fixed(11);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_keys() {
        let config = CartConfig::default();
        let keys = config.session_keys();
        assert_eq!(keys.items, "cart_cart_items");
        assert_eq!(keys.conditions, "cart_cart_conditions");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("cart-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "instance_name = \"checkout\"\n").unwrap();

        let config = CartConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.instance_name, "checkout");
    }

    #[test]
    fn test_load_or_default_on_invalid_file() {
        let path = std::env::temp_dir().join(format!("cart-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "instance_name = [").unwrap();

        let config = CartConfig::load_or_default(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.instance_name, default_instance_name());
    }
}
