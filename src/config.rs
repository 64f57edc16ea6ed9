//! # Configuration
//!
//! Runtime settings for the cart layer. Defaults reproduce the storefront's
//! behaviour (rupee prices, 1.2 s button reset, 1.5 s toasts), and every field
//! can be overridden from the environment:
//!
//! | Variable                  | Field                |
//! |---------------------------|----------------------|
//! | `CART_BASE_URL`           | `base_url`           |
//! | `CART_CURRENCY`           | `currency`           |
//! | `CART_RESET_DELAY_MS`     | `reset_delay_ms`     |
//! | `CART_TOAST_TTL_MS`       | `toast_ttl_ms`       |
//! | `CART_REQUEST_TIMEOUT_MS` | `request_timeout_ms` |
//! | `CART_COUNT_PATH`         | `cart_count_path`    |
//! | `CART_EVENT_BUFFER`       | `event_buffer`       |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Server origin for [`HttpTransport`](crate::transport::HttpTransport).
    /// `None` means no remote server is configured.
    pub base_url: Option<String>,
    pub currency: String,
    pub submitting_label: String,
    pub added_label: String,
    pub added_message: String,
    pub add_failed_message: String,
    pub update_failed_message: String,
    pub reset_delay_ms: u64,
    pub toast_ttl_ms: u64,
    /// No timeout unless set.
    pub request_timeout_ms: Option<u64>,
    /// Path answering with the plain-text cart count, if the server has one.
    pub cart_count_path: Option<String>,
    pub event_buffer: usize,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            currency: "₹".to_string(),
            submitting_label: "Adding...".to_string(),
            added_label: "✓ Added".to_string(),
            added_message: "🛒 Added to cart successfully".to_string(),
            add_failed_message: "Failed to add product!".to_string(),
            update_failed_message: "Failed to update cart!".to_string(),
            reset_delay_ms: 1200,
            toast_ttl_ms: 1500,
            request_timeout_ms: None,
            cart_count_path: None,
            event_buffer: 32,
        }
    }
}

impl CartConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            base_url: lookup("CART_BASE_URL").or(defaults.base_url),
            currency: lookup("CART_CURRENCY").unwrap_or(defaults.currency),
            reset_delay_ms: parse_or(&lookup, "CART_RESET_DELAY_MS", defaults.reset_delay_ms)?,
            toast_ttl_ms: parse_or(&lookup, "CART_TOAST_TTL_MS", defaults.toast_ttl_ms)?,
            request_timeout_ms: match lookup("CART_REQUEST_TIMEOUT_MS") {
                Some(raw) => Some(parse_value("CART_REQUEST_TIMEOUT_MS", raw)?),
                None => defaults.request_timeout_ms,
            },
            cart_count_path: lookup("CART_COUNT_PATH").or(defaults.cart_count_path),
            event_buffer: parse_or(&lookup, "CART_EVENT_BUFFER", defaults.event_buffer)?,
            ..defaults
        })
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => parse_value(key, raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}
