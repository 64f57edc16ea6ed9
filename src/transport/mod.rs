//! # Server Transport
//!
//! The only way this crate talks to the storefront server. Three implementations
//! share the [`CartTransport`] trait:
//!
//! - [`HttpTransport`] - the real thing, built on `reqwest`.
//! - [`LocalCartServer`] - an in-process server with the storefront's cart rules,
//!   used by the demo binary and end-to-end tests.
//! - [`mock`] - scripted doubles for unit tests.
//!
//! ## Success Semantics
//!
//! Response bodies are never read for state. Any response that arrives counts as
//! success (including redirects and error statuses). Only a failure to get a
//! response at all is an error.

pub mod http;
pub mod local;
pub mod mock;

pub use http::HttpTransport;
pub use local::{LocalCartServer, ServerOrder};

use crate::model::OrderId;
use async_trait::async_trait;
use std::fmt::Display;
use thiserror::Error;

/// The step sent to `POST /update_cart/{order_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Increase,
    Decrease,
}

impl CartAction {
    /// Wire value of the `action` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartAction::Increase => "increase",
            CartAction::Decrease => "decrease",
        }
    }
}

impl Display for CartAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted add-to-cart form: its action URL and every field it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Errors raised while reaching the server.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// A URL could not be built from the configured base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A response arrived but could not be interpreted where a value was needed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The transport has no way to serve this request.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The in-process server or mock has gone away.
    #[error("Server closed")]
    ServerClosed,
}

/// Server endpoints the cart layer depends on.
#[async_trait]
pub trait CartTransport: Send + Sync + 'static {
    /// `POST /update_cart/{order_id}` with `action=increase|decrease`.
    async fn update_cart(&self, order_id: &OrderId, action: CartAction)
        -> Result<(), TransportError>;

    /// `POST {form.action}` with the form's fields.
    async fn add_to_cart(&self, form: &FormSubmission) -> Result<(), TransportError>;

    /// Authoritative cart item count, used to reconcile the optimistic badge.
    async fn cart_count(&self) -> Result<u32, TransportError>;
}
