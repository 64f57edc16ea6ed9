//! # Cart Synchronization
//!
//! The core of the crate: a [`CartSynchronizer`] actor owning the cart
//! document, and the [`CartClient`] handle used to drive it.
//!
//! ```ignore
//! let (actor, client) = CartSynchronizer::new(document, transport, config);
//! tokio::spawn(actor.run());
//!
//! client.increment(&OrderId::from("1")).await?;
//! client.wait_settled().await?;
//! let snapshot = client.snapshot().await?;
//! ```

pub mod actor;
pub mod client;
pub mod error;
mod message;
pub mod pending;

pub use actor::CartSynchronizer;
pub use client::{CartClient, CartSnapshot};
pub use error::SyncError;
pub use message::Response;
pub use pending::{RequestLedger, Rollback, SyncStats};
