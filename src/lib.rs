//! # Cart Sync
//!
//! > **Quantity and total synchronization for a storefront cart page.**
//!
//! This crate is the client-side cart layer of a small storefront. It steps
//! line-item quantities up and down, keeps every displayed total equal to
//! `Σ price × quantity` over the rows as rendered, sends "update cart" and
//! "add to cart" requests to the server, and drives the button-level feedback
//! around them.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### One owner for the page
//! The page is an in-memory [`CartDocument`](page::CartDocument). Exactly one
//! task, the [`CartSynchronizer`](sync::CartSynchronizer), owns it and handles
//! events one at a time. Everyone else talks to it through a
//! [`CartClient`](sync::CartClient) and sees it through snapshots.
//!
//! ### The document is the source of truth
//! Totals are recomputed from the rendered quantities, never from server
//! responses. The server is told about each step, but its answers only decide
//! whether a step stands or is rolled back.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Optimistic steps, generation-checked completions
//! A step click changes the quantity and totals immediately, then sends one
//! request. Requests may overlap and settle in any order. Per-row generation
//! counters tell a current completion from a stale one. Failures raise an
//! alert and roll back their own step unless a later manual edit replaced it.
//!
//! ### 2. Type-safe error handling
//! Each layer has its own `thiserror` enum: [`TransportError`](transport::TransportError),
//! [`SyncError`](sync::SyncError), [`ConfigError`](config::ConfigError).
//! Malformed numbers on the page are never errors: prices default to 0 and
//! quantities to 1.
//!
//! ### 3. Observability
//! `tracing` everywhere with structured fields. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`])
//! Line items, tolerant parsing and the pure totals computation.
//!
//! ### 2. The Widgets ([`quantity`], [`feedback`])
//! - [`QuantityControl`](quantity::QuantityControl): the clamped per-row stepper.
//! - [`AddToCartButton`](feedback::AddToCartButton): the
//!   `Idle → Submitting → Added → Idle` feedback state machine.
//!
//! ### 3. The Page ([`page`])
//! Rows, forms, badge, toasts and alerts, and how totals are rendered into them.
//!
//! ### 4. The Engine ([`sync`])
//! The synchronizer actor and its client.
//!
//! ### 5. The Server ([`transport`])
//! The [`CartTransport`](transport::CartTransport) trait with an HTTP
//! implementation, an in-process server and test mocks.
//!
//! ### 6. The Orchestrator ([`lifecycle`], [`config`])
//! - [`CartSystem`](lifecycle::CartSystem): start and graceful shutdown.
//! - [`CartConfig`](config::CartConfig): labels, delays and endpoints, from the environment.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Demo against the in-process server
//! RUST_LOG=info cargo run
//!
//! # Demo against a running storefront
//! CART_BASE_URL=http://localhost:5000 RUST_LOG=debug cargo run
//!
//! # Tests
//! cargo test
//! ```

pub mod config;
pub mod feedback;
pub mod lifecycle;
pub mod model;
pub mod page;
pub mod quantity;
pub mod sync;
pub mod transport;
