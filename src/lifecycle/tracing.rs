//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered
//! by `RUST_LOG`. Module paths are hidden (`with_target(false)`); log lines
//! carry structured fields instead (`order_id`, `generation`, `button`).
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle, confirmed updates, adds and failures
//! RUST_LOG=info cargo run
//!
//! # Every event, including stale completions and timer resets
//! RUST_LOG=debug cargo run
//!
//! # Only the synchronizer
//! RUST_LOG=cart_sync::sync=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - **Synchronizer lifecycle**: start (row and product counts) and shutdown
//!   (final stats).
//! - **Quantity steps**: every change at `debug`, confirmed updates at `info`,
//!   stale completions at `debug`, failures and rollbacks at `warn`.
//! - **Add to cart**: dispatch and success at `info`, ignored clicks at
//!   `debug`, failures at `warn`.
//! - **Transport**: one span per HTTP request, with the response status.
//!
//! A step that is confirmed after a newer one was issued looks like this with
//! `RUST_LOG=debug`:
//!
//! ```text
//! DEBUG Quantity changed order_id=1 change=Increment quantity=2 generation=1
//! DEBUG Quantity changed order_id=1 change=Increment quantity=3 generation=2
//! INFO Update confirmed order_id=1 action=increase generation=2 grand_total=76.5
//! DEBUG Discarded stale update order_id=1 action=increase generation=1 current=2
//! ```

/// Installs the global subscriber. Later calls are no-ops.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
