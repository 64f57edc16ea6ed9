//! Startup, shutdown and logging setup.

pub mod cart_system;
pub mod tracing;

pub use cart_system::CartSystem;
