//! The in-memory cart page: rows, widgets and notifications.

pub mod document;

pub use document::*;
