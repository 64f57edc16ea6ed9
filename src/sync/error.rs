use crate::feedback::ButtonId;
use crate::model::OrderId;
use crate::transport::TransportError;
use thiserror::Error;

/// Errors returned by [`CartClient`](super::CartClient) calls.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    #[error("Cart synchronizer closed")]
    ActorClosed,

    #[error("Cart synchronizer dropped response channel")]
    ActorDropped,

    #[error("No cart row with order id {0}")]
    UnknownRow(OrderId),

    #[error("No add-to-cart button {0}")]
    UnknownButton(ButtonId),

    #[error("Add-to-cart form of {0} has no quantity control")]
    NoQuantityControl(ButtonId),

    #[error("Synchronizer task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
