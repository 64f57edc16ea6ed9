use super::{CartSnapshot, SyncError};
use crate::feedback::{ButtonId, ClickOutcome};
use crate::model::{CartTotals, OrderId};
use crate::quantity::{QuantityChange, StepOutcome};
use crate::transport::{CartAction, TransportError};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the synchronizer.
pub type Response<T> = oneshot::Sender<Result<T, SyncError>>;

/// Events processed by the synchronizer loop, one at a time.
///
/// The first group comes from [`CartClient`](super::CartClient). The second
/// group is posted back by the synchronizer's own request and timer tasks.
#[derive(Debug)]
pub(crate) enum CartEvent {
    Quantity {
        order_id: OrderId,
        change: QuantityChange,
        respond_to: Response<StepOutcome>,
    },
    ProductQuantity {
        button_id: ButtonId,
        change: QuantityChange,
        respond_to: Response<StepOutcome>,
    },
    AddToCart {
        button_id: ButtonId,
        respond_to: Response<ClickOutcome>,
    },
    Recompute {
        respond_to: Response<CartTotals>,
    },
    ReconcileCount {
        count: u32,
        respond_to: Response<bool>,
    },
    RefreshCount {
        respond_to: Response<u32>,
    },
    Snapshot {
        respond_to: Response<CartSnapshot>,
    },
    WaitSettled {
        respond_to: Response<()>,
    },

    UpdateSettled {
        order_id: OrderId,
        action: CartAction,
        generation: u64,
        applied: StepOutcome,
        result: Result<(), TransportError>,
    },
    AddSettled {
        button_id: ButtonId,
        result: Result<(), TransportError>,
    },
    CountFetched {
        result: Result<u32, TransportError>,
        respond_to: Response<u32>,
    },
    ResetButton {
        button_id: ButtonId,
    },
    DismissToast {
        id: u64,
    },
}
