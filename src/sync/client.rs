use super::message::{CartEvent, Response};
use super::{SyncError, SyncStats};
use crate::feedback::{ButtonId, ClickOutcome};
use crate::model::{CartTotals, OrderId};
use crate::page::CartDocument;
use crate::quantity::{QuantityChange, StepOutcome};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

/// Point-in-time copy of the synchronizer's state.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub document: CartDocument,
    pub stats: SyncStats,
    /// Requests dispatched but not yet settled.
    pub in_flight: usize,
}

/// Handle for driving a running [`CartSynchronizer`](super::CartSynchronizer).
///
/// Every method is one event on the synchronizer's queue. Methods return once
/// the event has been handled locally. Server requests they trigger keep
/// running in the background; use [`wait_settled`](Self::wait_settled) to wait
/// for them.
#[derive(Clone)]
pub struct CartClient {
    sender: mpsc::Sender<CartEvent>,
    documents: watch::Receiver<CartDocument>,
}

impl CartClient {
    pub(crate) fn new(
        sender: mpsc::Sender<CartEvent>,
        documents: watch::Receiver<CartDocument>,
    ) -> Self {
        Self { sender, documents }
    }

    /// Clicks the row's increment button and sends `action=increase`.
    #[instrument(skip(self))]
    pub async fn increment(&self, order_id: &OrderId) -> Result<StepOutcome, SyncError> {
        self.change_quantity(order_id, QuantityChange::Increment)
            .await
    }

    /// Clicks the row's decrement button and sends `action=decrease`.
    #[instrument(skip(self))]
    pub async fn decrement(&self, order_id: &OrderId) -> Result<StepOutcome, SyncError> {
        self.change_quantity(order_id, QuantityChange::Decrement)
            .await
    }

    /// Types `text` into the row's quantity input. Nothing is sent.
    #[instrument(skip(self))]
    pub async fn edit_quantity(
        &self,
        order_id: &OrderId,
        text: &str,
    ) -> Result<StepOutcome, SyncError> {
        self.change_quantity(order_id, QuantityChange::Input(text.to_string()))
            .await
    }

    /// Sets the row's quantity programmatically. Nothing is sent.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        order_id: &OrderId,
        quantity: u32,
    ) -> Result<StepOutcome, SyncError> {
        self.change_quantity(order_id, QuantityChange::Set(quantity))
            .await
    }

    pub async fn change_quantity(
        &self,
        order_id: &OrderId,
        change: QuantityChange,
    ) -> Result<StepOutcome, SyncError> {
        let order_id = order_id.clone();
        self.request(|respond_to| CartEvent::Quantity {
            order_id,
            change,
            respond_to,
        })
        .await
    }

    /// Changes the quantity picker inside a product's add-to-cart form.
    #[instrument(skip(self))]
    pub async fn change_product_quantity(
        &self,
        button_id: &ButtonId,
        change: QuantityChange,
    ) -> Result<StepOutcome, SyncError> {
        let button_id = button_id.clone();
        self.request(|respond_to| CartEvent::ProductQuantity {
            button_id,
            change,
            respond_to,
        })
        .await
    }

    /// Clicks an add-to-cart button.
    ///
    /// Returns [`ClickOutcome::Ignored`] while the button is disabled.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, button_id: &ButtonId) -> Result<ClickOutcome, SyncError> {
        let button_id = button_id.clone();
        let outcome = self
            .request(|respond_to| CartEvent::AddToCart {
                button_id,
                respond_to,
            })
            .await?;
        debug!(?outcome, "add_to_cart handled");
        Ok(outcome)
    }

    /// Recomputes and renders every total from the rows as they are now.
    pub async fn recompute_totals(&self) -> Result<CartTotals, SyncError> {
        self.request(|respond_to| CartEvent::Recompute { respond_to })
            .await
    }

    /// Overwrites the cart-count badge. Returns false if the page has no badge.
    #[instrument(skip(self))]
    pub async fn reconcile_cart_count(&self, count: u32) -> Result<bool, SyncError> {
        self.request(|respond_to| CartEvent::ReconcileCount { count, respond_to })
            .await
    }

    /// Fetches the authoritative count from the server and shows it in the badge.
    #[instrument(skip(self))]
    pub async fn refresh_cart_count(&self) -> Result<u32, SyncError> {
        self.request(|respond_to| CartEvent::RefreshCount { respond_to })
            .await
    }

    pub async fn snapshot(&self) -> Result<CartSnapshot, SyncError> {
        self.request(|respond_to| CartEvent::Snapshot { respond_to })
            .await
    }

    /// Resolves once no server request is in flight.
    pub async fn wait_settled(&self) -> Result<(), SyncError> {
        self.request(|respond_to| CartEvent::WaitSettled { respond_to })
            .await
    }

    /// Watches the document. A new value is published after every event.
    pub fn subscribe(&self) -> watch::Receiver<CartDocument> {
        self.documents.clone()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> CartEvent,
    ) -> Result<T, SyncError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| SyncError::ActorClosed)?;
        response.await.map_err(|_| SyncError::ActorDropped)?
    }
}
