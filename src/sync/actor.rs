//! # Cart Synchronizer
//!
//! The actor that owns the [`CartDocument`] and keeps its totals, quantities
//! and feedback widgets consistent with the requests sent to the server.
//!
//! ## Concurrency Model
//!
//! The document has exactly one owner: this actor's task. Every user action,
//! every request completion and every timer arrives as a [`CartEvent`] and is
//! handled to completion before the next one, so no locks are needed.
//!
//! Server round trips never block the loop. Each one runs in its own task and
//! posts its completion back through a weak handle to the event channel. Once
//! every [`CartClient`] is gone the channel closes and the loop exits, even if
//! timers or requests are still outstanding.
//!
//! ## Stale Completions
//!
//! Step requests may settle in any order. Each row carries a generation
//! counter, advanced by every step and every manual edit. A success whose
//! generation is no longer current is discarded. A failure undoes its own step
//! unless a manual edit has replaced the quantity since, or a later decrease
//! that the floor blocked on screen takes over its unit. See [`RequestLedger`].

use super::message::{CartEvent, Response};
use super::pending::{RequestLedger, Rollback, SyncStats};
use super::{CartClient, CartSnapshot, SyncError};
use crate::config::CartConfig;
use crate::feedback::{ButtonId, ClickOutcome};
use crate::model::{CartTotals, OrderId};
use crate::page::{CartDocument, Toast};
use crate::quantity::{QuantityChange, StepOutcome};
use crate::transport::{CartAction, CartTransport, TransportError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

pub struct CartSynchronizer {
    receiver: mpsc::Receiver<CartEvent>,
    loopback: mpsc::WeakSender<CartEvent>,
    document: CartDocument,
    transport: Arc<dyn CartTransport>,
    config: CartConfig,
    ledger: RequestLedger,
    stats: SyncStats,
    in_flight: usize,
    waiters: Vec<Response<()>>,
    next_toast: u64,
    published: watch::Sender<CartDocument>,
}

impl CartSynchronizer {
    pub fn new(
        document: CartDocument,
        transport: Arc<dyn CartTransport>,
        config: CartConfig,
    ) -> (Self, CartClient) {
        let (sender, receiver) = mpsc::channel(config.event_buffer.max(1));
        let (published, documents) = watch::channel(document.clone());
        let actor = Self {
            receiver,
            loopback: sender.downgrade(),
            document,
            transport,
            config,
            ledger: RequestLedger::default(),
            stats: SyncStats::default(),
            in_flight: 0,
            waiters: Vec::new(),
            next_toast: 1,
            published,
        };
        (actor, CartClient::new(sender, documents))
    }

    /// Renders the initial totals, then processes events until every client is dropped.
    pub async fn run(mut self) {
        info!(
            rows = self.document.rows.len(),
            products = self.document.products.len(),
            "Cart synchronizer started"
        );
        self.recompute();
        self.publish();

        while let Some(event) = self.receiver.recv().await {
            self.handle(event);
            self.publish();
        }

        info!(in_flight = self.in_flight, stats = ?self.stats, "Cart synchronizer shutdown");
    }

    fn handle(&mut self, event: CartEvent) {
        match event {
            CartEvent::Quantity {
                order_id,
                change,
                respond_to,
            } => {
                let _ = respond_to.send(self.change_row(order_id, change));
            }
            CartEvent::ProductQuantity {
                button_id,
                change,
                respond_to,
            } => {
                let _ = respond_to.send(self.change_product(button_id, change));
            }
            CartEvent::AddToCart {
                button_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.add_to_cart(button_id));
            }
            CartEvent::Recompute { respond_to } => {
                let _ = respond_to.send(Ok(self.recompute()));
            }
            CartEvent::ReconcileCount { count, respond_to } => {
                let shown = self.document.set_cart_count(count);
                debug!(count, shown, "Cart count reconciled");
                let _ = respond_to.send(Ok(shown));
            }
            CartEvent::RefreshCount { respond_to } => {
                let transport = self.transport.clone();
                self.spawn_request(async move {
                    let result = transport.cart_count().await;
                    CartEvent::CountFetched { result, respond_to }
                });
            }
            CartEvent::Snapshot { respond_to } => {
                let _ = respond_to.send(Ok(CartSnapshot {
                    document: self.document.clone(),
                    stats: self.stats,
                    in_flight: self.in_flight,
                }));
            }
            CartEvent::WaitSettled { respond_to } => {
                if self.in_flight == 0 {
                    let _ = respond_to.send(Ok(()));
                } else {
                    self.waiters.push(respond_to);
                }
            }
            CartEvent::UpdateSettled {
                order_id,
                action,
                generation,
                applied,
                result,
            } => {
                self.update_settled(order_id, action, generation, applied, result);
                self.settle_one();
            }
            CartEvent::AddSettled { button_id, result } => {
                self.add_settled(button_id, result);
                self.settle_one();
            }
            CartEvent::CountFetched { result, respond_to } => {
                let response = match result {
                    Ok(count) => {
                        let shown = self.document.set_cart_count(count);
                        info!(count, shown, "Cart count refreshed");
                        Ok(count)
                    }
                    Err(error) => {
                        warn!(%error, "Cart count refresh failed");
                        Err(SyncError::from(error))
                    }
                };
                let _ = respond_to.send(response);
                self.settle_one();
            }
            CartEvent::ResetButton { button_id } => {
                if let Some(product) = self.document.product_mut(&button_id) {
                    if product.button.reset() {
                        debug!(button = %button_id, "Button reset");
                    }
                }
            }
            CartEvent::DismissToast { id } => {
                self.document.toasts.retain(|toast| toast.id != id);
                debug!(toast = id, "Toast dismissed");
            }
        }
    }

    fn change_row(
        &mut self,
        order_id: OrderId,
        change: QuantityChange,
    ) -> Result<StepOutcome, SyncError> {
        let Some(row) = self.document.row_mut(&order_id) else {
            warn!(%order_id, ?change, "Quantity change for unknown row");
            return Err(SyncError::UnknownRow(order_id));
        };
        let applied = row.quantity.apply(&change);
        let action = change.action();
        let generation = match action {
            Some(action) => self.ledger.issue_step(&order_id, action, applied),
            None => self.ledger.issue_edit(&order_id),
        };
        debug!(%order_id, ?change, quantity = applied.value(), generation, "Quantity changed");
        self.recompute();

        if let Some(action) = action {
            self.stats.updates_dispatched += 1;
            let transport = self.transport.clone();
            self.spawn_request(async move {
                let result = transport.update_cart(&order_id, action).await;
                CartEvent::UpdateSettled {
                    order_id,
                    action,
                    generation,
                    applied,
                    result,
                }
            });
        }
        Ok(applied)
    }

    fn update_settled(
        &mut self,
        order_id: OrderId,
        action: CartAction,
        generation: u64,
        applied: StepOutcome,
        result: Result<(), TransportError>,
    ) {
        match result {
            Ok(()) if self.ledger.is_current(&order_id, generation) => {
                self.stats.updates_confirmed += 1;
                let totals = self.recompute();
                info!(%order_id, %action, generation, grand_total = totals.grand_total, "Update confirmed");
            }
            Ok(()) => {
                self.stats.updates_stale += 1;
                debug!(
                    %order_id,
                    %action,
                    generation,
                    current = self.ledger.current(&order_id),
                    "Discarded stale update"
                );
            }
            Err(error) => {
                self.stats.updates_failed += 1;
                let rollback = self.ledger.roll_back(&order_id, generation, action, applied);
                warn!(%order_id, %action, generation, %error, ?rollback, "Update failed");
                if let Some(row) = self.document.row_mut(&order_id) {
                    match rollback {
                        Rollback::Increment => {
                            row.quantity.increment();
                        }
                        Rollback::Decrement => {
                            row.quantity.decrement();
                        }
                        Rollback::Superseded | Rollback::Nothing | Rollback::HandedOver { .. } => {}
                    }
                }
                self.recompute();
                self.document
                    .alerts
                    .push(self.config.update_failed_message.clone());
            }
        }
        self.ledger.settle(&order_id);
    }

    fn change_product(
        &mut self,
        button_id: ButtonId,
        change: QuantityChange,
    ) -> Result<StepOutcome, SyncError> {
        let Some(product) = self.document.product_mut(&button_id) else {
            return Err(SyncError::UnknownButton(button_id));
        };
        let Some(control) = product.form.quantity.as_mut() else {
            return Err(SyncError::NoQuantityControl(button_id));
        };
        let outcome = control.apply(&change);
        debug!(button = %button_id, ?change, quantity = outcome.value(), "Product quantity changed");
        Ok(outcome)
    }

    fn add_to_cart(&mut self, button_id: ButtonId) -> Result<ClickOutcome, SyncError> {
        let Some(product) = self.document.product_mut(&button_id) else {
            warn!(button = %button_id, "Click on unknown button");
            return Err(SyncError::UnknownButton(button_id));
        };
        if product.button.click(&self.config.submitting_label) == ClickOutcome::Ignored {
            self.stats.duplicate_clicks += 1;
            debug!(button = %button_id, state = ?product.button.state(), "Click ignored");
            return Ok(ClickOutcome::Ignored);
        }

        let submission = product.form.submission();
        info!(button = %button_id, action = %submission.action, "Adding to cart");
        self.stats.adds_dispatched += 1;
        let transport = self.transport.clone();
        self.spawn_request(async move {
            let result = transport.add_to_cart(&submission).await;
            CartEvent::AddSettled { button_id, result }
        });
        Ok(ClickOutcome::Accepted)
    }

    fn add_settled(&mut self, button_id: ButtonId, result: Result<(), TransportError>) {
        let Some(product) = self.document.product_mut(&button_id) else {
            warn!(button = %button_id, "Add settled for unknown button");
            return;
        };
        match result {
            Ok(()) => {
                product.button.succeed(&self.config.added_label);
                self.stats.adds_confirmed += 1;
                let count = self.document.bump_cart_count();
                let toast = self.show_toast(self.config.added_message.clone());
                self.schedule(
                    self.config.reset_delay(),
                    CartEvent::ResetButton {
                        button_id: button_id.clone(),
                    },
                );
                info!(button = %button_id, ?count, toast, "Added to cart");
            }
            Err(error) => {
                product.button.fail();
                self.stats.adds_failed += 1;
                self.document
                    .alerts
                    .push(self.config.add_failed_message.clone());
                warn!(button = %button_id, %error, "Add to cart failed");
            }
        }
    }

    fn show_toast(&mut self, message: String) -> u64 {
        let id = self.next_toast;
        self.next_toast += 1;
        self.document.toasts.push(Toast { id, message });
        self.schedule(self.config.toast_ttl(), CartEvent::DismissToast { id });
        id
    }

    fn recompute(&mut self) -> CartTotals {
        let totals = CartTotals::compute(&self.document.line_items());
        self.document.render_totals(&totals, &self.config.currency);
        totals
    }

    fn publish(&self) {
        self.published.send_replace(self.document.clone());
    }

    /// Runs a server round trip in its own task and feeds its completion back in.
    fn spawn_request<F>(&mut self, request: F)
    where
        F: Future<Output = CartEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let event = request.await;
            deliver(loopback, event).await;
        });
    }

    fn schedule(&self, delay: Duration, event: CartEvent) {
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            deliver(loopback, event).await;
        });
    }

    fn settle_one(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            for waiter in self.waiters.drain(..) {
                let _ = waiter.send(Ok(()));
            }
        }
    }
}

async fn deliver(loopback: mpsc::WeakSender<CartEvent>, event: CartEvent) {
    match loopback.upgrade() {
        Some(sender) => {
            if sender.send(event).await.is_err() {
                debug!("Synchronizer stopped, event dropped");
            }
        }
        None => debug!("Synchronizer stopped, event dropped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::CartRow;
    use crate::transport::mock::MockTransport;

    fn start(document: CartDocument, mock: &MockTransport) -> CartClient {
        let (actor, client) =
            CartSynchronizer::new(document, Arc::new(mock.transport()), CartConfig::default());
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test]
    async fn test_totals_rendered_on_load() {
        let mock = MockTransport::new();
        let document = CartDocument::new()
            .with_row(CartRow::new("1", Some("25.50"), "2"))
            .with_row(CartRow::new("2", Some("oops"), "x"))
            .with_grand_total();
        let client = start(document, &mock);

        let snapshot = client.snapshot().await.unwrap();
        assert_eq!(snapshot.document.rows[0].total_text, "₹51.00");
        assert_eq!(snapshot.document.rows[1].total_text, "₹0.00");
        assert_eq!(snapshot.document.rows[1].quantity.input().value, "x");
        assert_eq!(snapshot.document.grand_total.as_deref(), Some("₹51.00"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_unknown_targets_are_rejected() {
        let mock = MockTransport::new();
        let client = start(CartDocument::new(), &mock);

        let missing = OrderId::from("404");
        assert_eq!(
            client.increment(&missing).await,
            Err(SyncError::UnknownRow(missing))
        );
        let button = ButtonId::from("nope");
        assert_eq!(
            client.add_to_cart(&button).await,
            Err(SyncError::UnknownButton(button))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_manual_edit_sends_nothing() {
        let mock = MockTransport::new();
        let client = start(
            CartDocument::new().with_row(CartRow::new("1", Some("10"), "2")),
            &mock,
        );
        let row = OrderId::from("1");

        let outcome = client.edit_quantity(&row, "7").await.unwrap();
        assert_eq!(outcome, StepOutcome::Changed { from: 2, to: 7 });
        client.wait_settled().await.unwrap();

        let snapshot = client.snapshot().await.unwrap();
        assert_eq!(snapshot.document.rows[0].total_text, "₹70.00");
        assert_eq!(snapshot.stats.updates_dispatched, 0);
        mock.verify();
    }

    #[tokio::test]
    async fn test_closed_after_actor_stops() {
        let mock = MockTransport::new();
        let (actor, client) =
            CartSynchronizer::new(CartDocument::new(), Arc::new(mock.transport()), CartConfig::default());
        drop(actor);
        assert_eq!(client.recompute_totals().await, Err(SyncError::ActorClosed));
    }
}
