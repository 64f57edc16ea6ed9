//! # In-Process Cart Server
//!
//! A stand-in for the storefront's server-side cart. It applies the same rules
//! the real endpoints do:
//!
//! - `update_cart`: `increase` adds one; `decrease` subtracts one only while the
//!   quantity is above 1.
//! - `add_to_cart/{product_id}`: adds the form's `quantity` (default 1) to the
//!   existing order for that product, or opens a new order.
//! - Unknown orders and malformed forms still get a response, and nothing changes.
//!
//! The server runs as an actor: a single task owns the orders and handles
//! requests one at a time, which is exactly the per-order serialization the
//! client side relies on.

use super::{CartAction, CartTransport, FormSubmission, TransportError};
use crate::model::OrderId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// One order as the server stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOrder {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug)]
enum ServerRequest {
    Update {
        order_id: OrderId,
        action: CartAction,
        respond_to: oneshot::Sender<()>,
    },
    Add {
        form: FormSubmission,
        respond_to: oneshot::Sender<()>,
    },
    Count {
        respond_to: oneshot::Sender<u32>,
    },
    Orders {
        respond_to: oneshot::Sender<BTreeMap<OrderId, ServerOrder>>,
    },
}

struct ServerState {
    receiver: mpsc::Receiver<ServerRequest>,
    orders: BTreeMap<OrderId, ServerOrder>,
    next_id: u32,
}

/// Handle to a running in-process server. Cheap to clone.
#[derive(Clone)]
pub struct LocalCartServer {
    sender: mpsc::Sender<ServerRequest>,
}

impl LocalCartServer {
    /// Starts the server with the given orders and returns its handle and task.
    ///
    /// The task ends once every handle has been dropped.
    pub fn spawn(
        orders: impl IntoIterator<Item = (OrderId, ServerOrder)>,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(32);
        let orders: BTreeMap<OrderId, ServerOrder> = orders.into_iter().collect();
        let next_id = orders
            .keys()
            .filter_map(|id| id.as_str().parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let state = ServerState {
            receiver,
            orders,
            next_id,
        };
        (Self { sender }, tokio::spawn(state.run()))
    }

    /// Current server-side orders.
    pub async fn orders(&self) -> Result<BTreeMap<OrderId, ServerOrder>, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.send(ServerRequest::Orders { respond_to }).await?;
        response.await.map_err(|_| TransportError::ServerClosed)
    }

    async fn send(&self, request: ServerRequest) -> Result<(), TransportError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| TransportError::ServerClosed)
    }
}

#[async_trait]
impl CartTransport for LocalCartServer {
    async fn update_cart(
        &self,
        order_id: &OrderId,
        action: CartAction,
    ) -> Result<(), TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.send(ServerRequest::Update {
            order_id: order_id.clone(),
            action,
            respond_to,
        })
        .await?;
        response.await.map_err(|_| TransportError::ServerClosed)
    }

    async fn add_to_cart(&self, form: &FormSubmission) -> Result<(), TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.send(ServerRequest::Add {
            form: form.clone(),
            respond_to,
        })
        .await?;
        response.await.map_err(|_| TransportError::ServerClosed)
    }

    async fn cart_count(&self) -> Result<u32, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.send(ServerRequest::Count { respond_to }).await?;
        response.await.map_err(|_| TransportError::ServerClosed)
    }
}

impl ServerState {
    async fn run(mut self) {
        info!(orders = self.orders.len(), "Local cart server started");

        while let Some(request) = self.receiver.recv().await {
            match request {
                ServerRequest::Update {
                    order_id,
                    action,
                    respond_to,
                } => {
                    self.update(&order_id, action);
                    let _ = respond_to.send(());
                }
                ServerRequest::Add { form, respond_to } => {
                    self.add(&form);
                    let _ = respond_to.send(());
                }
                ServerRequest::Count { respond_to } => {
                    let count = self
                        .orders
                        .values()
                        .fold(0u32, |sum, order| sum.saturating_add(order.quantity));
                    let _ = respond_to.send(count);
                }
                ServerRequest::Orders { respond_to } => {
                    let _ = respond_to.send(self.orders.clone());
                }
            }
        }

        info!(orders = self.orders.len(), "Local cart server shutdown");
    }

    fn update(&mut self, order_id: &OrderId, action: CartAction) {
        let Some(order) = self.orders.get_mut(order_id) else {
            warn!(%order_id, %action, "Update for unknown order");
            return;
        };
        match action {
            CartAction::Increase => order.quantity = order.quantity.saturating_add(1),
            CartAction::Decrease if order.quantity > 1 => order.quantity -= 1,
            CartAction::Decrease => {}
        }
        debug!(%order_id, %action, quantity = order.quantity, "Updated");
    }

    fn add(&mut self, form: &FormSubmission) {
        let Some(product_id) = form
            .action
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
        else {
            warn!(action = %form.action, "Add without product id");
            return;
        };
        let quantity = match form.field("quantity") {
            None => 1,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(quantity) => quantity,
                Err(_) => {
                    warn!(quantity = raw, "Rejected malformed quantity");
                    return;
                }
            },
        };

        if let Some((order_id, order)) = self
            .orders
            .iter_mut()
            .find(|(_, order)| order.product_id == product_id)
        {
            order.quantity = order.quantity.saturating_add(quantity);
            debug!(%order_id, product_id, quantity = order.quantity, "Merged into order");
            return;
        }

        let order_id = OrderId::from(self.next_id.to_string());
        self.next_id += 1;
        debug!(%order_id, product_id, quantity, "Opened order");
        self.orders.insert(
            order_id,
            ServerOrder {
                product_id: product_id.to_string(),
                quantity,
            },
        );
    }
}
