//! # Mock Transport
//!
//! Test doubles for [`CartTransport`].
//!
//! Two styles are available:
//!
//! - [`MockTransport`]: queue expectations up front
//!   (`expect_update(..).return_ok()`), run the code under test, then
//!   [`verify`](MockTransport::verify).
//! - [`create_mock_transport`]: hands every request, with its responder, to the
//!   test through a channel. Use it with [`expect_update`], [`expect_add_to_cart`]
//!   and [`expect_cart_count`] when the test must decide *when* (and in which
//!   order) requests settle.

use super::{CartAction, CartTransport, FormSubmission, TransportError};
use crate::model::OrderId;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

/// Responder half of a captured request.
pub type Responder<T> = oneshot::Sender<Result<T, TransportError>>;

/// A request captured by [`ChannelTransport`].
#[derive(Debug)]
pub enum TransportRequest {
    Update {
        order_id: OrderId,
        action: CartAction,
        respond_to: Responder<()>,
    },
    AddToCart {
        submission: FormSubmission,
        respond_to: Responder<()>,
    },
    CartCount {
        respond_to: Responder<u32>,
    },
}

/// A transport that forwards every call into a channel.
#[derive(Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<TransportRequest>,
}

impl ChannelTransport {
    async fn request<T>(
        &self,
        build: impl FnOnce(Responder<T>) -> TransportRequest,
    ) -> Result<T, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| TransportError::ServerClosed)?;
        response.await.map_err(|_| TransportError::ServerClosed)?
    }
}

#[async_trait]
impl CartTransport for ChannelTransport {
    async fn update_cart(
        &self,
        order_id: &OrderId,
        action: CartAction,
    ) -> Result<(), TransportError> {
        let order_id = order_id.clone();
        self.request(|respond_to| TransportRequest::Update {
            order_id,
            action,
            respond_to,
        })
        .await
    }

    async fn add_to_cart(&self, form: &FormSubmission) -> Result<(), TransportError> {
        let submission = form.clone();
        self.request(|respond_to| TransportRequest::AddToCart {
            submission,
            respond_to,
        })
        .await
    }

    async fn cart_count(&self) -> Result<u32, TransportError> {
        self.request(|respond_to| TransportRequest::CartCount { respond_to })
            .await
    }
}

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

#[derive(Debug)]
enum Expectation {
    Update {
        order_id: OrderId,
        action: CartAction,
        response: Result<(), TransportError>,
    },
    AddToCart {
        response: Result<(), TransportError>,
    },
    CartCount {
        response: Result<u32, TransportError>,
    },
}

type Expectations = Arc<Mutex<VecDeque<Expectation>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A scripted transport answering requests from a queue of expectations.
///
/// Requests must arrive in the order the expectations were queued. A request
/// that does not match the next expectation is answered with
/// `TransportError::Unsupported` and reported by [`verify`](Self::verify).
///
/// # Example
/// ```ignore
/// let mock = MockTransport::new();
/// mock.expect_update("1", CartAction::Increase).return_ok();
/// mock.expect_add_to_cart().return_err(TransportError::Network("down".into()));
///
/// let transport = mock.transport();
/// // Hand the transport to a CartSynchronizer...
/// mock.verify();
/// ```
pub struct MockTransport {
    transport: ChannelTransport,
    expectations: Expectations,
    submissions: Arc<Mutex<Vec<FormSubmission>>>,
    mismatches: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockTransport {
    /// Creates a mock with no expectations. Must be called inside a runtime.
    pub fn new() -> Self {
        let (transport, mut receiver) = create_mock_transport(100);
        let expectations: Expectations = Arc::new(Mutex::new(VecDeque::new()));
        let submissions = Arc::new(Mutex::new(Vec::new()));
        let mismatches = Arc::new(Mutex::new(Vec::new()));

        let queue = expectations.clone();
        let seen = submissions.clone();
        let errors = mismatches.clone();
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&queue).pop_front();

                match (request, expectation) {
                    (
                        TransportRequest::Update {
                            order_id,
                            action,
                            respond_to,
                        },
                        Some(Expectation::Update {
                            order_id: expected_id,
                            action: expected_action,
                            response,
                        }),
                    ) if order_id == expected_id && action == expected_action => {
                        let _ = respond_to.send(response);
                    }
                    (
                        TransportRequest::AddToCart {
                            submission,
                            respond_to,
                        },
                        Some(Expectation::AddToCart { response }),
                    ) => {
                        lock(&seen).push(submission);
                        let _ = respond_to.send(response);
                    }
                    (
                        TransportRequest::CartCount { respond_to },
                        Some(Expectation::CartCount { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        lock(&errors).push(format!(
                            "unexpected request {request:?}, expected {expectation:?}"
                        ));
                        let unexpected = Err(TransportError::Unsupported("unexpected request"));
                        match request {
                            TransportRequest::Update { respond_to, .. }
                            | TransportRequest::AddToCart { respond_to, .. } => {
                                let _ = respond_to.send(unexpected);
                            }
                            TransportRequest::CartCount { respond_to } => {
                                let _ = respond_to
                                    .send(Err(TransportError::Unsupported("unexpected request")));
                            }
                        }
                    }
                }
            }
        });

        Self {
            transport,
            expectations,
            submissions,
            mismatches,
            _handle: handle,
        }
    }

    /// Returns the transport for use in tests.
    pub fn transport(&self) -> ChannelTransport {
        self.transport.clone()
    }

    /// Expects an `update_cart` call for `order_id` with `action`.
    pub fn expect_update(
        &self,
        order_id: impl Into<OrderId>,
        action: CartAction,
    ) -> UpdateExpectationBuilder {
        UpdateExpectationBuilder {
            order_id: order_id.into(),
            action,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects an `add_to_cart` call.
    pub fn expect_add_to_cart(&self) -> AddExpectationBuilder {
        AddExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `cart_count` call.
    pub fn expect_cart_count(&self) -> CountExpectationBuilder {
        CountExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Every add-to-cart submission received so far.
    pub fn submissions(&self) -> Vec<FormSubmission> {
        lock(&self.submissions).clone()
    }

    /// Verifies that all expectations were met and nothing unexpected arrived.
    pub fn verify(&self) {
        let mismatches = lock(&self.mismatches);
        if !mismatches.is_empty() {
            panic!("Unexpected requests: {mismatches:?}");
        }
        let remaining = lock(&self.expectations);
        if !remaining.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining: {remaining:?}",
                remaining.len()
            );
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `update_cart` expectations.
pub struct UpdateExpectationBuilder {
    order_id: OrderId,
    action: CartAction,
    expectations: Expectations,
}

impl UpdateExpectationBuilder {
    pub fn return_ok(self) {
        self.respond(Ok(()));
    }

    pub fn return_err(self, error: TransportError) {
        self.respond(Err(error));
    }

    fn respond(self, response: Result<(), TransportError>) {
        lock(&self.expectations).push_back(Expectation::Update {
            order_id: self.order_id,
            action: self.action,
            response,
        });
    }
}

/// Builder for `add_to_cart` expectations.
pub struct AddExpectationBuilder {
    expectations: Expectations,
}

impl AddExpectationBuilder {
    pub fn return_ok(self) {
        lock(&self.expectations).push_back(Expectation::AddToCart { response: Ok(()) });
    }

    pub fn return_err(self, error: TransportError) {
        lock(&self.expectations).push_back(Expectation::AddToCart {
            response: Err(error),
        });
    }
}

/// Builder for `cart_count` expectations.
pub struct CountExpectationBuilder {
    expectations: Expectations,
}

impl CountExpectationBuilder {
    pub fn return_ok(self, count: u32) {
        lock(&self.expectations).push_back(Expectation::CartCount {
            response: Ok(count),
        });
    }

    pub fn return_err(self, error: TransportError) {
        lock(&self.expectations).push_back(Expectation::CartCount {
            response: Err(error),
        });
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates a transport and the receiver its requests arrive on.
///
/// The test plays the server: it pulls requests with the `expect_*` helpers and
/// answers them through the returned responders, in whatever order it likes.
pub fn create_mock_transport(
    buffer_size: usize,
) -> (ChannelTransport, mpsc::Receiver<TransportRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ChannelTransport { sender }, receiver)
}

/// Helper to verify that the next request is an `update_cart`.
pub async fn expect_update(
    receiver: &mut mpsc::Receiver<TransportRequest>,
) -> Option<(OrderId, CartAction, Responder<()>)> {
    match receiver.recv().await {
        Some(TransportRequest::Update {
            order_id,
            action,
            respond_to,
        }) => Some((order_id, action, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next request is an `add_to_cart`.
pub async fn expect_add_to_cart(
    receiver: &mut mpsc::Receiver<TransportRequest>,
) -> Option<(FormSubmission, Responder<()>)> {
    match receiver.recv().await {
        Some(TransportRequest::AddToCart {
            submission,
            respond_to,
        }) => Some((submission, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next request is a `cart_count`.
pub async fn expect_cart_count(
    receiver: &mut mpsc::Receiver<TransportRequest>,
) -> Option<Responder<u32>> {
    match receiver.recv().await {
        Some(TransportRequest::CartCount { respond_to }) => Some(respond_to),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_transport() {
        let (transport, mut receiver) = create_mock_transport(10);

        let call = tokio::spawn(async move {
            transport
                .update_cart(&OrderId::from("3"), CartAction::Decrease)
                .await
        });

        let (order_id, action, responder) = expect_update(&mut receiver)
            .await
            .expect("Expected Update request");
        assert_eq!(order_id, OrderId::from("3"));
        assert_eq!(action, CartAction::Decrease);
        responder
            .send(Err(TransportError::Network("reset".to_string())))
            .unwrap();

        assert_eq!(
            call.await.unwrap(),
            Err(TransportError::Network("reset".to_string()))
        );
    }

    #[tokio::test]
    async fn test_dropped_responder_is_server_closed() {
        let (transport, mut receiver) = create_mock_transport(10);
        let call = tokio::spawn(async move { transport.cart_count().await });

        drop(expect_cart_count(&mut receiver).await);
        assert_eq!(call.await.unwrap(), Err(TransportError::ServerClosed));
    }

    #[tokio::test]
    async fn test_mock_transport_with_expectations() {
        let mock = MockTransport::new();
        mock.expect_update("1", CartAction::Increase).return_ok();
        mock.expect_add_to_cart()
            .return_err(TransportError::Network("offline".to_string()));
        mock.expect_cart_count().return_ok(5);

        let transport = mock.transport();
        assert!(transport
            .update_cart(&OrderId::from("1"), CartAction::Increase)
            .await
            .is_ok());

        let form = FormSubmission {
            action: "/add_to_cart/2".to_string(),
            fields: vec![("quantity".to_string(), "1".to_string())],
        };
        assert!(transport.add_to_cart(&form).await.is_err());
        assert_eq!(transport.cart_count().await, Ok(5));

        assert_eq!(mock.submissions(), vec![form]);
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected requests")]
    async fn test_mismatch_is_reported() {
        let mock = MockTransport::new();
        mock.expect_update("1", CartAction::Increase).return_ok();

        let result = mock
            .transport()
            .update_cart(&OrderId::from("1"), CartAction::Decrease)
            .await;
        assert_eq!(result, Err(TransportError::Unsupported("unexpected request")));
        mock.verify();
    }
}
