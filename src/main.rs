//! Demo: a two-row cart and one product card, driven through a short session.
//!
//! Talks to `CART_BASE_URL` when set, otherwise to an in-process server.

use cart_sync::config::CartConfig;
use cart_sync::feedback::{AddToCartButton, ButtonId};
use cart_sync::lifecycle::tracing::setup_tracing;
use cart_sync::lifecycle::CartSystem;
use cart_sync::model::OrderId;
use cart_sync::page::{CartDocument, CartForm, CartRow};
use cart_sync::quantity::QuantityChange;
use cart_sync::transport::{CartTransport, HttpTransport, LocalCartServer, ServerOrder};
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = CartConfig::from_env().map_err(|e| e.to_string())?;
    info!(base_url = ?config.base_url, currency = %config.currency, "Starting cart demo");

    let server = match config.base_url {
        Some(_) => None,
        None => Some(LocalCartServer::spawn([
            (
                OrderId::from("1"),
                ServerOrder {
                    product_id: "3".to_string(),
                    quantity: 1,
                },
            ),
            (
                OrderId::from("2"),
                ServerOrder {
                    product_id: "5".to_string(),
                    quantity: 2,
                },
            ),
        ])),
    };
    let transport: Arc<dyn CartTransport> = match &server {
        Some((local, _)) => Arc::new(local.clone()),
        None => Arc::new(HttpTransport::new(&config).map_err(|e| e.to_string())?),
    };

    let button = ButtonId::from("add-7");
    let document = CartDocument::new()
        .with_row(CartRow::new("1", Some("25.50"), "1"))
        .with_row(CartRow::new("2", Some("40"), "2"))
        .with_grand_total()
        .with_cart_count("3")
        .with_product(
            AddToCartButton::new(button.clone(), "Add to Cart"),
            CartForm::new("/add_to_cart/7").with_quantity("1"),
        );

    let system = CartSystem::start(document, transport, config);
    let client = system.client.clone();
    let tomatoes = OrderId::from("1");
    let onions = OrderId::from("2");

    let span = tracing::info_span!("cart_session");
    let session = async {
        client.increment(&tomatoes).await?;
        client.increment(&tomatoes).await?;
        client.decrement(&onions).await?;
        client.decrement(&onions).await?;
        client
            .change_product_quantity(&button, QuantityChange::Increment)
            .await?;
        client.add_to_cart(&button).await?;
        // Ignored: the button is disabled until the add settles.
        client.add_to_cart(&button).await?;
        client.wait_settled().await
    }
    .instrument(span)
    .await;

    if let Err(e) = session {
        error!(error = %e, "Cart session failed");
    }

    let snapshot = client.snapshot().await.map_err(|e| e.to_string())?;
    for row in &snapshot.document.rows {
        info!(
            order_id = %row.order_id,
            quantity = %row.quantity.input().value,
            total = %row.total_text,
            "Row"
        );
    }
    info!(
        grand_total = ?snapshot.document.grand_total,
        cart_count = ?snapshot.document.cart_count,
        alerts = ?snapshot.document.alerts,
        stats = ?snapshot.stats,
        "Cart rendered"
    );

    if let Some((server, _)) = &server {
        let orders = server.orders().await.map_err(|e| e.to_string())?;
        info!(?orders, "Server-side cart");
    }

    drop(client);
    system.shutdown().await.map_err(|e| e.to_string())?;
    if let Some((server, handle)) = server {
        drop(server);
        handle.await.map_err(|e| e.to_string())?;
    }

    info!("Demo completed successfully");
    Ok(())
}
