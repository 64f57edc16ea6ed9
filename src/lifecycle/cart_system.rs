use crate::config::CartConfig;
use crate::page::CartDocument;
use crate::sync::{CartClient, CartSynchronizer, SyncError};
use crate::transport::CartTransport;
use std::sync::Arc;
use tracing::{error, info};

/// Owns a running [`CartSynchronizer`] for one page load.
///
/// # Example
///
/// ```ignore
/// let system = CartSystem::start(document, transport, CartConfig::from_env()?);
///
/// system.client.increment(&OrderId::from("1")).await?;
///
/// // Waits for outstanding requests, then stops the synchronizer
/// system.shutdown().await?;
/// ```
pub struct CartSystem {
    /// Client for the synchronizer. Clone it freely; the synchronizer stops
    /// once every clone is dropped.
    pub client: CartClient,

    handle: tokio::task::JoinHandle<()>,
}

impl CartSystem {
    /// Spawns the synchronizer for `document`, which renders its totals immediately.
    pub fn start(
        document: CartDocument,
        transport: Arc<dyn CartTransport>,
        config: CartConfig,
    ) -> Self {
        let (actor, client) = CartSynchronizer::new(document, transport, config);
        let handle = tokio::spawn(actor.run());
        Self { client, handle }
    }

    /// Gracefully shuts down the synchronizer.
    ///
    /// Outstanding server requests are allowed to settle first. Pending timers
    /// (button resets, toast dismissals) are abandoned.
    ///
    /// Other clones of the client keep the synchronizer alive; this waits for
    /// them to be dropped too.
    pub async fn shutdown(self) -> Result<(), SyncError> {
        info!("Shutting down cart system...");

        self.client.wait_settled().await?;

        // Dropping the client closes the event channel and ends the loop.
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Synchronizer task failed: {:?}", e);
            return Err(SyncError::TaskFailed(e.to_string()));
        }

        info!("Cart system shutdown complete.");
        Ok(())
    }
}
