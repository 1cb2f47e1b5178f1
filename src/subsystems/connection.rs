//! # Connection and health subsystem
//!
//! Waiting for the link and for the vehicle health flags. Both waits poll the corresponding
//! stream until the wanted state is observed, bounded by a timeout.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::StreamExt;
use log::{debug, info};

use crate::link::FlightLink;
use crate::ned::Health;
use crate::{Error, Result};

/// # Connection state and health monitoring
///
/// See the [connection module documentation](crate::subsystems::connection) for more context and information.
pub struct Connection {
    link: Arc<dyn FlightLink>,
}

impl Connection {
    pub(crate) fn new(link: Arc<dyn FlightLink>) -> Self {
        Self { link }
    }

    /// Wait until a vehicle is discovered on the link.
    ///
    /// Returns [Error::Timeout] if no vehicle shows up within `timeout`.
    pub async fn wait_connected(&self, timeout: Duration) -> Result<()> {
        let mut states = self.link.connection_state();
        tokio::time::timeout(timeout, async {
            while let Some(state) = states.next().await {
                if state.is_connected {
                    info!("Vehicle connected");
                    return Ok(());
                }
            }
            Err(Error::Disconnected)
        })
        .await
        .map_err(|_| Error::Timeout)?
    }

    /// Wait until both the global and home position flags are good.
    ///
    /// Returns [Error::Timeout] if the flags are still not good after `timeout`.
    pub async fn wait_healthy(&self, timeout: Duration) -> Result<Health> {
        let mut health_updates = self.link.health();
        tokio::time::timeout(timeout, async {
            while let Some(health) = health_updates.next().await {
                if health.is_armable() {
                    info!("Global position estimate and home position OK");
                    return Ok(health);
                }
                debug!("Waiting for position estimate: {:?}", health);
            }
            Err(Error::Disconnected)
        })
        .await
        .map_err(|_| Error::Timeout)?
    }
}
