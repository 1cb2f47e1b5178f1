use std::sync::Arc;

use log::info;

use crate::config::Timeouts;
use crate::link::{bounded, FlightLink};
use crate::ned::Health;
use crate::subsystems::action::Action;
use crate::subsystems::connection::Connection;
use crate::subsystems::offboard::Offboard;
use crate::subsystems::telemetry::Telemetry;
use crate::Result;

/// # The Drone
///
/// Creating a Drone connects the link and waits for a vehicle to be discovered. Once
/// [disconnected](Drone::disconnect()) the object should be dropped: create a new one to
/// connect again.
///
/// See the [offboard-lib crate root documentation](crate) for more context and information.
pub struct Drone {
    /// Connection and health monitoring
    pub connection: Connection,
    /// Arming, takeoff and landing
    pub action: Action,
    /// Offboard setpoints
    pub offboard: Offboard,
    /// Telemetry reads
    pub telemetry: Telemetry,
    timeouts: Timeouts,
    link: Arc<dyn FlightLink>,
}

impl Drone {
    /// Connect a vehicle at the given system address.
    ///
    /// This function opens the link and waits, at most `timeouts.connect`, for the vehicle to be
    /// discovered. Every later call on the subsystems is bounded by `timeouts.command`.
    ///
    /// An error is returned if the address is not valid for the link or if no vehicle shows up.
    pub async fn connect(
        link: Arc<dyn FlightLink>,
        address: &str,
        timeouts: Timeouts,
    ) -> Result<Self> {
        info!("Connecting to {}", address);
        bounded(timeouts.command, link.connect(address)).await?;

        let connection = Connection::new(link.clone());
        connection.wait_connected(timeouts.connect).await?;

        Ok(Drone {
            connection,
            action: Action::new(link.clone(), timeouts.command),
            offboard: Offboard::new(link.clone(), timeouts.command),
            telemetry: Telemetry::new(link.clone(), timeouts.command),
            timeouts,
            link,
        })
    }

    /// Wait, at most `timeouts.health`, for the position estimate and home position to be good
    pub async fn wait_healthy(&self) -> Result<Health> {
        self.connection.wait_healthy(self.timeouts.health).await
    }

    /// Wait bounds this drone was connected with
    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Disconnect the link
    ///
    /// Once disconnected, any method that communicates with the vehicle returns
    /// [Error::Disconnected](crate::Error::Disconnected).
    pub async fn disconnect(&self) {
        info!("Disconnecting");
        self.link.disconnect().await;
    }
}
