//! # Telemetry subsystem
//!
//! The telemetry streams are owned by the flight controller link. This subsystem offers
//! one-shot reads, which subscribe, take the next sample and drop the subscription, as well as
//! the raw streams for continuous monitoring.
//!
//! ``` no_run
//! # async fn read(drone: &offboard_lib::Drone) -> offboard_lib::Result<()> {
//! let position = drone.telemetry.position_ned().await?;
//! println!("Altitude: {:.2} m", position.altitude_m());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};

use crate::link::FlightLink;
use crate::ned::{EulerAngle, FlightMode, Health, PositionNed, PositionVelocityNed};
use crate::{Error, Result};

/// # Access to the telemetry
///
/// See the [telemetry module documentation](crate::subsystems::telemetry) for more context and information.
pub struct Telemetry {
    link: Arc<dyn FlightLink>,
    timeout: Duration,
}

impl Telemetry {
    pub(crate) fn new(link: Arc<dyn FlightLink>, timeout: Duration) -> Self {
        Self { link, timeout }
    }

    // Take exactly one sample then drop the subscription
    async fn next_sample<T>(&self, mut stream: BoxStream<'static, T>) -> Result<T> {
        tokio::time::timeout(self.timeout, stream.next())
            .await
            .map_err(|_| Error::Timeout)?
            .ok_or(Error::Disconnected)
    }

    /// Read the next position and velocity sample
    pub async fn position_velocity_ned(&self) -> Result<PositionVelocityNed> {
        self.next_sample(self.link.position_velocity_ned()).await
    }

    /// Read the next position sample
    pub async fn position_ned(&self) -> Result<PositionNed> {
        Ok(self.position_velocity_ned().await?.position)
    }

    /// Read the next attitude sample
    pub async fn attitude_euler(&self) -> Result<EulerAngle> {
        self.next_sample(self.link.attitude_euler()).await
    }

    /// Read the next health sample
    pub async fn health(&self) -> Result<Health> {
        self.next_sample(self.link.health()).await
    }

    /// Read the armed state
    pub async fn armed(&self) -> Result<bool> {
        self.next_sample(self.link.armed()).await
    }

    /// Read the in-air state
    pub async fn in_air(&self) -> Result<bool> {
        self.next_sample(self.link.in_air()).await
    }

    /// Read the flight mode
    pub async fn flight_mode(&self) -> Result<FlightMode> {
        self.next_sample(self.link.flight_mode()).await
    }

    /// Continuous position and velocity stream
    pub fn position_velocity_ned_stream(&self) -> BoxStream<'static, PositionVelocityNed> {
        self.link.position_velocity_ned()
    }

    /// Continuous attitude stream
    pub fn attitude_euler_stream(&self) -> BoxStream<'static, EulerAngle> {
        self.link.attitude_euler()
    }
}
