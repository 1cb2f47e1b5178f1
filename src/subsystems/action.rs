//! # Action subsystem
//!
//! One-shot vehicle commands: arming, takeoff and landing. Each command is acknowledged by
//! the flight controller, and a refusal is returned as
//! [Error::ActionRejected](crate::Error::ActionRejected) with the result code.
//!
//! Takeoff and landing return as soon as the command is accepted, not when the vehicle has
//! reached its altitude or the ground.
//!
//! ``` no_run
//! # async fn fly(drone: offboard_lib::Drone) -> offboard_lib::Result<()> {
//! drone.action.arm().await?;
//! drone.action.set_takeoff_altitude(5.0).await?;
//! drone.action.takeoff().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::link::{bounded, FlightLink};
use crate::Result;

/// # Access to the vehicle actions
///
/// See the [action module documentation](crate::subsystems::action) for more context and information.
pub struct Action {
    link: Arc<dyn FlightLink>,
    timeout: Duration,
}

impl Action {
    pub(crate) fn new(link: Arc<dyn FlightLink>, timeout: Duration) -> Self {
        Self { link, timeout }
    }

    /// Arm the motors
    pub async fn arm(&self) -> Result<()> {
        info!("Arming");
        bounded(self.timeout, self.link.arm()).await
    }

    /// Disarm the motors. Refused while the vehicle is in the air.
    pub async fn disarm(&self) -> Result<()> {
        info!("Disarming");
        bounded(self.timeout, self.link.disarm()).await
    }

    /// Set the altitude reached by [Action::takeoff()], in meters above the origin
    pub async fn set_takeoff_altitude(&self, altitude_m: f32) -> Result<()> {
        bounded(self.timeout, self.link.set_takeoff_altitude(altitude_m)).await
    }

    /// Take off vertically to the takeoff altitude and hold
    pub async fn takeoff(&self) -> Result<()> {
        info!("Taking off");
        bounded(self.timeout, self.link.takeoff()).await
    }

    /// Land at the current position. The vehicle disarms on touchdown.
    pub async fn land(&self) -> Result<()> {
        info!("Landing");
        bounded(self.timeout, self.link.land()).await
    }
}
