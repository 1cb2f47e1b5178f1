//! # Offboard setpoint subsystem
//!
//! In offboard mode the flight controller follows setpoints supplied by this lib instead of a
//! pre-programmed mission. The setpoints are target states: the controller converges toward
//! them over many control cycles and nothing confirms arrival, see
//! [convergence](crate::convergence) for that.
//!
//! The flight controller has a couple of rules one needs to be aware of:
//!  - A setpoint must be sent **before** offboard mode is started, otherwise the start is
//!    rejected with [OffboardResult::NoSetpointSet](crate::link::OffboardResult::NoSetpointSet)
//!  - Stopping offboard mode clears the setpoint, so a new one is needed before starting again
//!  - When offboard mode stops, the vehicle holds its current position
//!
//! ``` no_run
//! # async fn offboard(drone: offboard_lib::Drone) -> offboard_lib::Result<()> {
//! use offboard_lib::ned::{PositionNed, Setpoint};
//!
//! // Setpoint first, then start
//! let hover = Setpoint::new(PositionNed::new(0.0, 0.0, -5.0), 0.0);
//! drone.offboard.set_position_ned(hover).await?;
//! drone.offboard.start().await?;
//!
//! // Strafe left
//! drone.offboard.set_position_ned(Setpoint::new(PositionNed::new(0.0, 4.0, -5.0), 0.0)).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::link::{bounded, FlightLink};
use crate::ned::{AttitudeSetpoint, Setpoint};
use crate::{Error, Result};

/// # Offboard setpoint subsystem
///
/// See the [offboard module documentation](crate::subsystems::offboard) for more context and information.
pub struct Offboard {
    link: Arc<dyn FlightLink>,
    timeout: Duration,
}

impl Offboard {
    pub(crate) fn new(link: Arc<dyn FlightLink>, timeout: Duration) -> Self {
        Self { link, timeout }
    }

    /// Start offboard mode.
    ///
    /// Fails with [Error::OffboardRejected] carrying the result code, for example when no setpoint
    /// has been sent yet.
    pub async fn start(&self) -> Result<()> {
        debug!("Starting offboard mode");
        bounded(self.timeout, self.link.offboard_start()).await
    }

    /// Stop offboard mode, the vehicle holds its current position.
    pub async fn stop(&self) -> Result<()> {
        debug!("Stopping offboard mode");
        bounded(self.timeout, self.link.offboard_stop()).await
    }

    /// Send a position and yaw setpoint in the local NED frame.
    ///
    /// Fails with [Error::InvalidArgument] if a coordinate or the yaw is not finite.
    ///
    /// # Arguments
    /// * `setpoint` - Target position (meters) and yaw (degrees from North)
    pub async fn set_position_ned(&self, setpoint: Setpoint) -> Result<()> {
        let position = setpoint.position;
        let finite = position.north_m.is_finite()
            && position.east_m.is_finite()
            && position.down_m.is_finite();
        if !finite {
            return Err(Error::InvalidArgument(format!(
                "position must be finite, got {}",
                position
            )));
        }
        if !setpoint.yaw_deg.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "yaw must be finite, got {}",
                setpoint.yaw_deg
            )));
        }
        debug!("Position setpoint {}", setpoint);
        bounded(self.timeout, self.link.set_position_ned(setpoint)).await
    }

    /// Send an attitude and thrust setpoint.
    ///
    /// # Arguments
    /// * `attitude` - Roll, pitch and yaw (degrees) and thrust (0.0 to 1.0)
    pub async fn set_attitude(&self, attitude: AttitudeSetpoint) -> Result<()> {
        if !(0.0..=1.0).contains(&attitude.thrust_value) {
            return Err(Error::InvalidArgument(format!(
                "thrust must be within 0.0 and 1.0, got {}",
                attitude.thrust_value
            )));
        }
        debug!("Attitude setpoint {:?}", attitude);
        bounded(self.timeout, self.link.set_attitude(attitude)).await
    }
}
