//! # Flight-control link
//!
//! The link to the flight controller is an external collaborator: it owns the protocol, the
//! telemetry streams and the arming/takeoff/offboard state machine running in the autopilot.
//! This module defines the contract the rest of the lib consumes, as the [FlightLink] trait.
//!
//! Streams returned by the link only yield values published after the subscription is
//! created. One-shot reads (see [Telemetry](crate::subsystems::telemetry::Telemetry)) take the
//! next value and drop the subscription.
//!
//! [SimulatedLink](crate::sim::SimulatedLink) implements this trait with an in-process vehicle.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::ned::{
    AttitudeSetpoint, ConnectionState, EulerAngle, FlightMode, Health, PositionVelocityNed,
    Setpoint,
};
use crate::{Error, Result};

/// Result code of an action command (arm, disarm, takeoff, land, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ActionResult {
    /// Unknown result
    Unknown = 0,
    /// Request was successful
    Success = 1,
    /// No system is connected
    NoSystem = 2,
    /// Connection error
    ConnectionError = 3,
    /// Vehicle is busy
    Busy = 4,
    /// Command refused by vehicle
    CommandDenied = 5,
    /// Command refused because the landed state is unknown
    CommandDeniedLandedStateUnknown = 6,
    /// Command refused because the vehicle is not landed
    CommandDeniedNotLanded = 7,
    /// Request timed out
    Timeout = 8,
    /// Error getting or setting a parameter
    ParameterError = 11,
    /// Action not supported
    Unsupported = 12,
    /// Action failed
    Failed = 13,
}

impl ActionResult {
    /// Numeric result code
    pub fn code(&self) -> u8 {
        u8::from(*self)
    }
}

/// Result code of an offboard request
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OffboardResult {
    /// Unknown result
    Unknown = 0,
    /// Request succeeded
    Success = 1,
    /// No system is connected
    NoSystem = 2,
    /// Connection error
    ConnectionError = 3,
    /// Vehicle is busy
    Busy = 4,
    /// Command denied
    CommandDenied = 5,
    /// Request timed out
    Timeout = 6,
    /// Cannot start without a setpoint set
    NoSetpointSet = 7,
    /// Request failed
    Failed = 8,
}

impl OffboardResult {
    /// Numeric result code
    pub fn code(&self) -> u8 {
        u8::from(*self)
    }
}

/// Flight-control client
///
/// All methods only take `&self` so that a link can be shared between the subsystems through
/// an `Arc<dyn FlightLink>`.
///
/// Errors expected from implementations:
///  - action commands fail with [Error::ActionRejected]
///  - [FlightLink::offboard_start()] and [FlightLink::offboard_stop()] fail with
///    [Error::OffboardRejected]
///  - any call on a closed link fails with [Error::Disconnected]
#[async_trait]
pub trait FlightLink: Send + Sync {
    /// Open the link to the given system address, for example `udp://:14540`.
    ///
    /// Returning does not mean a vehicle has been found: poll
    /// [FlightLink::connection_state()] for that.
    async fn connect(&self, address: &str) -> Result<()>;

    /// Close the link.
    async fn disconnect(&self);

    /// Connection state updates
    fn connection_state(&self) -> BoxStream<'static, ConnectionState>;

    /// Health flag updates
    fn health(&self) -> BoxStream<'static, Health>;

    /// Arm the motors
    async fn arm(&self) -> Result<()>;

    /// Disarm the motors
    async fn disarm(&self) -> Result<()>;

    /// Set the altitude, in meters above the origin, used by [FlightLink::takeoff()]
    async fn set_takeoff_altitude(&self, altitude_m: f32) -> Result<()>;

    /// Climb to the takeoff altitude and hold
    async fn takeoff(&self) -> Result<()>;

    /// Land at the current position
    async fn land(&self) -> Result<()>;

    /// Switch to offboard mode. A setpoint must have been sent first.
    async fn offboard_start(&self) -> Result<()>;

    /// Leave offboard mode and hold the current position
    async fn offboard_stop(&self) -> Result<()>;

    /// Send a position and yaw setpoint. No confirmation of arrival.
    async fn set_position_ned(&self, setpoint: Setpoint) -> Result<()>;

    /// Send an attitude and thrust setpoint. No confirmation of arrival.
    async fn set_attitude(&self, attitude: AttitudeSetpoint) -> Result<()>;

    /// Position and velocity telemetry
    fn position_velocity_ned(&self) -> BoxStream<'static, PositionVelocityNed>;

    /// Attitude telemetry
    fn attitude_euler(&self) -> BoxStream<'static, EulerAngle>;

    /// Armed state updates
    fn armed(&self) -> BoxStream<'static, bool>;

    /// In-air state updates
    fn in_air(&self) -> BoxStream<'static, bool>;

    /// Flight mode updates
    fn flight_mode(&self) -> BoxStream<'static, FlightMode>;
}

/// Run a link call, failing with [Error::Timeout] if it does not complete in `timeout`.
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| Error::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn result_codes_match_flight_client_numbering() {
        assert_eq!(ActionResult::CommandDeniedNotLanded.code(), 7);
        assert_eq!(ActionResult::Failed.code(), 13);
        assert_eq!(OffboardResult::NoSetpointSet.code(), 7);
        assert_eq!(
            OffboardResult::try_from(5u8).ok(),
            Some(OffboardResult::CommandDenied)
        );
        assert!(ActionResult::try_from(9u8).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_call_times_out() {
        let never = futures::future::pending::<Result<()>>();
        let result = bounded(Duration::from_secs(1), never).await;
        assert_eq!(result, Err(Error::Timeout));
    }

    #[tokio::test]
    async fn bounded_call_passes_result_through() {
        let result = bounded(Duration::from_secs(1), async { Ok(42) }).await;
        assert_eq!(result, Ok(42));
    }
}
