//! # Local frame data types
//!
//! Positions and velocities are expressed in the local North-East-Down frame whose origin is
//! the arming location. Down is positive toward the ground, so the altitude above the origin
//! is `-down_m`.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Position in the local NED frame, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionNed {
    /// Offset toward North
    pub north_m: f32,
    /// Offset toward East
    pub east_m: f32,
    /// Offset toward the ground
    pub down_m: f32,
}

impl PositionNed {
    /// Create a position from its three NED components
    pub fn new(north_m: f32, east_m: f32, down_m: f32) -> Self {
        Self {
            north_m,
            east_m,
            down_m,
        }
    }

    /// Altitude above the local origin, in meters
    pub fn altitude_m(&self) -> f32 {
        -self.down_m
    }

    /// Euclidean distance to another position, in meters
    pub fn distance_to(&self, other: &PositionNed) -> f32 {
        let dn = other.north_m - self.north_m;
        let de = other.east_m - self.east_m;
        let dd = other.down_m - self.down_m;
        (dn * dn + de * de + dd * dd).sqrt()
    }
}

impl fmt::Display for PositionNed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(N {:.2}, E {:.2}, D {:.2})",
            self.north_m, self.east_m, self.down_m
        )
    }
}

/// Velocity in the local NED frame, in meters/second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityNed {
    /// Velocity toward North
    pub north_m_s: f32,
    /// Velocity toward East
    pub east_m_s: f32,
    /// Velocity toward the ground
    pub down_m_s: f32,
}

/// One sample of the position/velocity telemetry stream
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionVelocityNed {
    /// Measured position
    pub position: PositionNed,
    /// Measured velocity
    pub velocity: VelocityNed,
}

/// Position and yaw target sent to the flight controller.
///
/// A setpoint is a command, not a measurement: the controller may take many control cycles to
/// converge toward it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Setpoint {
    /// Target position
    pub position: PositionNed,
    /// Target yaw in degrees from North, in (-180, 180]
    pub yaw_deg: f32,
}

impl Setpoint {
    /// Create a setpoint
    pub fn new(position: PositionNed, yaw_deg: f32) -> Self {
        Self { position, yaw_deg }
    }
}

impl fmt::Display for Setpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} yaw {:.1}°", self.position, self.yaw_deg)
    }
}

/// Attitude target sent to the flight controller.
///
/// * `roll_deg` - Desired roll angle (degrees, positive rolls right)
/// * `pitch_deg` - Desired pitch angle (degrees, positive pitches nose up)
/// * `yaw_deg` - Desired absolute yaw (degrees from North)
/// * `thrust_value` - Collective thrust from 0.0 to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeSetpoint {
    /// Roll angle in degrees
    pub roll_deg: f32,
    /// Pitch angle in degrees
    pub pitch_deg: f32,
    /// Yaw angle in degrees
    pub yaw_deg: f32,
    /// Thrust, 0.0 to 1.0
    pub thrust_value: f32,
}

/// Attitude telemetry sample, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngle {
    /// Roll angle in degrees
    pub roll_deg: f32,
    /// Pitch angle in degrees
    pub pitch_deg: f32,
    /// Yaw angle in degrees from North
    pub yaw_deg: f32,
}

/// Vehicle health flags required before flying in offboard mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Health {
    /// A global position estimate is available
    pub is_global_position_ok: bool,
    /// The home position has been set
    pub is_home_position_ok: bool,
}

impl Health {
    /// Both position flags are good and the vehicle will accept an arming command
    pub fn is_armable(&self) -> bool {
        self.is_global_position_ok && self.is_home_position_ok
    }
}

/// Link connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionState {
    /// A vehicle has been discovered on the link
    pub is_connected: bool,
}

/// Flight mode reported by the flight controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FlightMode {
    /// Mode not known yet
    Unknown = 0,
    /// On the ground, ready to arm or take off
    Ready = 1,
    /// Climbing to the takeoff altitude
    Takeoff = 2,
    /// Holding the current position
    Hold = 3,
    /// Following externally supplied setpoints
    Offboard = 4,
    /// Descending to land
    Land = 5,
}

impl Default for FlightMode {
    fn default() -> Self {
        FlightMode::Unknown
    }
}
