//! # Flight configuration
//!
//! [FlightConfig] groups everything a [FlightSession](crate::session::FlightSession) needs to
//! know besides the link: where to connect, the cruise altitude, the default step of the
//! relative motions, when a setpoint counts as reached and how long to wait for the flight
//! controller.
//!
//! ```
//! use std::time::Duration;
//! use offboard_lib::config::FlightConfig;
//!
//! let config = FlightConfig::default()
//!     .with_cruise_altitude(5.0)
//!     .with_step(4.0)
//!     .with_convergence_timeout(Duration::from_secs(20));
//! assert_eq!(config.system_address, "udp://:14540");
//! ```

use std::time::Duration;

/// Default system address of a simulated vehicle
pub const DEFAULT_SYSTEM_ADDRESS: &str = "udp://:14540";

/// When a measured state counts as having reached a setpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Maximum distance to the target position, in meters
    pub position_m: f32,
    /// Maximum absolute yaw error, in degrees
    pub yaw_deg: f32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            position_m: 0.15,
            yaw_deg: 2.0,
        }
    }
}

/// Upper bounds on every wait for the flight controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeouts {
    /// Link discovery after `connect`
    pub connect: Duration,
    /// Health flags becoming good
    pub health: Duration,
    /// Any single command or telemetry read
    pub command: Duration,
    /// Reaching a commanded setpoint, taking off or landing
    pub convergence: Duration,
    /// Interval between two telemetry polls while waiting for convergence
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            health: Duration::from_secs(60),
            command: Duration::from_secs(5),
            convergence: Duration::from_secs(60),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Configuration of a flight session
#[derive(Debug, Clone, PartialEq)]
pub struct FlightConfig {
    /// System address passed to the link, for example `udp://:14540`
    pub system_address: String,
    /// Altitude held by the relative motions, in meters above the origin
    pub cruise_altitude_m: f32,
    /// Distance of one move command, in meters
    pub step_m: f32,
    /// Angle of one rotate command, in degrees
    pub rotation_step_deg: f32,
    /// Convergence tolerance
    pub tolerance: Tolerance,
    /// Wait bounds
    pub timeouts: Timeouts,
    /// Land before stopping the sequencer if the vehicle is still flying
    pub land_on_shutdown: bool,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            system_address: DEFAULT_SYSTEM_ADDRESS.to_owned(),
            cruise_altitude_m: 5.0,
            step_m: 4.0,
            rotation_step_deg: 90.0,
            tolerance: Tolerance::default(),
            timeouts: Timeouts::default(),
            land_on_shutdown: true,
        }
    }
}

impl FlightConfig {
    /// Set the system address
    pub fn with_system_address(mut self, address: impl Into<String>) -> Self {
        self.system_address = address.into();
        self
    }

    /// Set the cruise altitude, in meters
    pub fn with_cruise_altitude(mut self, altitude_m: f32) -> Self {
        self.cruise_altitude_m = altitude_m;
        self
    }

    /// Set the distance of one move command, in meters
    pub fn with_step(mut self, step_m: f32) -> Self {
        self.step_m = step_m;
        self
    }

    /// Set the angle of one rotate command, in degrees
    pub fn with_rotation_step(mut self, degrees: f32) -> Self {
        self.rotation_step_deg = degrees;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set all the wait bounds
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the bound on reaching a setpoint
    pub fn with_convergence_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.convergence = timeout;
        self
    }

    /// Land (or not) before stopping the sequencer
    pub fn with_land_on_shutdown(mut self, land: bool) -> Self {
        self.land_on_shutdown = land;
        self
    }
}
