//! # Offboard flight library
//!
//! This crate allows to connect to a multirotor through a flight-control link, arm it, take off
//! and fly it with offboard position and attitude setpoints, either from a script or from
//! interactive one-shot commands.
//!
//! The flight-control client itself (the link, the telemetry, the vehicle state machine) is
//! abstracted by the [FlightLink](link::FlightLink) trait. The crate ships a kinematic
//! [SimulatedLink](sim::SimulatedLink) implementing it, so everything can be flown without a
//! vehicle.
//!
//! ## Layers
//!
//! | Module | Role |
//! |--------|------|
//! | [angle] | Yaw normalization into (-180, 180] |
//! | [planner] | New absolute NED setpoints from relative moves and rotations |
//! | [subsystems] | Typed, time bounded wrappers of the link calls |
//! | [Drone] | Connected vehicle, subsystems as public fields |
//! | [convergence] | Waiting for the vehicle to reach a setpoint |
//! | [session] | Takeoff, relative moves, rotations and landing with cruise altitude and yaw tracking |
//! | [mission] | Scripted linear flights |
//! | [sequencer] | Background thread executing commands sent from another thread |
//!
//! ## Usage
//!
//! The basic procedure to use the lib is:
//!  - Create a link, for example a [SimulatedLink](sim::SimulatedLink)
//!  - Create a [FlightSession](session::FlightSession) from the link and a
//!    [FlightConfig](config::FlightConfig), this connects the vehicle and waits for it to be
//!    healthy
//!  - Take off, move, rotate and land with the session methods
//!  - Disconnect the session
//!
//! Lower level access is available through the subsystems of the [Drone], returned by
//! [FlightSession::drone()](session::FlightSession::drone()).
//!
//! For example:
//! ``` no_run
//! # async fn test() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use offboard_lib::config::FlightConfig;
//! use offboard_lib::session::FlightSession;
//! use offboard_lib::sim::{SimConfig, SimulatedLink};
//!
//! let link = Arc::new(SimulatedLink::new(SimConfig::default()));
//! let mut session = FlightSession::connect(link, FlightConfig::default()).await?;
//!
//! session.takeoff().await?;
//! println!("Position: {}", session.drone().telemetry.position_ned().await?);
//!
//! session.move_left(4.0).await?;
//! session.move_right(4.0).await?;
//! session.land().await?;
//!
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod drone;
mod error;

pub mod angle;
pub mod config;
pub mod convergence;
pub mod link;
pub mod mission;
pub mod ned;
pub mod planner;
pub mod sequencer;
pub mod session;
pub mod sim;
pub mod subsystems;

pub use crate::drone::Drone;
pub use crate::error::{Error, Result};
