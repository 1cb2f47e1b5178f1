//! # Flight-control subsystems
//!
//! The flight-control client is organized in logical subsystems, each with one role. Modules
//! here wrap the [FlightLink](crate::link::FlightLink) calls of one subsystem, bound each call
//! with a timeout and log what is sent to the vehicle.
//!
//! Subsystems are available as public fields of the [Drone](crate::Drone) struct.

pub mod action;
pub mod connection;
pub mod offboard;
pub mod telemetry;
