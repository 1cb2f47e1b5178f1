//! Command line options shared by the demos

use std::sync::Arc;

use clap::Args;
use offboard_lib::config::{FlightConfig, DEFAULT_SYSTEM_ADDRESS};
use offboard_lib::sim::{SimConfig, SimulatedLink};

/// Where and how to fly
#[derive(Args, Debug)]
pub struct FlightArgs {
    /// System address of the vehicle
    #[arg(long, default_value = DEFAULT_SYSTEM_ADDRESS)]
    pub address: String,

    /// Cruise altitude, in meters
    #[arg(long, default_value = "5")]
    pub altitude: f32,

    /// Step of the relative moves, in meters
    #[arg(long, default_value = "4")]
    pub step: f32,

    /// Step of the rotations, in degrees
    #[arg(long, default_value = "90")]
    pub rotation_step: f32,

    /// Simulate a vehicle an order of magnitude faster than real time
    #[arg(long)]
    pub fast: bool,

    /// Simulate a vehicle that rejects offboard mode
    #[arg(long)]
    pub deny_offboard: bool,
}

impl FlightArgs {
    /// Session configuration from the options
    pub fn flight_config(&self) -> FlightConfig {
        FlightConfig::default()
            .with_system_address(self.address.clone())
            .with_cruise_altitude(self.altitude)
            .with_step(self.step)
            .with_rotation_step(self.rotation_step)
    }

    /// Simulated vehicle from the options
    pub fn link(&self) -> Arc<SimulatedLink> {
        let sim = if self.fast {
            SimConfig::fast()
        } else {
            SimConfig::default()
        };
        Arc::new(SimulatedLink::new(sim.with_deny_offboard(self.deny_offboard)))
    }
}

/// Initialize the logger, `info` level unless `RUST_LOG` says otherwise
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
