//! # Flight session
//!
//! A [FlightSession] owns a connected [Drone] and the only state that has to be tracked across
//! motion commands: the cruise altitude and the commanded yaw. Every motion reads the current
//! position, plans the new setpoint with the [planner](crate::planner), sends it and waits for
//! the vehicle to get there.
//!
//! ``` no_run
//! # async fn strafe() -> offboard_lib::Result<()> {
//! use std::sync::Arc;
//! use offboard_lib::config::FlightConfig;
//! use offboard_lib::session::FlightSession;
//! use offboard_lib::sim::{SimConfig, SimulatedLink};
//!
//! let link = Arc::new(SimulatedLink::new(SimConfig::default()));
//! let mut session = FlightSession::connect(link, FlightConfig::default()).await?;
//!
//! session.takeoff().await?;
//! session.move_left(4.0).await?;
//! session.rotate_right(90.0).await?;
//! session.land().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::time::{sleep, Instant};

use crate::angle::normalize_yaw;
use crate::config::FlightConfig;
use crate::convergence::{wait_for_altitude, wait_for_landing, wait_for_setpoint};
use crate::link::FlightLink;
use crate::ned::{AttitudeSetpoint, Setpoint};
use crate::planner::{hold_altitude, plan_move, plan_rotate, Direction, Rotation};
use crate::{Drone, Error, Result};

/// # A flight with one vehicle
///
/// See the [session module documentation](crate::session) for more context and information.
pub struct FlightSession {
    drone: Drone,
    config: FlightConfig,
    cruise_altitude_m: f32,
    yaw_deg: f32,
    offboard_active: bool,
}

impl FlightSession {
    /// Connect the vehicle at `config.system_address` and wait for it to be healthy.
    pub async fn connect(link: Arc<dyn FlightLink>, config: FlightConfig) -> Result<Self> {
        let drone = Drone::connect(link, &config.system_address, config.timeouts).await?;
        drone.wait_healthy().await?;
        Ok(Self::new(drone, config))
    }

    /// Start a session on an already connected drone
    pub fn new(drone: Drone, config: FlightConfig) -> Self {
        let cruise_altitude_m = config.cruise_altitude_m;
        Self {
            drone,
            config,
            cruise_altitude_m,
            yaw_deg: 0.0,
            offboard_active: false,
        }
    }

    /// The drone flown by this session
    pub fn drone(&self) -> &Drone {
        &self.drone
    }

    /// Configuration of this session
    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Altitude held by the relative moves, in meters
    pub fn cruise_altitude(&self) -> f32 {
        self.cruise_altitude_m
    }

    /// Last commanded yaw, in degrees
    pub fn yaw(&self) -> f32 {
        self.yaw_deg
    }

    /// The vehicle is flying in offboard mode and accepts motion commands
    pub fn is_flying(&self) -> bool {
        self.offboard_active
    }

    fn ensure_flying(&self) -> Result<()> {
        if self.offboard_active {
            Ok(())
        } else {
            Err(Error::NotFlying)
        }
    }

    /// Arm, take off to the cruise altitude and switch to offboard mode.
    ///
    /// If offboard mode is rejected, the vehicle is disarmed and the rejection is returned: the
    /// rest of the flight must be aborted.
    pub async fn takeoff(&mut self) -> Result<Setpoint> {
        if self.offboard_active {
            return Err(Error::AlreadyFlying);
        }
        let timeouts = self.config.timeouts;
        let tolerance = self.config.tolerance;

        self.drone
            .action
            .set_takeoff_altitude(self.cruise_altitude_m)
            .await?;
        self.drone.action.arm().await?;
        self.drone.action.takeoff().await?;

        let position = wait_for_altitude(
            &self.drone.telemetry,
            self.cruise_altitude_m,
            tolerance,
            &timeouts,
        )
        .await?;
        let attitude = self.drone.telemetry.attitude_euler().await?;
        self.yaw_deg = normalize_yaw(attitude.yaw_deg);

        // Offboard needs a setpoint before it can start
        let initial = Setpoint::new(hold_altitude(position, self.cruise_altitude_m), self.yaw_deg);
        self.drone.offboard.set_position_ned(initial).await?;

        match self.drone.offboard.start().await {
            Ok(()) => (),
            Err(Error::OffboardRejected(result)) => {
                warn!(
                    "Starting offboard mode failed with error code: {}, disarming",
                    result.code()
                );
                if let Err(e) = self.drone.action.disarm().await {
                    warn!("Disarming failed: {}", e);
                }
                return Err(Error::OffboardRejected(result));
            }
            Err(e) => return Err(e),
        }
        self.offboard_active = true;
        info!("Offboard mode started at {}", initial);

        wait_for_setpoint(&self.drone.telemetry, initial, tolerance, &timeouts).await?;
        Ok(initial)
    }

    /// Leave offboard mode, land and wait for touchdown.
    ///
    /// Landing is attempted even when offboard mode is not active, so that a vehicle left
    /// hovering by a failed takeoff can be brought down.
    pub async fn land(&mut self) -> Result<()> {
        if self.offboard_active {
            if let Err(e) = self.drone.offboard.stop().await {
                warn!("Stopping offboard mode failed: {}", e);
            }
            self.offboard_active = false;
        }
        self.drone.action.land().await?;
        wait_for_landing(&self.drone.telemetry, &self.config.timeouts).await?;
        info!("Landed");
        Ok(())
    }

    /// Send `setpoint` and wait until the vehicle reaches it.
    pub async fn goto(&mut self, setpoint: Setpoint) -> Result<Setpoint> {
        self.ensure_flying()?;
        let setpoint = Setpoint::new(setpoint.position, normalize_yaw(setpoint.yaw_deg));
        self.fly_to(setpoint).await
    }

    /// Translate by `distance_m` in `direction` at cruise altitude, keeping the yaw.
    ///
    /// Moving [Up](Direction::Up) or [Down](Direction::Down) changes the cruise altitude.
    pub async fn move_by(&mut self, direction: Direction, distance_m: f32) -> Result<Setpoint> {
        self.ensure_flying()?;
        let current = self.drone.telemetry.position_ned().await?;
        let current = hold_altitude(current, self.cruise_altitude_m);

        let setpoint = plan_move(current, direction, distance_m, self.yaw_deg);
        self.fly_to(setpoint).await
    }

    /// Strafe left (toward +East) by `distance_m`
    pub async fn move_left(&mut self, distance_m: f32) -> Result<Setpoint> {
        self.move_by(Direction::Left, distance_m).await
    }

    /// Strafe right (toward -East) by `distance_m`
    pub async fn move_right(&mut self, distance_m: f32) -> Result<Setpoint> {
        self.move_by(Direction::Right, distance_m).await
    }

    /// Move forward (toward +North) by `distance_m`
    pub async fn move_forward(&mut self, distance_m: f32) -> Result<Setpoint> {
        self.move_by(Direction::Forward, distance_m).await
    }

    /// Move backward (toward -North) by `distance_m`
    pub async fn move_backward(&mut self, distance_m: f32) -> Result<Setpoint> {
        self.move_by(Direction::Backward, distance_m).await
    }

    /// Rotate in place by `degrees` in the direction of `rotation`
    pub async fn rotate(&mut self, rotation: Rotation, degrees: f32) -> Result<Setpoint> {
        self.ensure_flying()?;
        let current = self.drone.telemetry.position_ned().await?;
        let current = hold_altitude(current, self.cruise_altitude_m);

        let setpoint = plan_rotate(current, self.yaw_deg, rotation, degrees);
        self.fly_to(setpoint).await
    }

    /// Rotate left (yaw decreases) by `degrees`
    pub async fn rotate_left(&mut self, degrees: f32) -> Result<Setpoint> {
        self.rotate(Rotation::Left, degrees).await
    }

    /// Rotate right (yaw increases) by `degrees`
    pub async fn rotate_right(&mut self, degrees: f32) -> Result<Setpoint> {
        self.rotate(Rotation::Right, degrees).await
    }

    /// Fly on attitude setpoints for `duration`, then hold the reached position.
    ///
    /// The attitude setpoint is re-sent every poll interval. Afterwards, the position reached is
    /// held and becomes the new cruise altitude.
    pub async fn hold_attitude(
        &mut self,
        attitude: AttitudeSetpoint,
        duration: Duration,
    ) -> Result<Setpoint> {
        self.ensure_flying()?;
        let poll_interval = self.config.timeouts.poll_interval;

        let deadline = Instant::now() + duration;
        loop {
            self.drone.offboard.set_attitude(attitude).await?;
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(poll_interval.min(deadline - now)).await;
        }

        let position = self.drone.telemetry.position_ned().await?;
        self.fly_to(Setpoint::new(position, normalize_yaw(attitude.yaw_deg)))
            .await
    }

    /// Hover in place for `duration`
    pub async fn hold(&self, duration: Duration) {
        info!("Holding for {:?}", duration);
        sleep(duration).await;
    }

    // The setpoint altitude becomes the cruise altitude once the setpoint is accepted
    async fn fly_to(&mut self, setpoint: Setpoint) -> Result<Setpoint> {
        self.drone.offboard.set_position_ned(setpoint).await?;
        self.yaw_deg = setpoint.yaw_deg;
        self.cruise_altitude_m = setpoint.position.altitude_m();
        wait_for_setpoint(
            &self.drone.telemetry,
            setpoint,
            self.config.tolerance,
            &self.config.timeouts,
        )
        .await?;
        Ok(setpoint)
    }

    /// Disconnect the drone
    pub async fn disconnect(&self) {
        self.drone.disconnect().await;
    }
}
