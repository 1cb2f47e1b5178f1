//! # Scripted missions
//!
//! A [Mission] is a linear list of [Step]s flown in order on a [FlightSession]. Motion steps
//! complete when the vehicle has converged onto the new setpoint, [Step::Hold] is an explicit
//! hover pause.
//!
//! [fly()] runs a complete flight: connect, take off, run the mission, land and disconnect.
//!
//! ``` no_run
//! # async fn hover() -> offboard_lib::Result<()> {
//! use std::sync::Arc;
//! use std::time::Duration;
//! use offboard_lib::config::FlightConfig;
//! use offboard_lib::mission::{self, Mission};
//! use offboard_lib::sim::{SimConfig, SimulatedLink};
//!
//! let link = Arc::new(SimulatedLink::new(SimConfig::default()));
//! let mission = Mission::hover(Duration::from_secs(40));
//! mission::fly(link, FlightConfig::default(), &mission).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};

use crate::config::FlightConfig;
use crate::link::FlightLink;
use crate::ned::{AttitudeSetpoint, Setpoint};
use crate::planner::{Direction, Rotation};
use crate::session::FlightSession;
use crate::Result;

/// One step of a mission
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Relative translation, in meters
    Move(Direction, f32),
    /// Relative yaw rotation, in degrees
    Rotate(Rotation, f32),
    /// Absolute position and yaw
    Goto(Setpoint),
    /// Attitude setpoint flown for a duration
    Attitude(AttitudeSetpoint, Duration),
    /// Hover in place
    Hold(Duration),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Move(direction, distance) => write!(f, "move {:?} {} m", direction, distance),
            Step::Rotate(rotation, degrees) => write!(f, "rotate {:?} {} deg", rotation, degrees),
            Step::Goto(setpoint) => write!(f, "goto {}", setpoint),
            Step::Attitude(attitude, duration) => write!(
                f,
                "attitude roll {} pitch {} yaw {} thrust {} for {:?}",
                attitude.roll_deg,
                attitude.pitch_deg,
                attitude.yaw_deg,
                attitude.thrust_value,
                duration
            ),
            Step::Hold(duration) => write!(f, "hold {:?}", duration),
        }
    }
}

/// A named sequence of steps
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    name: String,
    steps: Vec<Step>,
}

impl Mission {
    /// Empty mission
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn then(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a relative translation
    pub fn then_move(self, direction: Direction, distance_m: f32) -> Self {
        self.then(Step::Move(direction, distance_m))
    }

    /// Append a relative rotation
    pub fn then_rotate(self, rotation: Rotation, degrees: f32) -> Self {
        self.then(Step::Rotate(rotation, degrees))
    }

    /// Append a hover pause
    pub fn then_hold(self, duration: Duration) -> Self {
        self.then(Step::Hold(duration))
    }

    /// Name of the mission
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steps, in flight order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Hover at cruise altitude
    pub fn hover(duration: Duration) -> Self {
        Self::new("hover").then_hold(duration)
    }

    /// Strafe left then right back to the start, pausing after each leg
    pub fn strafe(distance_m: f32, pause: Duration) -> Self {
        Self::new("strafe")
            .then_move(Direction::Left, distance_m)
            .then_hold(pause)
            .then_move(Direction::Right, distance_m)
            .then_hold(pause)
    }

    /// Rotate left then right back to the initial heading, pausing after each rotation
    pub fn yaw_sweep(degrees: f32, pause: Duration) -> Self {
        Self::new("yaw sweep")
            .then_rotate(Rotation::Left, degrees)
            .then_hold(pause)
            .then_rotate(Rotation::Right, degrees)
            .then_hold(pause)
    }

    /// Fly a square with sides of `side_m`, ending where it started
    pub fn box_pattern(side_m: f32) -> Self {
        Self::new("box")
            .then_move(Direction::Forward, side_m)
            .then_move(Direction::Left, side_m)
            .then_move(Direction::Backward, side_m)
            .then_move(Direction::Right, side_m)
    }

    /// Fly every step in order, stopping at the first error.
    ///
    /// The session must be flying: takeoff and landing are not part of the mission.
    pub async fn run(&self, session: &mut FlightSession) -> Result<()> {
        info!("Running mission '{}' ({} steps)", self.name, self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            info!("Step {}: {}", i + 1, step);
            match *step {
                Step::Move(direction, distance) => {
                    session.move_by(direction, distance).await?;
                }
                Step::Rotate(rotation, degrees) => {
                    session.rotate(rotation, degrees).await?;
                }
                Step::Goto(setpoint) => {
                    session.goto(setpoint).await?;
                }
                Step::Attitude(attitude, duration) => {
                    session.hold_attitude(attitude, duration).await?;
                }
                Step::Hold(duration) => session.hold(duration).await,
            }
        }
        info!("Mission '{}' done", self.name);
        Ok(())
    }
}

/// Connect, take off, fly `mission`, land and disconnect.
///
/// If anything fails after the takeoff was attempted, landing is still attempted before the
/// error is returned.
pub async fn fly(link: Arc<dyn FlightLink>, config: FlightConfig, mission: &Mission) -> Result<()> {
    let mut session = FlightSession::connect(link, config).await?;

    let flight = match session.takeoff().await {
        Ok(_) => mission.run(&mut session).await,
        Err(e) => Err(e),
    };

    let result = match flight {
        Ok(()) => session.land().await,
        Err(e) => {
            error!("Mission '{}' failed: {}, landing", mission.name(), e);
            if let Err(land_error) = session.land().await {
                error!("Landing failed: {}", land_error);
            }
            Err(e)
        }
    };

    session.disconnect().await;
    result
}
