//! # Simulated vehicle
//!
//! [SimulatedLink] implements [FlightLink] with an in-process kinematic multirotor. It is
//! what the demos fly and what the tests run against when no autopilot is available.
//!
//! The model is a setpoint tracker, not a flight-control law:
//!  - the link becomes connected `link_delay` after [FlightLink::connect()] and the health flags
//!    turn good `health_delay` later
//!  - position targets are tracked with a horizontal speed limit, a vertical speed limit and a
//!    yaw-rate limit, and the vehicle snaps exactly onto the target once within one tick of it
//!  - attitude targets produce a body-frame velocity proportional to the tilt and a climb rate
//!    proportional to the thrust above hover thrust
//!  - the ground is at `down = 0`; touching down while landing disarms the vehicle
//!
//! The vehicle is advanced by one tokio task per connected link, every `tick`. Telemetry is
//! published on broadcast channels after every tick.
//!
//! ``` no_run
//! # async fn sim() -> offboard_lib::Result<()> {
//! use std::sync::Arc;
//! use offboard_lib::{Drone, config::Timeouts, sim::{SimConfig, SimulatedLink}};
//!
//! let link = Arc::new(SimulatedLink::new(SimConfig::default()));
//! let drone = Drone::connect(link.clone(), "udp://:14540", Timeouts::default()).await?;
//! drone.wait_healthy().await?;
//! println!("Simulated vehicle in mode {:?}", link.state().flight_mode);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_broadcast::{broadcast, InactiveReceiver, Sender};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::angle::{normalize_yaw, yaw_error};
use crate::link::{ActionResult, FlightLink, OffboardResult};
use crate::ned::{
    AttitudeSetpoint, ConnectionState, EulerAngle, FlightMode, Health, PositionNed,
    PositionVelocityNed, Setpoint, VelocityNed,
};
use crate::{Error, Result};

const SUPPORTED_SCHEMES: [&str; 3] = ["udp://", "tcp://", "serial://"];

// Above this altitude an armed vehicle is considered in air
const GROUND_CLEARANCE_M: f32 = 0.05;
const HOVER_THRUST: f32 = 0.5;
// Climb rate per unit of thrust above hover thrust
const CLIMB_RATE_PER_THRUST: f32 = 4.0;
// Body-frame speed per degree of tilt in attitude control
const SPEED_PER_TILT_DEG: f32 = 0.1;

const TELEMETRY_CAPACITY: usize = 16;

/// Parameters of the simulated vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Simulation step
    pub tick: Duration,
    /// Delay between `connect` and the vehicle being discovered
    pub link_delay: Duration,
    /// Delay between discovery and the health flags turning good
    pub health_delay: Duration,
    /// Takeoff altitude until one is set, in meters
    pub default_takeoff_altitude_m: f32,
    /// Horizontal speed limit, in meters/second
    pub max_horizontal_speed_m_s: f32,
    /// Vertical speed limit, in meters/second
    pub max_vertical_speed_m_s: f32,
    /// Descent speed when landing, in meters/second
    pub land_speed_m_s: f32,
    /// Yaw rate limit, in degrees/second
    pub max_yaw_rate_deg_s: f32,
    /// Reject every offboard start with [OffboardResult::CommandDenied]
    pub deny_offboard: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            link_delay: Duration::from_millis(200),
            health_delay: Duration::from_millis(500),
            default_takeoff_altitude_m: 2.5,
            max_horizontal_speed_m_s: 2.0,
            max_vertical_speed_m_s: 1.0,
            land_speed_m_s: 0.7,
            max_yaw_rate_deg_s: 45.0,
            deny_offboard: false,
        }
    }
}

impl SimConfig {
    /// A vehicle an order of magnitude faster than [SimConfig::default()], for wall-clock tests
    /// and impatient demos.
    pub fn fast() -> Self {
        Self {
            tick: Duration::from_millis(5),
            link_delay: Duration::from_millis(10),
            health_delay: Duration::from_millis(20),
            max_horizontal_speed_m_s: 40.0,
            max_vertical_speed_m_s: 20.0,
            land_speed_m_s: 20.0,
            max_yaw_rate_deg_s: 1440.0,
            ..Self::default()
        }
    }

    /// Reject (or not) every offboard start
    pub fn with_deny_offboard(mut self, deny: bool) -> Self {
        self.deny_offboard = deny;
        self
    }
}

/// Snapshot of the simulated vehicle state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimState {
    /// A vehicle has been discovered on the link
    pub connected: bool,
    /// Health flags
    pub health: Health,
    /// Motors armed
    pub armed: bool,
    /// Above the ground and armed
    pub in_air: bool,
    /// Current flight mode
    pub flight_mode: FlightMode,
    /// Position and velocity
    pub position_velocity: PositionVelocityNed,
    /// Attitude
    pub attitude: EulerAngle,
}

#[derive(Debug, Clone, Copy)]
enum OffboardTarget {
    Position(Setpoint),
    Attitude(AttitudeSetpoint),
}

#[derive(Debug)]
struct Vehicle {
    link_open: bool,
    connected: bool,
    since_open: Duration,
    health: Health,
    armed: bool,
    in_air: bool,
    mode: FlightMode,
    position: PositionNed,
    velocity: VelocityNed,
    attitude: EulerAngle,
    takeoff_altitude_m: f32,
    hold: Setpoint,
    offboard_target: Option<OffboardTarget>,
}

impl Vehicle {
    fn new(config: &SimConfig) -> Self {
        Self {
            link_open: false,
            connected: false,
            since_open: Duration::ZERO,
            health: Health::default(),
            armed: false,
            in_air: false,
            mode: FlightMode::Unknown,
            position: PositionNed::default(),
            velocity: VelocityNed::default(),
            attitude: EulerAngle::default(),
            takeoff_altitude_m: config.default_takeoff_altitude_m,
            hold: Setpoint::default(),
            offboard_target: None,
        }
    }

    fn state(&self) -> SimState {
        SimState {
            connected: self.connected,
            health: self.health,
            armed: self.armed,
            in_air: self.in_air,
            flight_mode: self.mode,
            position_velocity: PositionVelocityNed {
                position: self.position,
                velocity: self.velocity,
            },
            attitude: self.attitude,
        }
    }

    fn current_setpoint(&self) -> Setpoint {
        Setpoint::new(self.position, self.attitude.yaw_deg)
    }

    fn check_link(&self) -> Result<()> {
        if self.link_open {
            Ok(())
        } else {
            Err(Error::Disconnected)
        }
    }

    fn check_action(&self, command: &'static str) -> Result<()> {
        self.check_link()?;
        if !self.connected {
            return Err(Error::ActionRejected(command, ActionResult::NoSystem));
        }
        Ok(())
    }

    fn check_offboard(&self) -> Result<()> {
        self.check_link()?;
        if !self.connected {
            return Err(Error::OffboardRejected(OffboardResult::NoSystem));
        }
        Ok(())
    }

    fn step(&mut self, config: &SimConfig) {
        if !self.link_open {
            return;
        }
        let dt = config.tick.as_secs_f32();

        self.since_open += config.tick;
        if !self.connected && self.since_open >= config.link_delay {
            info!("Simulated vehicle discovered");
            self.connected = true;
            self.mode = FlightMode::Ready;
        }
        if self.connected
            && !self.health.is_armable()
            && self.since_open >= config.link_delay + config.health_delay
        {
            debug!("Simulated vehicle position estimate ready");
            self.health = Health {
                is_global_position_ok: true,
                is_home_position_ok: true,
            };
        }

        let previous = self.position;

        if self.armed {
            match self.mode {
                FlightMode::Takeoff => {
                    let target = Setpoint::new(
                        PositionNed {
                            down_m: -self.takeoff_altitude_m,
                            ..self.hold.position
                        },
                        self.hold.yaw_deg,
                    );
                    if self.track(target, config.max_vertical_speed_m_s, config) {
                        debug!("Simulated vehicle reached takeoff altitude");
                        self.hold = target;
                        self.mode = FlightMode::Hold;
                    }
                }
                FlightMode::Hold => {
                    self.track(self.hold, config.max_vertical_speed_m_s, config);
                }
                FlightMode::Offboard => match self.offboard_target {
                    Some(OffboardTarget::Position(setpoint)) => {
                        self.track(setpoint, config.max_vertical_speed_m_s, config);
                    }
                    Some(OffboardTarget::Attitude(attitude)) => self.fly_attitude(attitude, config),
                    None => {
                        self.track(self.hold, config.max_vertical_speed_m_s, config);
                    }
                },
                FlightMode::Land => {
                    let target = Setpoint::new(
                        PositionNed {
                            down_m: 0.0,
                            ..self.hold.position
                        },
                        self.hold.yaw_deg,
                    );
                    if self.track(target, config.land_speed_m_s, config) {
                        info!("Simulated vehicle landed, disarming");
                        self.armed = false;
                        self.mode = FlightMode::Ready;
                        self.hold = target;
                    }
                }
                FlightMode::Ready | FlightMode::Unknown => {}
            }
        }

        if self.position.down_m > 0.0 {
            self.position.down_m = 0.0;
        }

        self.velocity = VelocityNed {
            north_m_s: (self.position.north_m - previous.north_m) / dt,
            east_m_s: (self.position.east_m - previous.east_m) / dt,
            down_m_s: (self.position.down_m - previous.down_m) / dt,
        };
        self.in_air = self.armed && self.position.altitude_m() > GROUND_CLEARANCE_M;
    }

    // Move one tick toward the target, returns true once exactly on it
    fn track(&mut self, target: Setpoint, vertical_speed_m_s: f32, config: &SimConfig) -> bool {
        let dt = config.tick.as_secs_f32();

        let dn = target.position.north_m - self.position.north_m;
        let de = target.position.east_m - self.position.east_m;
        let horizontal = (dn * dn + de * de).sqrt();
        let max_horizontal = config.max_horizontal_speed_m_s * dt;
        if horizontal <= max_horizontal {
            self.position.north_m = target.position.north_m;
            self.position.east_m = target.position.east_m;
        } else {
            let scale = max_horizontal / horizontal;
            self.position.north_m += dn * scale;
            self.position.east_m += de * scale;
        }

        let dd = target.position.down_m - self.position.down_m;
        let max_vertical = vertical_speed_m_s * dt;
        if dd.abs() <= max_vertical {
            self.position.down_m = target.position.down_m;
        } else {
            self.position.down_m += max_vertical.copysign(dd);
        }

        self.turn_toward(target.yaw_deg, config);
        self.attitude.roll_deg = 0.0;
        self.attitude.pitch_deg = 0.0;

        self.position == target.position && self.attitude.yaw_deg == normalize_yaw(target.yaw_deg)
    }

    fn turn_toward(&mut self, yaw_deg: f32, config: &SimConfig) {
        let error = yaw_error(yaw_deg, self.attitude.yaw_deg);
        let max_turn = config.max_yaw_rate_deg_s * config.tick.as_secs_f32();
        self.attitude.yaw_deg = if error.abs() <= max_turn {
            normalize_yaw(yaw_deg)
        } else {
            normalize_yaw(self.attitude.yaw_deg + max_turn.copysign(error))
        };
    }

    fn fly_attitude(&mut self, attitude: AttitudeSetpoint, config: &SimConfig) {
        let dt = config.tick.as_secs_f32();

        self.turn_toward(attitude.yaw_deg, config);
        self.attitude.roll_deg = attitude.roll_deg;
        self.attitude.pitch_deg = attitude.pitch_deg;

        // Nose down (negative pitch) flies forward, right roll flies right
        let forward = -attitude.pitch_deg * SPEED_PER_TILT_DEG;
        let right = attitude.roll_deg * SPEED_PER_TILT_DEG;
        let (sin, cos) = self.attitude.yaw_deg.to_radians().sin_cos();
        self.position.north_m += (forward * cos - right * sin) * dt;
        self.position.east_m += (forward * sin + right * cos) * dt;

        let climb = ((attitude.thrust_value - HOVER_THRUST) * CLIMB_RATE_PER_THRUST)
            .clamp(-config.max_vertical_speed_m_s, config.max_vertical_speed_m_s);
        self.position.down_m -= climb * dt;
    }
}

struct Topic<T> {
    sender: Sender<T>,
    receiver: InactiveReceiver<T>,
}

impl<T: Clone + Send + Sync + 'static> Topic<T> {
    fn new() -> Self {
        let (mut sender, receiver) = broadcast(TELEMETRY_CAPACITY);
        // Slow subscribers lose old samples, publishing never waits
        sender.set_overflow(true);
        sender.set_await_active(false);
        Self {
            sender,
            receiver: receiver.deactivate(),
        }
    }

    fn publish(&self, value: T) {
        // Fails when nobody is subscribed, which is fine
        let _ = self.sender.try_broadcast(value);
    }

    fn subscribe(&self) -> BoxStream<'static, T> {
        self.receiver.activate_cloned().boxed()
    }

    // Ends every subscription, current and future
    fn close(&self) {
        self.sender.close();
    }
}

struct Topics {
    connection_state: Topic<ConnectionState>,
    health: Topic<Health>,
    position_velocity_ned: Topic<PositionVelocityNed>,
    attitude_euler: Topic<EulerAngle>,
    armed: Topic<bool>,
    in_air: Topic<bool>,
    flight_mode: Topic<FlightMode>,
}

impl Topics {
    fn new() -> Self {
        Self {
            connection_state: Topic::new(),
            health: Topic::new(),
            position_velocity_ned: Topic::new(),
            attitude_euler: Topic::new(),
            armed: Topic::new(),
            in_air: Topic::new(),
            flight_mode: Topic::new(),
        }
    }

    fn close(&self) {
        self.connection_state.close();
        self.health.close();
        self.position_velocity_ned.close();
        self.attitude_euler.close();
        self.armed.close();
        self.in_air.close();
        self.flight_mode.close();
    }

    fn is_closed(&self) -> bool {
        self.connection_state.sender.is_closed()
    }

    fn publish(&self, state: &SimState) {
        self.connection_state.publish(ConnectionState {
            is_connected: state.connected,
        });
        if state.connected {
            self.health.publish(state.health);
            self.position_velocity_ned.publish(state.position_velocity);
            self.attitude_euler.publish(state.attitude);
            self.armed.publish(state.armed);
            self.in_air.publish(state.in_air);
            self.flight_mode.publish(state.flight_mode);
        }
    }
}

/// # In-process simulated vehicle
///
/// See the [sim module documentation](crate::sim) for the model.
pub struct SimulatedLink {
    config: SimConfig,
    vehicle: Arc<Mutex<Vehicle>>,
    topics: Mutex<Arc<Topics>>,
    physics_task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedLink {
    /// Create a vehicle sitting disarmed at the origin, link closed
    pub fn new(config: SimConfig) -> Self {
        let vehicle = Arc::new(Mutex::new(Vehicle::new(&config)));
        Self {
            config,
            vehicle,
            topics: Mutex::new(Arc::new(Topics::new())),
            physics_task: Mutex::new(None),
        }
    }

    /// Parameters of this vehicle
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current state of the vehicle
    pub fn state(&self) -> SimState {
        self.vehicle().state()
    }

    fn vehicle(&self) -> MutexGuard<'_, Vehicle> {
        self.vehicle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn topics(&self) -> Arc<Topics> {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn physics_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.physics_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_physics(&self) -> JoinHandle<()> {
        let vehicle = self.vehicle.clone();
        let topics = self.topics();
        let config = self.config.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let state = {
                    let mut vehicle = vehicle.lock().unwrap_or_else(PoisonError::into_inner);
                    vehicle.step(&config);
                    vehicle.state()
                };
                topics.publish(&state);
            }
        })
    }
}

impl Drop for SimulatedLink {
    fn drop(&mut self) {
        if let Some(task) = self.physics_task().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl FlightLink for SimulatedLink {
    async fn connect(&self, address: &str) -> Result<()> {
        if !SUPPORTED_SCHEMES
            .iter()
            .any(|scheme| address.starts_with(scheme))
        {
            return Err(Error::InvalidAddress(address.to_owned()));
        }

        {
            let mut vehicle = self.vehicle();
            if vehicle.link_open {
                return Ok(());
            }
            debug!("Opening simulated link on {}", address);
            vehicle.link_open = true;
            vehicle.since_open = Duration::ZERO;
        }

        {
            // Topics closed by a previous disconnect are replaced
            let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
            if topics.is_closed() {
                *topics = Arc::new(Topics::new());
            }
        }

        let task = self.spawn_physics();
        if let Some(previous) = self.physics_task().replace(task) {
            previous.abort();
        }
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(task) = self.physics_task().take() {
            task.abort();
        }
        {
            let mut vehicle = self.vehicle();
            vehicle.link_open = false;
            vehicle.connected = false;
        }
        let topics = self.topics();
        topics.connection_state.publish(ConnectionState {
            is_connected: false,
        });
        topics.close();
    }

    fn connection_state(&self) -> BoxStream<'static, ConnectionState> {
        self.topics().connection_state.subscribe()
    }

    fn health(&self) -> BoxStream<'static, Health> {
        self.topics().health.subscribe()
    }

    async fn arm(&self) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_action("arm")?;
        if !vehicle.health.is_armable() {
            return Err(Error::ActionRejected("arm", ActionResult::CommandDenied));
        }
        vehicle.armed = true;
        Ok(())
    }

    async fn disarm(&self) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_action("disarm")?;
        if vehicle.in_air {
            return Err(Error::ActionRejected(
                "disarm",
                ActionResult::CommandDeniedNotLanded,
            ));
        }
        vehicle.armed = false;
        vehicle.mode = FlightMode::Ready;
        Ok(())
    }

    async fn set_takeoff_altitude(&self, altitude_m: f32) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_action("set_takeoff_altitude")?;
        if !altitude_m.is_finite() || altitude_m <= 0.0 {
            return Err(Error::ActionRejected(
                "set_takeoff_altitude",
                ActionResult::ParameterError,
            ));
        }
        vehicle.takeoff_altitude_m = altitude_m;
        Ok(())
    }

    async fn takeoff(&self) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_action("takeoff")?;
        if !vehicle.armed {
            return Err(Error::ActionRejected("takeoff", ActionResult::CommandDenied));
        }
        vehicle.hold = vehicle.current_setpoint();
        vehicle.mode = FlightMode::Takeoff;
        Ok(())
    }

    async fn land(&self) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_action("land")?;
        if !vehicle.armed {
            return Err(Error::ActionRejected("land", ActionResult::CommandDenied));
        }
        vehicle.hold = vehicle.current_setpoint();
        vehicle.mode = FlightMode::Land;
        Ok(())
    }

    async fn offboard_start(&self) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_offboard()?;
        if vehicle.offboard_target.is_none() {
            return Err(Error::OffboardRejected(OffboardResult::NoSetpointSet));
        }
        if self.config.deny_offboard {
            return Err(Error::OffboardRejected(OffboardResult::CommandDenied));
        }
        vehicle.mode = FlightMode::Offboard;
        Ok(())
    }

    async fn offboard_stop(&self) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_offboard()?;
        if vehicle.mode == FlightMode::Offboard {
            vehicle.hold = vehicle.current_setpoint();
            vehicle.mode = if vehicle.armed {
                FlightMode::Hold
            } else {
                FlightMode::Ready
            };
        }
        vehicle.offboard_target = None;
        Ok(())
    }

    async fn set_position_ned(&self, setpoint: Setpoint) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_link()?;
        vehicle.offboard_target = Some(OffboardTarget::Position(setpoint));
        Ok(())
    }

    async fn set_attitude(&self, attitude: AttitudeSetpoint) -> Result<()> {
        let mut vehicle = self.vehicle();
        vehicle.check_link()?;
        vehicle.offboard_target = Some(OffboardTarget::Attitude(attitude));
        Ok(())
    }

    fn position_velocity_ned(&self) -> BoxStream<'static, PositionVelocityNed> {
        self.topics().position_velocity_ned.subscribe()
    }

    fn attitude_euler(&self) -> BoxStream<'static, EulerAngle> {
        self.topics().attitude_euler.subscribe()
    }

    fn armed(&self) -> BoxStream<'static, bool> {
        self.topics().armed.subscribe()
    }

    fn in_air(&self) -> BoxStream<'static, bool> {
        self.topics().in_air.subscribe()
    }

    fn flight_mode(&self) -> BoxStream<'static, FlightMode> {
        self.topics().flight_mode.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const ADDRESS: &str = "udp://:14540";

    async fn healthy_link(config: SimConfig) -> SimulatedLink {
        let link = SimulatedLink::new(config);
        link.connect(ADDRESS).await.unwrap();
        sleep(Duration::from_secs(1)).await;
        assert!(link.state().health.is_armable());
        link
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_unknown_address_scheme() {
        let link = SimulatedLink::new(SimConfig::default());
        assert_eq!(
            link.connect("bluetooth://drone").await,
            Err(Error::InvalidAddress("bluetooth://drone".to_owned()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn commands_fail_on_closed_link() {
        let link = SimulatedLink::new(SimConfig::default());
        assert_eq!(link.arm().await, Err(Error::Disconnected));
    }

    #[tokio::test(start_paused = true)]
    async fn arm_denied_until_healthy() {
        let link = SimulatedLink::new(SimConfig::default());
        link.connect(ADDRESS).await.unwrap();
        assert_eq!(
            link.arm().await,
            Err(Error::ActionRejected("arm", ActionResult::NoSystem))
        );

        sleep(Duration::from_millis(300)).await;
        assert!(link.state().connected);
        assert_eq!(
            link.arm().await,
            Err(Error::ActionRejected("arm", ActionResult::CommandDenied))
        );

        sleep(Duration::from_millis(600)).await;
        assert_eq!(link.arm().await, Ok(()));
        assert!(link.state().armed);
    }

    #[tokio::test(start_paused = true)]
    async fn offboard_needs_a_setpoint() {
        let link = healthy_link(SimConfig::default()).await;
        assert_eq!(
            link.offboard_start().await,
            Err(Error::OffboardRejected(OffboardResult::NoSetpointSet))
        );

        link.set_position_ned(Setpoint::default()).await.unwrap();
        assert_eq!(link.offboard_start().await, Ok(()));

        // Stopping clears the setpoint
        link.offboard_stop().await.unwrap();
        assert_eq!(
            link.offboard_start().await,
            Err(Error::OffboardRejected(OffboardResult::NoSetpointSet))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn takeoff_climbs_and_holds() {
        let link = healthy_link(SimConfig::default()).await;
        link.arm().await.unwrap();
        link.takeoff().await.unwrap();

        sleep(Duration::from_secs(5)).await;
        let state = link.state();
        assert_eq!(state.flight_mode, FlightMode::Hold);
        assert_eq!(state.position_velocity.position, PositionNed::new(0.0, 0.0, -2.5));
        assert!(state.in_air);

        assert_eq!(
            link.disarm().await,
            Err(Error::ActionRejected(
                "disarm",
                ActionResult::CommandDeniedNotLanded
            ))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn landing_disarms_on_touchdown() {
        let link = healthy_link(SimConfig::default()).await;
        link.set_takeoff_altitude(1.0).await.unwrap();
        link.arm().await.unwrap();
        link.takeoff().await.unwrap();
        sleep(Duration::from_secs(3)).await;
        assert!(link.state().in_air);

        link.land().await.unwrap();
        sleep(Duration::from_secs(3)).await;
        let state = link.state();
        assert!(!state.armed);
        assert!(!state.in_air);
        assert_eq!(state.flight_mode, FlightMode::Ready);
        assert_eq!(state.position_velocity.position.down_m, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn offboard_position_tracking_is_rate_limited() {
        let link = healthy_link(SimConfig::default()).await;
        link.set_takeoff_altitude(2.0).await.unwrap();
        link.arm().await.unwrap();
        link.takeoff().await.unwrap();
        sleep(Duration::from_secs(3)).await;

        let target = Setpoint::new(PositionNed::new(0.0, 4.0, -2.0), 90.0);
        link.set_position_ned(target).await.unwrap();
        link.offboard_start().await.unwrap();

        // 4 m at 2 m/s and 90° at 45°/s both need 2 s
        sleep(Duration::from_secs(1)).await;
        let halfway = link.state();
        assert!(halfway.position_velocity.position.east_m < 4.0);
        assert!(halfway.attitude.yaw_deg < 90.0);

        sleep(Duration::from_secs(2)).await;
        let state = link.state();
        assert_eq!(state.position_velocity.position, target.position);
        assert_eq!(state.attitude.yaw_deg, 90.0);
        assert_eq!(state.flight_mode, FlightMode::Offboard);
    }

    #[tokio::test(start_paused = true)]
    async fn attitude_thrust_above_hover_climbs() {
        let link = healthy_link(SimConfig::default()).await;
        link.arm().await.unwrap();
        link.set_attitude(AttitudeSetpoint {
            roll_deg: 0.0,
            pitch_deg: 0.0,
            yaw_deg: 0.0,
            thrust_value: 0.6,
        })
        .await
        .unwrap();
        link.offboard_start().await.unwrap();

        sleep(Duration::from_secs(2)).await;
        let state = link.state();
        assert!(state.position_velocity.position.altitude_m() > 0.5);
        assert!(state.in_air);
    }

    #[tokio::test(start_paused = true)]
    async fn telemetry_stream_yields_after_connect() {
        let link = healthy_link(SimConfig::default()).await;
        let mut modes = link.flight_mode();
        assert_eq!(modes.next().await, Some(FlightMode::Ready));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_ends_streams_until_reconnected() {
        let link = healthy_link(SimConfig::default()).await;
        let mut waiting = link.in_air();
        link.disconnect().await;

        // Samples published before the disconnect are still delivered, then the stream ends
        while waiting.next().await.is_some() {}
        assert_eq!(link.flight_mode().next().await, None);

        link.connect(ADDRESS).await.unwrap();
        let mut modes = link.flight_mode();
        assert_eq!(modes.next().await, Some(FlightMode::Ready));
    }
}
