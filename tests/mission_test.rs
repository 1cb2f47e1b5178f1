// Fly the built-in missions against the simulated vehicle, on a paused clock

use std::sync::Arc;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use offboard_lib::config::FlightConfig;
use offboard_lib::link::OffboardResult;
use offboard_lib::mission::{self, Mission, Step};
use offboard_lib::ned::{FlightMode, PositionNed, Setpoint};
use offboard_lib::planner::Direction;
use offboard_lib::session::FlightSession;
use offboard_lib::sim::{SimConfig, SimulatedLink};
use offboard_lib::{Error, Result};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test(start_paused = true)]
async fn hover_flies_and_lands() -> Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::default()));

    let started = tokio::time::Instant::now();
    mission::fly(
        link.clone(),
        FlightConfig::default(),
        &Mission::hover(Duration::from_secs(40)),
    )
    .await?;
    assert!(started.elapsed() >= Duration::from_secs(40));

    let state = link.state();
    assert!(!state.in_air);
    assert!(!state.connected);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn strafe_returns_to_origin() -> Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::default()));
    let mut session = FlightSession::connect(link.clone(), FlightConfig::default()).await?;
    session.takeoff().await?;

    Mission::strafe(4.0, Duration::from_secs(2))
        .run(&mut session)
        .await?;

    let position = link.state().position_velocity.position;
    assert_abs_diff_eq!(position.east_m, 0.0, epsilon = 0.3);
    assert_abs_diff_eq!(position.north_m, 0.0, epsilon = 0.3);
    assert_eq!(session.yaw(), 0.0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn yaw_sweep_restores_heading() -> Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::default()));
    let mut session = FlightSession::connect(link.clone(), FlightConfig::default()).await?;
    session.takeoff().await?;

    Mission::yaw_sweep(90.0, Duration::from_secs(1))
        .run(&mut session)
        .await?;
    assert_eq!(session.yaw(), 0.0);
    assert_abs_diff_eq!(link.state().attitude.yaw_deg, 0.0, epsilon = 2.0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn box_pattern_closes() -> Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::default()));
    let mut session = FlightSession::connect(link.clone(), FlightConfig::default()).await?;
    session.takeoff().await?;

    Mission::box_pattern(3.0).run(&mut session).await?;

    let position = link.state().position_velocity.position;
    assert_abs_diff_eq!(position.distance_to(&PositionNed::new(0.0, 0.0, -5.0)), 0.0, epsilon = 0.5);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn custom_mission_runs_steps_in_order() -> Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::default()));
    let mut session = FlightSession::connect(link.clone(), FlightConfig::default()).await?;
    session.takeoff().await?;

    let target = Setpoint::new(PositionNed::new(1.0, 1.0, -4.0), 45.0);
    Mission::new("custom")
        .then(Step::Goto(target))
        .then_move(Direction::Up, 1.0)
        .run(&mut session)
        .await?;

    assert_eq!(session.cruise_altitude(), 5.0);
    assert_eq!(session.yaw(), 45.0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_mission_still_lands() {
    init_logger();
    let link = Arc::new(SimulatedLink::new(
        SimConfig::default().with_deny_offboard(true),
    ));

    let result = mission::fly(
        link.clone(),
        FlightConfig::default(),
        &Mission::strafe(4.0, Duration::from_secs(1)),
    )
    .await;
    assert_eq!(
        result,
        Err(Error::OffboardRejected(OffboardResult::CommandDenied))
    );

    let state = link.state();
    assert!(!state.in_air);
    assert_ne!(state.flight_mode, FlightMode::Offboard);
}
