// Drive the sequencer thread from the test thread, against a fast simulated vehicle

use std::sync::Arc;
use std::time::{Duration, Instant};

use approx::assert_abs_diff_eq;
use offboard_lib::config::FlightConfig;
use offboard_lib::sequencer::{Command, SequencerEvent, SequencerHandle};
use offboard_lib::sim::{SimConfig, SimulatedLink};
use offboard_lib::Error;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> FlightConfig {
    FlightConfig::default()
        .with_step(2.0)
        .with_convergence_timeout(Duration::from_secs(10))
}

fn next_event(events: &flume::Receiver<SequencerEvent>) -> SequencerEvent {
    events
        .recv_timeout(EVENT_TIMEOUT)
        .expect("sequencer event")
}

#[test]
fn commands_are_executed_in_order() -> offboard_lib::Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::fast()));
    let sequencer = SequencerHandle::spawn(link.clone(), config())?;
    let events = sequencer.events();

    let commands = [
        Command::Takeoff,
        Command::MoveLeft,
        Command::RotateRight,
        Command::Climb,
        Command::Land,
    ];
    for command in commands {
        sequencer.send(command)?;
    }

    assert_eq!(next_event(&events), SequencerEvent::Ready);
    for command in commands {
        assert_eq!(next_event(&events), SequencerEvent::Completed(command));
    }

    let state = link.state();
    assert!(!state.in_air);
    assert_abs_diff_eq!(state.position_velocity.position.east_m, 2.0, epsilon = 0.01);
    assert_abs_diff_eq!(state.attitude.yaw_deg, 90.0, epsilon = 0.01);

    sequencer.shutdown();
    assert_eq!(next_event(&events), SequencerEvent::Stopped);
    Ok(())
}

#[test]
fn failed_command_keeps_the_sequencer_running() -> offboard_lib::Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::fast()));
    let sequencer = SequencerHandle::spawn(link.clone(), config())?;
    let events = sequencer.events();

    sequencer.send(Command::MoveLeft)?;
    sequencer.send(Command::Takeoff)?;

    assert_eq!(next_event(&events), SequencerEvent::Ready);
    assert_eq!(
        next_event(&events),
        SequencerEvent::Failed {
            command: Command::MoveLeft,
            reason: Error::NotFlying
        }
    );
    assert_eq!(next_event(&events), SequencerEvent::Completed(Command::Takeoff));
    assert!(link.state().in_air);

    // Still flying: shutting down lands first
    sequencer.shutdown();
    assert_eq!(next_event(&events), SequencerEvent::Stopped);
    let state = link.state();
    assert!(!state.in_air);
    assert!(!state.connected);
    Ok(())
}

#[test]
fn shutdown_discards_pending_commands() -> offboard_lib::Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::fast()));
    let sequencer = SequencerHandle::spawn(link.clone(), config())?;
    let events = sequencer.events();

    sequencer.send(Command::Takeoff)?;
    for _ in 0..5 {
        sequencer.send(Command::MoveLeft)?;
    }
    assert_eq!(next_event(&events), SequencerEvent::Ready);
    sequencer.shutdown();

    let remaining: Vec<_> = events.try_iter().collect();
    assert_eq!(remaining.last(), Some(&SequencerEvent::Stopped));
    assert!(!remaining.contains(&SequencerEvent::Completed(Command::MoveLeft)));
    assert!(!link.state().in_air);
    Ok(())
}

#[test]
fn dropping_the_handle_stops_the_thread() -> offboard_lib::Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::fast()));
    let sequencer = SequencerHandle::spawn(link, config())?;
    let events = sequencer.events();

    assert_eq!(next_event(&events), SequencerEvent::Ready);
    drop(sequencer);

    assert_eq!(next_event(&events), SequencerEvent::Stopped);
    Ok(())
}

#[test]
fn connection_failure_aborts() -> offboard_lib::Result<()> {
    init_logger();
    let link = Arc::new(SimulatedLink::new(SimConfig::fast()));
    let sequencer =
        SequencerHandle::spawn(link, config().with_system_address("bluetooth://drone"))?;
    let events = sequencer.events();

    assert_eq!(
        next_event(&events),
        SequencerEvent::Aborted(Error::InvalidAddress("bluetooth://drone".to_owned()))
    );
    assert_eq!(next_event(&events), SequencerEvent::Stopped);
    sequencer.shutdown();
    Ok(())
}

#[test]
fn shutdown_while_connecting_returns_promptly() -> offboard_lib::Result<()> {
    init_logger();
    // Health never turns good within the test
    let sim = SimConfig {
        health_delay: Duration::from_secs(600),
        ..SimConfig::fast()
    };
    let link = Arc::new(SimulatedLink::new(sim));
    let sequencer = SequencerHandle::spawn(link.clone(), config())?;
    let events = sequencer.events();
    sequencer.send(Command::Takeoff)?;

    let started = Instant::now();
    sequencer.shutdown();
    assert!(started.elapsed() < Duration::from_secs(5));

    let remaining: Vec<_> = events.try_iter().collect();
    assert_eq!(remaining, vec![SequencerEvent::Stopped]);
    let state = link.state();
    assert!(!state.connected);
    assert!(!state.armed);
    Ok(())
}
