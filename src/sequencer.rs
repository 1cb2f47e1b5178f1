//! # Background command sequencer
//!
//! The sequencer runs on its own thread, with its own single threaded runtime, and is the sole
//! owner of the [FlightSession]. Other threads, typically a user interface, forward one-shot
//! [Command]s through a [SequencerHandle]. Commands are executed one at a time in the order
//! they were sent and the outcome of each is reported as a [SequencerEvent].
//!
//! [SequencerHandle::shutdown()] (or dropping the handle) stops the sequencer: commands still
//! queued are discarded, the vehicle lands if it is still in the air and the link is
//! disconnected before the thread is joined. A shutdown requested while the vehicle is still
//! being connected cancels the connection.
//!
//! ``` no_run
//! # fn panel() -> offboard_lib::Result<()> {
//! use std::sync::Arc;
//! use offboard_lib::config::FlightConfig;
//! use offboard_lib::sequencer::{Command, SequencerHandle};
//! use offboard_lib::sim::{SimConfig, SimulatedLink};
//!
//! let link = Arc::new(SimulatedLink::new(SimConfig::default()));
//! let sequencer = SequencerHandle::spawn(link, FlightConfig::default())?;
//!
//! sequencer.send(Command::Takeoff)?;
//! sequencer.send(Command::MoveLeft)?;
//! sequencer.send(Command::Land)?;
//!
//! for event in sequencer.events().iter() {
//!     println!("{}", event);
//! #   break;
//! }
//! sequencer.shutdown();
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{error, info, warn};

use crate::config::FlightConfig;
use crate::link::FlightLink;
use crate::planner::Direction;
use crate::session::FlightSession;
use crate::{Error, Result};

/// One-shot command, as sent by a button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Arm, take off and start offboard mode
    Takeoff,
    /// Leave offboard mode and land
    Land,
    /// Strafe left by the configured step
    MoveLeft,
    /// Strafe right by the configured step
    MoveRight,
    /// Move forward by the configured step
    MoveForward,
    /// Move backward by the configured step
    MoveBackward,
    /// Rotate left by the configured rotation step
    RotateLeft,
    /// Rotate right by the configured rotation step
    RotateRight,
    /// Raise the cruise altitude by the configured step
    Climb,
    /// Lower the cruise altitude by the configured step
    Descend,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Takeoff => "takeoff",
            Command::Land => "land",
            Command::MoveLeft => "move left",
            Command::MoveRight => "move right",
            Command::MoveForward => "move forward",
            Command::MoveBackward => "move backward",
            Command::RotateLeft => "rotate left",
            Command::RotateRight => "rotate right",
            Command::Climb => "climb",
            Command::Descend => "descend",
        };
        f.write_str(name)
    }
}

/// Report from the sequencer thread
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent {
    /// Connected and healthy, commands are now executed
    Ready,
    /// The vehicle could not be connected, the sequencer is stopping
    Aborted(Error),
    /// A command was executed
    Completed(Command),
    /// A command failed, the sequencer keeps accepting commands
    Failed {
        /// Command that failed
        command: Command,
        /// Why it failed
        reason: Error,
    },
    /// The sequencer thread is about to exit
    Stopped,
}

impl fmt::Display for SequencerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerEvent::Ready => write!(f, "ready"),
            SequencerEvent::Aborted(reason) => write!(f, "aborted: {}", reason),
            SequencerEvent::Completed(command) => write!(f, "{} completed", command),
            SequencerEvent::Failed { command, reason } => {
                write!(f, "{} failed: {}", command, reason)
            }
            SequencerEvent::Stopped => write!(f, "stopped"),
        }
    }
}

enum Request {
    Run(Command),
    Shutdown,
}

/// Handle to a running sequencer thread
///
/// See the [sequencer module documentation](crate::sequencer) for more context and information.
pub struct SequencerHandle {
    requests: flume::Sender<Request>,
    events: flume::Receiver<SequencerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl SequencerHandle {
    /// Start the sequencer thread.
    ///
    /// The thread connects `link` at `config.system_address` and waits for the vehicle to be
    /// healthy, then reports [SequencerEvent::Ready]. Commands sent before that are queued.
    pub fn spawn(link: Arc<dyn FlightLink>, config: FlightConfig) -> Result<Self> {
        let (requests_tx, requests_rx) = flume::unbounded();
        let (events_tx, events_rx) = flume::unbounded();

        let thread = std::thread::Builder::new()
            .name("sequencer".to_owned())
            .spawn(move || run(link, config, requests_rx, events_tx))?;

        Ok(Self {
            requests: requests_tx,
            events: events_rx,
            thread: Some(thread),
        })
    }

    /// Queue a command for execution
    ///
    /// Returns [Error::Disconnected] if the sequencer has stopped.
    pub fn send(&self, command: Command) -> Result<()> {
        self.requests.send(Request::Run(command))?;
        Ok(())
    }

    /// Receiver of the sequencer events
    pub fn events(&self) -> flume::Receiver<SequencerEvent> {
        self.events.clone()
    }

    /// Stop the sequencer and wait for its thread to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            info!("Stopping sequencer");
            // Fails only if the thread already exited
            let _ = self.requests.send(Request::Shutdown);
            if thread.join().is_err() {
                error!("Sequencer thread panicked");
            }
        }
    }
}

impl Drop for SequencerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    link: Arc<dyn FlightLink>,
    config: FlightConfig,
    requests: flume::Receiver<Request>,
    events: flume::Sender<SequencerEvent>,
) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();

    match runtime {
        Ok(runtime) => runtime.block_on(sequence(link, config, requests, &events)),
        Err(e) => {
            error!("Cannot start the sequencer runtime: {}", e);
            let _ = events.send(SequencerEvent::Aborted(e.into()));
        }
    }
    let _ = events.send(SequencerEvent::Stopped);
}

async fn sequence(
    link: Arc<dyn FlightLink>,
    config: FlightConfig,
    requests: flume::Receiver<Request>,
    events: &flume::Sender<SequencerEvent>,
) {
    let land_on_shutdown = config.land_on_shutdown;
    let mut pending = VecDeque::new();

    // Connecting waits for the vehicle health, a shutdown must not wait for it
    let connected = tokio::select! {
        result = FlightSession::connect(link.clone(), config) => Some(result),
        () = wait_for_shutdown(&requests, &mut pending) => None,
    };
    let mut session = match connected {
        Some(Ok(session)) => session,
        Some(Err(e)) => {
            error!("Sequencer could not connect: {}", e);
            let _ = events.send(SequencerEvent::Aborted(e));
            return;
        }
        None => {
            info!("Shutdown requested while connecting");
            for command in pending {
                info!("Discarding pending {}", command);
            }
            link.disconnect().await;
            return;
        }
    };
    let _ = events.send(SequencerEvent::Ready);

    loop {
        // A shutdown overtakes the commands queued while the last one was executing
        let mut shutdown = false;
        for request in requests.try_iter() {
            match request {
                Request::Run(command) => pending.push_back(command),
                Request::Shutdown => shutdown = true,
            }
        }
        if shutdown {
            break;
        }

        let command = match pending.pop_front() {
            Some(command) => command,
            None => match requests.recv_async().await {
                Ok(Request::Run(command)) => command,
                Ok(Request::Shutdown) | Err(_) => break,
            },
        };

        info!("Executing {}", command);
        let event = match execute(&mut session, command).await {
            Ok(()) => SequencerEvent::Completed(command),
            Err(reason) => {
                warn!("{} failed: {}", command, reason);
                SequencerEvent::Failed { command, reason }
            }
        };
        let _ = events.send(event);
    }

    let discarded = pending.into_iter().chain(requests.try_iter().filter_map(|r| match r {
        Request::Run(command) => Some(command),
        Request::Shutdown => None,
    }));
    for command in discarded {
        info!("Discarding pending {}", command);
    }

    if land_on_shutdown {
        match session.drone().telemetry.in_air().await {
            Ok(true) => {
                info!("Landing before shutdown");
                if let Err(e) = session.land().await {
                    error!("Landing on shutdown failed: {}", e);
                }
            }
            Ok(false) => (),
            Err(e) => warn!("Cannot tell if the vehicle is flying: {}", e),
        }
    }
    session.disconnect().await;
}

// Queue commands until a shutdown is requested or the handle is gone
async fn wait_for_shutdown(
    requests: &flume::Receiver<Request>,
    pending: &mut VecDeque<Command>,
) {
    while let Ok(request) = requests.recv_async().await {
        match request {
            Request::Run(command) => pending.push_back(command),
            Request::Shutdown => return,
        }
    }
}

async fn execute(session: &mut FlightSession, command: Command) -> Result<()> {
    let step_m = session.config().step_m;
    let rotation_step_deg = session.config().rotation_step_deg;

    match command {
        Command::Takeoff => {
            session.takeoff().await?;
        }
        Command::Land => session.land().await?,
        Command::MoveLeft => {
            session.move_left(step_m).await?;
        }
        Command::MoveRight => {
            session.move_right(step_m).await?;
        }
        Command::MoveForward => {
            session.move_forward(step_m).await?;
        }
        Command::MoveBackward => {
            session.move_backward(step_m).await?;
        }
        Command::RotateLeft => {
            session.rotate_left(rotation_step_deg).await?;
        }
        Command::RotateRight => {
            session.rotate_right(rotation_step_deg).await?;
        }
        Command::Climb => {
            session.move_by(Direction::Up, step_m).await?;
        }
        Command::Descend => {
            session.move_by(Direction::Down, step_m).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_display() {
        assert_eq!(
            SequencerEvent::Completed(Command::MoveLeft).to_string(),
            "move left completed"
        );
        assert_eq!(
            SequencerEvent::Failed {
                command: Command::RotateRight,
                reason: Error::NotFlying
            }
            .to_string(),
            format!("rotate right failed: {}", Error::NotFlying)
        );
    }
}
