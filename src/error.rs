use std::fmt;

use crate::link::{ActionResult, OffboardResult};

/// [Result] alias for return types of the crate API
pub type Result<T> = std::result::Result<T, Error>;

/// Error enum type
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The system address could not be understood. The String contains the address.
    InvalidAddress(String),
    /// An argument is out of range. The String contains the reason.
    InvalidArgument(String),
    /// An action command (arm, takeoff, land, ...) was rejected by the flight controller.
    ///
    /// Contains the command name and the result code returned.
    ActionRejected(&'static str, ActionResult),
    /// Offboard mode could not be started or stopped.
    ///
    /// The numeric code is available with [OffboardResult::code()].
    OffboardRejected(OffboardResult),
    /// A motion command was issued while the vehicle is not flying in offboard mode.
    NotFlying,
    /// A takeoff was requested while the vehicle is already flying.
    AlreadyFlying,
    /// The link is currently disconnected.
    Disconnected,
    /// Operation timed out waiting for the flight controller.
    Timeout,
    /// The vehicle did not reach the commanded setpoint in time. The String describes the target.
    NotConverged(String),
    /// Error with the async runtime or threads.
    SystemError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAddress(address) => write!(f, "invalid system address \"{}\"", address),
            Error::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
            Error::ActionRejected(command, result) => {
                write!(f, "{} rejected: {:?} (code {})", command, result, result.code())
            }
            Error::OffboardRejected(result) => {
                write!(f, "offboard rejected: {:?} (code {})", result, result.code())
            }
            Error::NotFlying => write!(f, "vehicle is not flying in offboard mode"),
            Error::AlreadyFlying => write!(f, "vehicle is already flying"),
            Error::Disconnected => write!(f, "link disconnected"),
            Error::Timeout => write!(f, "timed out waiting for the flight controller"),
            Error::NotConverged(target) => write!(f, "setpoint not reached in time: {}", target),
            Error::SystemError(reason) => write!(f, "system error: {}", reason),
        }
    }
}

impl std::error::Error for Error {}

impl From<flume::RecvError> for Error {
    fn from(_: flume::RecvError) -> Self {
        self::Error::Disconnected
    }
}

impl<T> From<flume::SendError<T>> for Error {
    fn from(_: flume::SendError<T>) -> Self {
        self::Error::Disconnected
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        self::Error::Timeout
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::SystemError(format!("{}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offboard_rejection_reports_numeric_code() {
        let error = Error::OffboardRejected(OffboardResult::NoSetpointSet);
        assert_eq!(error.to_string(), "offboard rejected: NoSetpointSet (code 7)");
    }

    #[test]
    fn action_rejection_names_the_command() {
        let error = Error::ActionRejected("arm", ActionResult::CommandDenied);
        assert_eq!(error.to_string(), "arm rejected: CommandDenied (code 5)");
    }
}
