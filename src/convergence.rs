//! # Waiting for the vehicle
//!
//! Sending a setpoint does not mean the vehicle is there. Instead of sleeping for a fixed
//! duration and hoping the controller has converged, the functions here poll the telemetry
//! until the measured state is within [Tolerance] of the target, and fail with
//! [Error::NotConverged] once `timeouts.convergence` has elapsed.

use std::future::Future;

use log::debug;
use tokio::time::sleep;

use crate::angle::yaw_error;
use crate::config::{Timeouts, Tolerance};
use crate::ned::{PositionNed, Setpoint};
use crate::subsystems::telemetry::Telemetry;
use crate::{Error, Result};

/// Is the measured position and yaw within `tolerance` of `target`?
pub fn is_converged(
    position: &PositionNed,
    yaw_deg: f32,
    target: &Setpoint,
    tolerance: &Tolerance,
) -> bool {
    position.distance_to(&target.position) <= tolerance.position_m
        && yaw_error(target.yaw_deg, yaw_deg).abs() <= tolerance.yaw_deg
}

// Call `probe` every poll interval until it yields a value
async fn poll_until<T, P, F>(timeouts: &Timeouts, target: String, mut probe: P) -> Result<T>
where
    P: FnMut() -> F,
    F: Future<Output = Result<Option<T>>>,
{
    let poll_interval = timeouts.poll_interval;
    let polling = async {
        loop {
            if let Some(value) = probe().await? {
                return Ok(value);
            }
            sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(timeouts.convergence, polling).await {
        Ok(result) => result,
        Err(_) => Err(Error::NotConverged(target)),
    }
}

/// Wait until the vehicle position and yaw are within `tolerance` of `target`.
pub async fn wait_for_setpoint(
    telemetry: &Telemetry,
    target: Setpoint,
    tolerance: Tolerance,
    timeouts: &Timeouts,
) -> Result<()> {
    poll_until(timeouts, target.to_string(), || async move {
        let position = telemetry.position_ned().await?;
        let attitude = telemetry.attitude_euler().await?;
        if is_converged(&position, attitude.yaw_deg, &target, &tolerance) {
            debug!("Reached {}", target);
            Ok::<_, Error>(Some(()))
        } else {
            Ok(None)
        }
    })
    .await
}

/// Wait until the vehicle is at least `altitude_m - tolerance.position_m` above the origin,
/// returns the position measured at that time.
pub async fn wait_for_altitude(
    telemetry: &Telemetry,
    altitude_m: f32,
    tolerance: Tolerance,
    timeouts: &Timeouts,
) -> Result<PositionNed> {
    poll_until(timeouts, format!("altitude {:.2} m", altitude_m), || async move {
        let position = telemetry.position_ned().await?;
        if position.altitude_m() >= altitude_m - tolerance.position_m {
            Ok::<_, Error>(Some(position))
        } else {
            Ok(None)
        }
    })
    .await
}

/// Wait until the vehicle reports being on the ground.
pub async fn wait_for_landing(telemetry: &Telemetry, timeouts: &Timeouts) -> Result<()> {
    poll_until(timeouts, "landed".to_owned(), || async move {
        if telemetry.in_air().await? {
            Ok::<_, Error>(None)
        } else {
            Ok(Some(()))
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converged_within_tolerance() {
        let target = Setpoint::new(PositionNed::new(0.0, 4.0, -5.0), 90.0);
        let tolerance = Tolerance {
            position_m: 0.1,
            yaw_deg: 2.0,
        };

        assert!(is_converged(&PositionNed::new(0.0, 3.95, -5.0), 89.0, &target, &tolerance));
        assert!(!is_converged(&PositionNed::new(0.0, 3.8, -5.0), 90.0, &target, &tolerance));
        assert!(!is_converged(&PositionNed::new(0.0, 4.0, -5.0), 85.0, &target, &tolerance));
    }

    #[test]
    fn yaw_tolerance_wraps_around_the_boundary() {
        let target = Setpoint::new(PositionNed::default(), 179.0);
        let tolerance = Tolerance {
            position_m: 0.1,
            yaw_deg: 3.0,
        };
        assert!(is_converged(&PositionNed::default(), -179.5, &target, &tolerance));
    }
}
