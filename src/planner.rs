//! # Relative motion planner
//!
//! Computes the absolute setpoint to send to the flight controller from the current position
//! snapshot and a requested relative motion. Every axis that is not part of the motion is
//! copied unchanged from the snapshot.
//!
//! Conventions used for the relative moves:
//!  - **Left** increases the East coordinate, **Right** decreases it
//!  - **Forward** increases the North coordinate, **Backward** decreases it
//!  - **Up** decreases the Down coordinate
//!  - **Rotate left** decreases the yaw, **rotate right** increases it
//!
//! Magnitudes are not validated nor clamped: limiting the motion to what the airframe can do
//! is the job of the flight controller.
//!
//! ```
//! use offboard_lib::ned::PositionNed;
//! use offboard_lib::planner::{plan_move, Direction};
//!
//! let current = PositionNed::new(0.0, 0.0, -5.0);
//! let setpoint = plan_move(current, Direction::Left, 4.0, 0.0);
//! assert_eq!(setpoint.position, PositionNed::new(0.0, 4.0, -5.0));
//! ```

use crate::angle::normalize_yaw;
use crate::ned::{PositionNed, Setpoint};

/// Direction of a relative translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward +East
    Left,
    /// Toward -East
    Right,
    /// Toward +North
    Forward,
    /// Toward -North
    Backward,
    /// Away from the ground
    Up,
    /// Toward the ground
    Down,
}

/// Direction of a relative yaw rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Decreases the yaw
    Left,
    /// Increases the yaw
    Right,
}

impl Rotation {
    fn signed(self, degrees: f32) -> f32 {
        match self {
            Rotation::Left => -degrees,
            Rotation::Right => degrees,
        }
    }
}

/// Shift the East coordinate by `signed_offset_m`, positive is left.
pub fn plan_lateral(current: PositionNed, signed_offset_m: f32, yaw_deg: f32) -> Setpoint {
    let position = PositionNed {
        east_m: current.east_m + signed_offset_m,
        ..current
    };
    Setpoint::new(position, yaw_deg)
}

/// Shift the North coordinate by `signed_offset_m`, positive is forward.
pub fn plan_longitudinal(current: PositionNed, signed_offset_m: f32, yaw_deg: f32) -> Setpoint {
    let position = PositionNed {
        north_m: current.north_m + signed_offset_m,
        ..current
    };
    Setpoint::new(position, yaw_deg)
}

/// Climb by `signed_climb_m`, positive is up.
pub fn plan_vertical(current: PositionNed, signed_climb_m: f32, yaw_deg: f32) -> Setpoint {
    let position = PositionNed {
        down_m: current.down_m - signed_climb_m,
        ..current
    };
    Setpoint::new(position, yaw_deg)
}

/// Translate by `distance_m` in `direction`, holding the yaw.
pub fn plan_move(
    current: PositionNed,
    direction: Direction,
    distance_m: f32,
    yaw_deg: f32,
) -> Setpoint {
    match direction {
        Direction::Left => plan_lateral(current, distance_m, yaw_deg),
        Direction::Right => plan_lateral(current, -distance_m, yaw_deg),
        Direction::Forward => plan_longitudinal(current, distance_m, yaw_deg),
        Direction::Backward => plan_longitudinal(current, -distance_m, yaw_deg),
        Direction::Up => plan_vertical(current, distance_m, yaw_deg),
        Direction::Down => plan_vertical(current, -distance_m, yaw_deg),
    }
}

/// Rotate in place: the position is returned verbatim and the yaw becomes
/// `normalize_yaw(current_yaw_deg + signed_degrees)`.
pub fn plan_rotation(
    current: PositionNed,
    current_yaw_deg: f32,
    signed_degrees: f32,
) -> (PositionNed, f32) {
    (current, normalize_yaw(current_yaw_deg + signed_degrees))
}

/// Rotate in place by `degrees` in the direction of `rotation`.
pub fn plan_rotate(
    current: PositionNed,
    current_yaw_deg: f32,
    rotation: Rotation,
    degrees: f32,
) -> Setpoint {
    let (position, yaw_deg) = plan_rotation(current, current_yaw_deg, rotation.signed(degrees));
    Setpoint::new(position, yaw_deg)
}

/// Replace the Down coordinate so the position sits `altitude_m` above the origin.
pub fn hold_altitude(current: PositionNed, altitude_m: f32) -> PositionNed {
    PositionNed {
        down_m: -altitude_m,
        ..current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn odd_position() -> PositionNed {
        PositionNed::new(0.1 + 0.2, -1.0e-7, -4.999_999)
    }

    #[test]
    fn lateral_changes_only_east() {
        let current = odd_position();
        let setpoint = plan_lateral(current, 2.5, 33.0);
        assert_eq!(setpoint.position.north_m.to_bits(), current.north_m.to_bits());
        assert_eq!(setpoint.position.down_m.to_bits(), current.down_m.to_bits());
        assert_eq!(setpoint.position.east_m, current.east_m + 2.5);
        assert_eq!(setpoint.yaw_deg, 33.0);
    }

    #[test]
    fn left_and_right_round_trip() {
        let start = PositionNed::new(0.0, 0.0, -5.0);
        let left = plan_move(start, Direction::Left, 4.0, 0.0);
        assert_eq!(left.position, PositionNed::new(0.0, 4.0, -5.0));
        let back = plan_move(left.position, Direction::Right, 4.0, 0.0);
        assert_eq!(back.position, start);
    }

    #[test]
    fn forward_and_backward_change_only_north() {
        let start = PositionNed::new(1.0, 2.0, -3.0);
        let forward = plan_move(start, Direction::Forward, 1.5, -90.0);
        assert_eq!(forward.position, PositionNed::new(2.5, 2.0, -3.0));
        assert_eq!(forward.yaw_deg, -90.0);
        let backward = plan_move(start, Direction::Backward, 1.5, -90.0);
        assert_eq!(backward.position, PositionNed::new(-0.5, 2.0, -3.0));
    }

    #[test]
    fn up_decreases_down() {
        let start = PositionNed::new(1.0, 2.0, -3.0);
        assert_eq!(
            plan_move(start, Direction::Up, 2.0, 0.0).position,
            PositionNed::new(1.0, 2.0, -5.0)
        );
        assert_eq!(
            plan_move(start, Direction::Down, 2.0, 0.0).position,
            PositionNed::new(1.0, 2.0, -1.0)
        );
    }

    #[test]
    fn rotation_keeps_position_and_wraps_yaw() {
        let current = odd_position();
        let (position, yaw) = plan_rotation(current, 170.0, 20.0);
        assert_eq!(position, current);
        assert_eq!(position.north_m.to_bits(), current.north_m.to_bits());
        assert_eq!(yaw, -170.0);
    }

    #[test]
    fn rotate_left_then_right_round_trip() {
        let current = PositionNed::new(0.0, 0.0, -5.0);
        let left = plan_rotate(current, 0.0, Rotation::Left, 90.0);
        assert_eq!(left.yaw_deg, -90.0);
        let right = plan_rotate(left.position, left.yaw_deg, Rotation::Right, 90.0);
        assert_eq!(right.yaw_deg, 0.0);
        assert_eq!(right.position, current);
    }

    #[test]
    fn large_magnitudes_are_not_clamped() {
        let current = PositionNed::new(0.0, 0.0, -5.0);
        assert_eq!(plan_lateral(current, 1.0e4, 0.0).position.east_m, 1.0e4);
        let (_, yaw) = plan_rotation(current, 0.0, 3.0 * 360.0 + 45.0);
        assert_eq!(yaw, 45.0);
    }

    #[test]
    fn hold_altitude_overrides_down_only() {
        let current = PositionNed::new(3.0, -2.0, -4.7);
        assert_eq!(hold_altitude(current, 5.0), PositionNed::new(3.0, -2.0, -5.0));
    }
}
