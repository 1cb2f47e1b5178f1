//! # Yaw angle normalization
//!
//! Yaw setpoints sent to the flight controller are expressed in degrees from local North and
//! must lie in the canonical range (-180, 180]. Relative rotations are computed by adding a
//! signed delta to the current yaw and normalizing the sum:
//! ```
//! use offboard_lib::angle::normalize_yaw;
//!
//! assert_eq!(normalize_yaw(170.0 + 20.0), -170.0);
//! assert_eq!(normalize_yaw(-180.0), 180.0);
//! ```

/// Normalize an angle in degrees into (-180, 180].
///
/// The input is shifted by +180, reduced with an euclidean remainder into [0, 360) and shifted
/// back. The remainder alone gives [-180, 180): the `-180` representative is folded onto `180`
/// so that `normalize_yaw(180.0) == normalize_yaw(-180.0) == 180.0`.
///
/// Non-finite input returns NaN.
pub fn normalize_yaw(angle_deg: f32) -> f32 {
    let wrapped = (angle_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation, in degrees, bringing `current_deg` onto `target_deg`.
pub fn yaw_error(target_deg: f32, current_deg: f32) -> f32 {
    normalize_yaw(target_deg - current_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_in_range_are_unchanged() {
        for angle in [0.0, 1.5, -1.5, 90.0, -90.0, 179.5, -179.5, 180.0] {
            assert_eq!(normalize_yaw(angle), angle);
        }
    }

    #[test]
    fn concrete_cases() {
        assert_eq!(normalize_yaw(0.0), 0.0);
        assert_eq!(normalize_yaw(180.0), 180.0);
        assert_eq!(normalize_yaw(270.0), -90.0);
        assert_eq!(normalize_yaw(-270.0), 90.0);
        assert_eq!(normalize_yaw(190.0), -170.0);
        assert_eq!(normalize_yaw(360.0), 0.0);
    }

    #[test]
    fn boundary_folds_onto_positive_180() {
        assert_eq!(normalize_yaw(-180.0), 180.0);
        assert_eq!(normalize_yaw(-180.0), normalize_yaw(180.0));
        assert_eq!(normalize_yaw(540.0), 180.0);
        assert_eq!(normalize_yaw(-540.0), 180.0);
    }

    #[test]
    fn result_always_in_half_open_range() {
        let mut angle = -2000.0f32;
        while angle < 2000.0 {
            let normalized = normalize_yaw(angle);
            assert!(normalized > -180.0 && normalized <= 180.0, "{} -> {}", angle, normalized);
            angle += 7.25;
        }
    }

    #[test]
    fn periodic_over_full_turns() {
        for angle in [-179.0f32, -45.5, 0.0, 12.25, 135.0, 180.0] {
            for k in -5..=5 {
                let shifted = angle + 360.0 * k as f32;
                assert_eq!(normalize_yaw(shifted), normalize_yaw(angle), "k = {}", k);
            }
        }
    }

    #[test]
    fn idempotent() {
        let mut angle = -1000.0f32;
        while angle < 1000.0 {
            let once = normalize_yaw(angle);
            assert_eq!(normalize_yaw(once), once);
            angle += 3.3;
        }
    }

    #[test]
    fn non_finite_is_nan() {
        assert!(normalize_yaw(f32::NAN).is_nan());
        assert!(normalize_yaw(f32::INFINITY).is_nan());
    }

    #[test]
    fn yaw_error_takes_the_short_way() {
        assert_eq!(yaw_error(-170.0, 170.0), 20.0);
        assert_eq!(yaw_error(170.0, -170.0), -20.0);
        assert_eq!(yaw_error(90.0, 90.0), 0.0);
    }
}
