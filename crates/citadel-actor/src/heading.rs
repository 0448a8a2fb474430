//! Discrete heading arithmetic on the 32-step turn circle.

/// Number of discrete headings in a full turn.
pub const HEADING_STEPS: i32 = 32;

/// Rounds `direction` to the nearest step and wraps it into `[0, 32)`.
///
/// Equivalent to `((round(d) % 32) + 32) % 32`. Non-finite input maps to 0.
pub fn normalize_heading(direction: f64) -> i32 {
    if !direction.is_finite() {
        return 0;
    }
    (direction.round() as i64).rem_euclid(i64::from(HEADING_STEPS)) as i32
}

/// Circular distance between two headings, `min(|a-b|, 32-|a-b|)`.
///
/// Symmetric and never larger than 16.
pub fn heading_distance(a: i32, b: i32) -> i32 {
    let delta = (a - b).rem_euclid(HEADING_STEPS);
    delta.min(HEADING_STEPS - delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_wraps_negative() {
        assert_eq!(normalize_heading(-1.0), 31);
        assert_eq!(normalize_heading(-33.0), 31);
        assert_eq!(normalize_heading(32.0), 0);
        assert_eq!(normalize_heading(65.0), 1);
    }

    #[test]
    fn test_normalize_rounds() {
        assert_eq!(normalize_heading(3.4), 3);
        assert_eq!(normalize_heading(3.6), 4);
        assert_eq!(normalize_heading(31.7), 0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for d in -100..100 {
            let once = normalize_heading(f64::from(d));
            assert_eq!(normalize_heading(f64::from(once)), once);
        }
    }

    #[test]
    fn test_normalize_non_finite() {
        assert_eq!(normalize_heading(f64::NAN), 0);
        assert_eq!(normalize_heading(f64::INFINITY), 0);
    }

    #[test]
    fn test_distance_symmetric_and_bounded() {
        for a in 0..HEADING_STEPS {
            for b in 0..HEADING_STEPS {
                let d = heading_distance(a, b);
                assert_eq!(d, heading_distance(b, a));
                assert!((0..=16).contains(&d));
            }
        }
    }

    #[test]
    fn test_distance_wraps_around_zero() {
        assert_eq!(heading_distance(0, 3), 3);
        assert_eq!(heading_distance(0, 6), 6);
        assert_eq!(heading_distance(1, 31), 2);
        assert_eq!(heading_distance(0, 16), 16);
    }
}
