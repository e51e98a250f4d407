//! Level model: points to level.

/// Points needed per level step.
pub const POINTS_PER_LEVEL: f64 = 100.0;

/// `floor(max(0, points) / 100) + 1`. Negative, NaN and infinite input count as 0.
pub fn level_from_points(points: f64) -> u32 {
    let points = if points.is_finite() { points.max(0.0) } else { 0.0 };
    let steps = (points / POINTS_PER_LEVEL).floor();
    // Saturating float->int cast; levels beyond u32 are not reachable in practice.
    (steps as u32).saturating_add(1)
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_steps_every_hundred_points() {
        assert_eq!(level_from_points(0.0), 1);
        assert_eq!(level_from_points(99.99), 1);
        assert_eq!(level_from_points(100.0), 2);
        assert_eq!(level_from_points(250.5), 3);
    }

    #[test]
    fn level_treats_bad_input_as_zero() {
        assert_eq!(level_from_points(-40.0), 1);
        assert_eq!(level_from_points(f64::NAN), 1);
        assert_eq!(level_from_points(f64::INFINITY), 1);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(-2.345_6), -2.35);
        assert_eq!(round2(7.0), 7.0);
    }
}
