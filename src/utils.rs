use cgmath::Vector2;

/// Linearly maps `value` from `[in_start, in_end]` to `[out_start, out_end]`.
/// Not clamped; values outside the input range extrapolate.
pub fn range_map(value: f32, in_start: f32, in_end: f32, out_start: f32, out_end: f32) -> f32 {
    let fraction = (value - in_start) / (in_end - in_start);
    out_start + fraction * (out_end - out_start)
}

/// Fraction of the way `value` sits between `start` and `end`. Not clamped.
/// Returns 0.0 for a degenerate (zero-width) range.
pub fn fraction_within(value: f64, start: f64, end: f64) -> f64 {
    let width = end - start;
    if width == 0.0 {
        return 0.0;
    }
    (value - start) / width
}

pub fn lerp(start: f32, end: f32, fraction: f32) -> f32 {
    start + fraction * (end - start)
}

/// Normalizes an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(mut degrees: f32) -> f32 {
    degrees %= 360.0;
    if degrees < 0.0 {
        degrees += 360.0;
    }
    degrees
}

/// Normalizes an angle in degrees into `(0, 360]`. The player's orbit angle
/// lives in this range so a half-turn flip of exactly 180 stays stable.
pub fn normalize_degrees_exclusive(mut degrees: f32) -> f32 {
    while degrees <= 0.0 {
        degrees += 360.0;
    }
    while degrees > 360.0 {
        degrees -= 360.0;
    }
    degrees
}

/// Unit-circle point at `degrees`, scaled by `length`.
pub fn polar_degrees(degrees: f32, length: f32) -> Vector2<f32> {
    let radians = degrees.to_radians();
    Vector2::new(length * radians.cos(), length * radians.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_map_turn_angle() {
        // The path's turn-angle mapping: 2 beats -> -180, 0 beats -> +180.
        assert_eq!(range_map(2.0, 2.0, 0.0, -180.0, 180.0), -180.0);
        assert_eq!(range_map(0.0, 2.0, 0.0, -180.0, 180.0), 180.0);
        assert_eq!(range_map(1.0, 2.0, 0.0, -180.0, 180.0), 0.0);
    }

    #[test]
    fn test_fraction_within() {
        assert_eq!(fraction_within(2.5, 2.0, 3.0), 0.5);
        assert_eq!(fraction_within(4.0, 2.0, 3.0), 2.0);
        assert_eq!(fraction_within(1.0, 2.0, 2.0), 0.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
    }

    #[test]
    fn test_normalize_degrees_exclusive() {
        assert_eq!(normalize_degrees_exclusive(0.0), 360.0);
        assert_eq!(normalize_degrees_exclusive(360.0), 360.0);
        assert_eq!(normalize_degrees_exclusive(-90.0), 270.0);
        assert_eq!(normalize_degrees_exclusive(540.0), 180.0);
    }

    #[test]
    fn test_polar_degrees() {
        let v = polar_degrees(0.0, 2.0);
        assert!((v.x - 2.0).abs() < 1e-6 && v.y.abs() < 1e-6);
        let v = polar_degrees(90.0, 1.0);
        assert!(v.x.abs() < 1e-6 && (v.y - 1.0).abs() < 1e-6);
    }
}
