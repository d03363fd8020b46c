//! Listener-relative positions on the horizontal plane.
//!
//! The origin is the centre of the listener's head. `+x` is to the right,
//! `+y` is straight ahead. Units are abstract distance units ("meters").

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpatialError};

/// A 2D point relative to the listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// Lateral offset (positive = right).
    pub x: f64,
    /// Frontal offset (positive = ahead).
    pub y: f64,
}

impl Point2D {
    /// Creates a point, rejecting NaN and infinite coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NonFinitePoint`] if either coordinate is not finite.
    pub fn new(x: f64, y: f64) -> Result<Self> {
        let point = Self { x, y };
        point.validate()?;
        Ok(point)
    }

    /// The listener's head centre.
    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Checks that both coordinates are finite.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NonFinitePoint`] otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.x.is_finite() && self.y.is_finite() {
            Ok(())
        } else {
            Err(SpatialError::NonFinitePoint {
                x: self.x,
                y: self.y,
            })
        }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns this point rotated counter-clockwise about the origin.
    pub fn rotated(&self, theta_degrees: f64) -> Point2D {
        let (sin, cos) = theta_degrees.to_radians().sin_cos();
        Point2D {
            x: self.x * cos - self.y * sin,
            y: self.y * cos + self.x * sin,
        }
    }

    /// Azimuth in degrees measured as `atan2(x, y)`.
    ///
    /// 0° is straight ahead, positive angles are to the right and negative
    /// to the left. This is the convention the HRIR file selection is
    /// calibrated against.
    pub fn azimuth_degrees(&self) -> f64 {
        self.x.atan2(self.y).to_degrees()
    }
}

impl From<Point2D> for (f64, f64) {
    fn from(p: Point2D) -> Self {
        (p.x, p.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: Point2D, b: Point2D) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
            "expected {:?}, got {:?}",
            b,
            a
        );
    }

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(Point2D::new(1.0, 2.0).is_ok());
        assert!(matches!(
            Point2D::new(f64::NAN, 0.0),
            Err(SpatialError::NonFinitePoint { .. })
        ));
        assert!(Point2D::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_rotate_quarter_turn_is_counter_clockwise() {
        let p = Point2D::new(1.0, 0.0).unwrap();
        assert_close(p.rotated(90.0), Point2D { x: 0.0, y: 1.0 });
    }

    #[test]
    fn test_rotate_zero_and_full_turn() {
        let p = Point2D::new(300.0, -120.0).unwrap();
        assert_eq!(p.rotated(0.0), p);
        assert_close(p.rotated(360.0), p);
    }

    #[test]
    fn test_rotate_and_back() {
        let p = Point2D::new(-42.5, 17.0).unwrap();
        assert_close(p.rotated(73.0).rotated(-73.0), p);
    }

    #[test]
    fn test_rotation_preserves_distance() {
        let p = Point2D::new(3.0, 4.0).unwrap();
        let d = p.rotated(211.0).distance_to(&Point2D::origin());
        assert!((d - 5.0).abs() < EPS);
    }

    #[test]
    fn test_azimuth_convention() {
        assert!(Point2D { x: 0.0, y: 1.0 }.azimuth_degrees().abs() < EPS);
        assert!((Point2D { x: 1.0, y: 0.0 }.azimuth_degrees() - 90.0).abs() < EPS);
        assert!((Point2D { x: -1.0, y: 0.0 }.azimuth_degrees() + 90.0).abs() < EPS);
        assert_eq!(Point2D::origin().azimuth_degrees(), 0.0);
    }
}
