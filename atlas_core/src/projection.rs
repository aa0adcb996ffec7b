//! Forward/inverse coordinate transforms between parent and new map space.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Bounds, Point};

/// A coordinate mapping from parent-map space into new-map space together
/// with its exact inverse.
pub trait Projection: Send + Sync {
    fn forward(&self, point: Point) -> Point;
    fn inverse(&self, point: Point) -> Point;
}

impl<P: Projection + ?Sized> Projection for Box<P> {
    fn forward(&self, point: Point) -> Point {
        (**self).forward(point)
    }

    fn inverse(&self, point: Point) -> Point {
        (**self).inverse(point)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn forward(&self, point: Point) -> Point {
        point
    }

    fn inverse(&self, point: Point) -> Point {
        point
    }
}

/// Axis-aligned zoom and pan: `new = (parent - origin) * zoom`.
///
/// `origin` is the parent-space coordinate that lands on the new map's
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineProjection {
    pub origin: Point,
    pub zoom_x: f64,
    pub zoom_y: f64,
}

impl AffineProjection {
    pub fn translate(dx: f64, dy: f64) -> Self {
        Self {
            origin: Point::new(-dx, -dy),
            zoom_x: 1.0,
            zoom_y: 1.0,
        }
    }

    /// Stretch the parent extent onto a new extent.
    pub fn fit(parent: Bounds, target: Bounds) -> Self {
        Self {
            origin: Point::default(),
            zoom_x: target.width / parent.width,
            zoom_y: target.height / parent.height,
        }
    }

    /// Show the `window` of the parent (origin + size) on the full target extent.
    pub fn window(origin: Point, window: Bounds, target: Bounds) -> Self {
        Self {
            origin,
            zoom_x: target.width / window.width,
            zoom_y: target.height / window.height,
        }
    }
}

impl Projection for AffineProjection {
    fn forward(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.origin.x) * self.zoom_x,
            (point.y - self.origin.y) * self.zoom_y,
        )
    }

    fn inverse(&self, point: Point) -> Point {
        Point::new(
            point.x / self.zoom_x + self.origin.x,
            point.y / self.zoom_y + self.origin.y,
        )
    }
}

/// Projection backed by a pair of closures.
pub struct FnProjection<F, I> {
    forward: F,
    inverse: I,
}

impl<F, I> FnProjection<F, I>
where
    F: Fn(Point) -> Point + Send + Sync,
    I: Fn(Point) -> Point + Send + Sync,
{
    pub fn new(forward: F, inverse: I) -> Self {
        Self { forward, inverse }
    }
}

impl<F, I> fmt::Debug for FnProjection<F, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProjection").finish_non_exhaustive()
    }
}

impl<F, I> Projection for FnProjection<F, I>
where
    F: Fn(Point) -> Point + Send + Sync,
    I: Fn(Point) -> Point + Send + Sync,
{
    fn forward(&self, point: Point) -> Point {
        (self.forward)(point)
    }

    fn inverse(&self, point: Point) -> Point {
        (self.inverse)(point)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("projection produced a non-finite coordinate for ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
    #[error(
        "projection is not invertible at ({x}, {y}): round trip landed {error} away (tolerance {tolerance})"
    )]
    NotInvertible {
        x: f64,
        y: f64,
        error: f64,
        tolerance: f64,
    },
}

/// Probe `projection` on a `probes × probes` lattice over `bounds` and
/// check that `forward(inverse(p))` returns to `p` within `tolerance`.
///
/// New-map space is probed because every sampled point starts there.
pub fn check_invertible(
    projection: &dyn Projection,
    bounds: Bounds,
    probes: usize,
    tolerance: f64,
) -> Result<(), ProjectionError> {
    let probes = probes.max(2);
    let step_x = bounds.width / (probes - 1) as f64;
    let step_y = bounds.height / (probes - 1) as f64;
    for row in 0..probes {
        for col in 0..probes {
            let point = Point::new(col as f64 * step_x, row as f64 * step_y);
            let parent = projection.inverse(point);
            if !parent.is_finite() {
                return Err(ProjectionError::NonFinite {
                    x: point.x,
                    y: point.y,
                });
            }
            let back = projection.forward(parent);
            if !back.is_finite() {
                return Err(ProjectionError::NonFinite {
                    x: parent.x,
                    y: parent.y,
                });
            }
            let error = back.distance(point);
            if error > tolerance {
                return Err(ProjectionError::NotInvertible {
                    x: point.x,
                    y: point.y,
                    error,
                    tolerance,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine_window_round_trips() {
        let projection = AffineProjection::window(
            Point::new(100.0, 50.0),
            Bounds::new(200.0, 100.0),
            Bounds::new(800.0, 400.0),
        );
        let parent = Point::new(150.0, 75.0);
        let projected = projection.forward(parent);
        assert_eq!(projected, Point::new(200.0, 100.0));
        assert_eq!(projection.inverse(projected), parent);
        assert!(check_invertible(&projection, Bounds::new(800.0, 400.0), 8, 0.01).is_ok());
    }

    #[test]
    fn translate_shifts_forward() {
        let projection = AffineProjection::translate(15.0, 0.0);
        assert_eq!(projection.forward(Point::new(10.0, 10.0)), Point::new(25.0, 10.0));
        assert_eq!(projection.inverse(Point::new(25.0, 10.0)), Point::new(10.0, 10.0));
    }

    #[test]
    fn mismatched_inverse_is_rejected() {
        let projection = FnProjection::new(
            |p: Point| Point::new(p.x * 2.0, p.y),
            |p: Point| Point::new(p.x, p.y),
        );
        let err = check_invertible(&projection, Bounds::new(10.0, 10.0), 4, 0.01)
            .expect_err("inverse does not undo forward");
        assert!(matches!(err, ProjectionError::NotInvertible { .. }));
    }

    #[test]
    fn non_finite_projection_is_rejected() {
        let projection = FnProjection::new(|p: Point| p, |_p: Point| Point::new(f64::NAN, 0.0));
        let err = check_invertible(&projection, Bounds::new(10.0, 10.0), 4, 0.01)
            .expect_err("NaN coordinates are fatal");
        assert!(matches!(err, ProjectionError::NonFinite { .. }));
    }
}
