//! Parametric description of the trefoil knot bounding the portal.

use crate::portal::Arc;
use nalgebra::Vector3;
use std::f64::consts::TAU;

/// Radius of the tube drawn around the knot.
pub const TUBE_RADIUS: f64 = 0.2;

/// Parameter steps per full loop of the knot when it is meshed.
pub const LOOP_STEPS: usize = 96;

pub fn curve(t: f64) -> Vector3<f64> {
    Vector3::new(
        t.sin() + 2.0 * (2.0 * t).sin(),
        t.cos() - 2.0 * (2.0 * t).cos(),
        (3.0 * t).sin(),
    )
}

pub fn derivative(t: f64) -> Vector3<f64> {
    Vector3::new(
        t.cos() + 4.0 * (2.0 * t).cos(),
        -t.sin() + 4.0 * (2.0 * t).sin(),
        3.0 * (3.0 * t).cos(),
    )
}

/// Point on the tube around the knot.
///
/// `theta` turns around the knot, starting straight below it; theta = 0 lies
/// on the seam where the portal surface meets the tube.
pub fn tube(t: f64, theta: f64) -> Vector3<f64> {
    let d = derivative(t);
    let side = Vector3::new(d.y, -d.x, 0.0).normalize();
    let (s, c) = theta.sin_cos();
    curve(t) + TUBE_RADIUS * (side * s - Vector3::z() * c)
}

/// Diagram arc that contains the knot point at parameter `t`.
pub fn arc_at(t: f64) -> Arc {
    let step = (t.rem_euclid(TAU) / TAU * LOOP_STEPS as f64).floor() as usize;
    arc_at_step(step % LOOP_STEPS)
}

pub(crate) fn arc_at_step(step: usize) -> Arc {
    match step {
        28..=59 => Arc::C,
        60..=91 => Arc::A,
        _ => Arc::B,
    }
}

/// Left-hand side of the shadow quartic; zero on the knot's projection.
pub fn projection_residual(x: f64, y: f64) -> f64 {
    let rr = x * x + y * y;
    4.0 * rr * rr - 12.0 * rr * y + 16.0 * y * y * y - 27.0 * rr + 27.0
}
