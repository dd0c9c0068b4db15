//! World bookkeeping for the trefoil portal.
//!
//! The portal's rim is the trefoil `(sin t + 2 sin 2t, cos t - 2 cos 2t, sin 3t)`.
//! Its shadow on the xy-plane is the zero set of the quartic
//! `4r⁴ - 12r²y + 16y³ - 27r² + 27` (with `r² = x² + y²`), and the knot sits on
//! the torus `z² = 1 - (r² - 5)² / 16`, so the shadow plus a sign pins down the
//! knot's height anywhere along it.
//!
//! The sign and the diagram arc both come from [`PlanarPartition`]: the lines
//! `x = 0`, `x = y√3`, `x = -y√3` and the circle `r = 1.5` split the plane into
//! twelve cells, and the knot's z is negative in cells where an odd number of
//! the half-plane/disc tests hold.
//!
//! Walking under arc `A`, `B` or `C` maps world `w` to `1 - w`, `5 - w` or
//! `3 - w` (mod 6). Each arc is an involution on the worlds:
//!
//! | arc | pairs          |
//! |-----|----------------|
//! | A   | 0↔1, 2↔5, 3↔4  |
//! | B   | 0↔5, 1↔4, 2↔3  |
//! | C   | 0↔3, 1↔2, 4↔5  |

use crate::error::PortalError;
use crate::solvers::quartic;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of worlds reachable through the portal.
pub const WORLD_COUNT: u8 = 6;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// r² of the inner circle `r = 1.5`.
const INNER_RADIUS_SQ: f64 = 2.25;

/// Euclidean remainder in `0..modulus`; `modulus` must be positive.
pub(crate) fn euclid_mod(value: i64, modulus: i64) -> i64 {
    debug_assert!(modulus > 0, "modulus must be positive, got {modulus}");
    let rem = value % modulus;
    if rem < 0 {
        rem + modulus
    } else {
        rem
    }
}

/// One of the six worlds, always in `0..6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct World(u8);

impl World {
    pub const ALL: [World; WORLD_COUNT as usize] =
        [World(0), World(1), World(2), World(3), World(4), World(5)];

    pub fn new(index: i32) -> Result<Self, PortalError> {
        if (0..i32::from(WORLD_COUNT)).contains(&index) {
            Ok(World(index as u8))
        } else {
            Err(PortalError::WorldOutOfRange(index))
        }
    }

    /// Folds any integer onto its world, treating indices cyclically.
    pub fn from_raw(raw: i64) -> Self {
        World(euclid_mod(raw, i64::from(WORLD_COUNT)) as u8)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    fn raw(self) -> i64 {
        i64::from(self.0)
    }
}

impl TryFrom<i32> for World {
    type Error = PortalError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        World::new(value)
    }
}

impl From<World> for i32 {
    fn from(world: World) -> Self {
        i32::from(world.0)
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three strands of the knot diagram (A = top left, B = right, C = bottom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arc {
    A,
    B,
    C,
}

impl Arc {
    /// Reflection constant: passing under the arc sends world `w` to `value - w`.
    pub fn value(self) -> i64 {
        match self {
            Arc::A => 1,
            Arc::B => 5,
            Arc::C => 3,
        }
    }

    pub fn reflect(self, raw: i64) -> i64 {
        self.value() - raw
    }

    /// Inside r = 1.5 each sector shows the next arc along the knot.
    fn inward(self) -> Self {
        match self {
            Arc::A => Arc::C,
            Arc::B => Arc::A,
            Arc::C => Arc::B,
        }
    }
}

/// The four inequalities evaluated at one planar point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanarPartition {
    /// (1) `x > 0`
    pub east: bool,
    /// (2) `x < y√3`
    pub northwest: bool,
    /// (3) `x < -y√3`
    pub southwest: bool,
    /// (4) `r > 1.5`
    pub outer: bool,
}

impl PlanarPartition {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            east: x > 0.0,
            northwest: x < y * SQRT_3,
            southwest: x < -y * SQRT_3,
            outer: x * x + y * y > INNER_RADIUS_SQ,
        }
    }

    pub fn parity_is_odd(&self) -> bool {
        let holding = [self.east, self.northwest, self.southwest, self.outer]
            .iter()
            .filter(|&&test| test)
            .count();
        holding % 2 == 1
    }

    /// Sign of the knot surface's z over this region.
    pub fn surface_sign(&self) -> f64 {
        if self.parity_is_odd() {
            -1.0
        } else {
            1.0
        }
    }

    pub fn arc(&self) -> Arc {
        let arc = match (self.east, self.northwest, self.southwest) {
            (false, true, _) => Arc::A,
            (true, _, false) => Arc::B,
            _ => Arc::C,
        };
        if self.outer {
            arc
        } else {
            arc.inward()
        }
    }
}

/// Signed height of the knot surface above `(x, y)`.
///
/// Off the torus shadow the square root's argument is clamped at zero.
pub fn surface_height(x: f64, y: f64) -> f64 {
    let rr = x * x + y * y;
    let partition = PlanarPartition::at(x, y);
    let base = (1.0 - (rr - 5.0) * (rr - 5.0) / 16.0).max(0.0).sqrt();
    base * partition.surface_sign()
}

/// Coefficients (ascending powers of t) of the shadow quartic along the
/// segment, with t measured in planar arc length, plus that planar length.
///
/// Returns `None` when the segment has no planar extent.
#[rustfmt::skip]
pub fn projection_quartic(start: &Vector3<f64>, end: &Vector3<f64>) -> Option<(f64, [f64; 5])> {
    let mut v = (end - start).xy();
    let t_max = v.norm();
    if !(t_max > 0.0) || !t_max.is_finite() {
        return None;
    }
    v /= t_max;

    // x(t) = x[0] + x[1]·t, y(t) = y[0] + y[1]·t
    let x = [start.x, v.x];
    let y = [start.y, v.y];

    // r²(t)
    let rr = [
              x[0] * x[0] +       y[0] * y[0],
        2.0 * x[0] * x[1] + 2.0 * y[0] * y[1],
              x[1] * x[1] +       y[1] * y[1],
    ];

    let poly = [
        4.0 * (      rr[0] * rr[0]                ) - 12.0 * (rr[0] * y[0]               ) + 16.0 * y[0] * y[0] * y[0] - 27.0 * rr[0] + 27.0,
        4.0 * (2.0 * rr[0] * rr[1]                ) - 12.0 * (rr[1] * y[0] + rr[0] * y[1]) + 48.0 * y[0] * y[0] * y[1] - 27.0 * rr[1],
        4.0 * (2.0 * rr[0] * rr[2] + rr[1] * rr[1]) - 12.0 * (rr[2] * y[0] + rr[1] * y[1]) + 48.0 * y[0] * y[1] * y[1] - 27.0 * rr[2],
        4.0 * (2.0 * rr[1] * rr[2]                ) - 12.0 * (               rr[2] * y[1]) + 16.0 * y[1] * y[1] * y[1],
        4.0 * (      rr[2] * rr[2]                ),
    ];

    Some((t_max, poly))
}

/// A point where a segment passes under the knot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Planar distance from the segment start.
    pub t: f64,
    pub position: Vector3<f64>,
    pub arc: Arc,
}

/// The crossings of one segment, in order along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossings {
    items: [Option<Crossing>; 4],
    len: usize,
}

impl Crossings {
    fn new() -> Self {
        Self {
            items: [None; 4],
            len: 0,
        }
    }

    fn push(&mut self, crossing: Crossing) {
        self.items[self.len] = Some(crossing);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Crossing> {
        self.items.iter().flatten()
    }
}

/// Finds where the straight segment `start → end` passes under the knot.
///
/// Only shadow intersections strictly inside the segment count, and only
/// those where the segment is below the knot surface there.
pub fn crossings(start: &Vector3<f64>, end: &Vector3<f64>) -> Crossings {
    let mut found = Crossings::new();
    let Some((t_max, poly)) = projection_quartic(start, end) else {
        return found;
    };

    let roots = quartic(
        poly[3] / poly[4],
        poly[2] / poly[4],
        poly[1] / poly[4],
        poly[0] / poly[4],
    );

    for root in roots.iter() {
        if !(0.0 < root && root < t_max) {
            continue;
        }

        let position = start.lerp(end, root / t_max);
        if position.z < surface_height(position.x, position.y) {
            let partition = PlanarPartition::at(position.x, position.y);
            let arc = partition.arc();
            log::trace!("passing under arc {arc:?} at t = {root}: {partition:?}");
            found.push(Crossing {
                t: root,
                position,
                arc,
            });
        }
    }

    found
}

/// Moves `world` along the segment `start → end`.
///
/// Every passage under an arc reflects the world through that arc. Returns the
/// number of passages.
pub fn travel(world: &mut World, start: &Vector3<f64>, end: &Vector3<f64>) -> usize {
    let found = crossings(start, end);
    if found.is_empty() {
        return 0;
    }

    let raw = found
        .iter()
        .fold(world.raw(), |raw, crossing| crossing.arc.reflect(raw));
    *world = World::from_raw(raw);
    found.len()
}

/// World seen at `point` when looking from `eye`, for a surface whose
/// reference point is `target` (a triangle's center, a ball's center).
pub fn resolve_sample(
    eye_world: World,
    eye: &Vector3<f64>,
    point: &Vector3<f64>,
    target: &Vector3<f64>,
) -> World {
    let mut world = eye_world;
    travel(&mut world, eye, point);
    travel(&mut world, point, target);
    world
}

/// Inputs for one rendered sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub eye_world: World,
    pub eye: Vector3<f64>,
    pub point: Vector3<f64>,
    pub target: Vector3<f64>,
}

impl Sample {
    pub fn resolve(&self) -> World {
        resolve_sample(self.eye_world, &self.eye, &self.point, &self.target)
    }
}

/// Resolves independent samples; runs on the rayon pool with `parallel`.
pub fn resolve_batch(samples: &[Sample]) -> Vec<World> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        samples.par_iter().map(Sample::resolve).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        samples.iter().map(Sample::resolve).collect()
    }
}

/// Reads a point from a flat slice of three finite coordinates.
pub fn point_from_slice(coords: &[f64]) -> Result<Vector3<f64>, PortalError> {
    if coords.len() != 3 {
        return Err(PortalError::InvalidPoint { len: coords.len() });
    }
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(PortalError::NonFinitePoint);
    }
    Ok(Vector3::new(coords[0], coords[1], coords[2]))
}
