//! Static geometry of the portal scene.
//!
//! Every triangle carries one colour per world; whoever draws a sample picks
//! the entry for the world `portal::resolve_sample` reports.

use crate::portal::{Arc, World, WORLD_COUNT};
use crate::trefoil::{self, LOOP_STEPS};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

pub type Rgba = [f32; 4];

pub const TRANSPARENT: Rgba = [0.0, 0.0, 0.0, 0.0];

const RED: Rgba = [1.0, 0.0, 0.0, 1.0];
const GREEN: Rgba = [0.0, 1.0, 0.0, 1.0];
const BLUE: Rgba = [0.0, 0.0, 1.0, 1.0];
const GRAY: Rgba = [0.5, 0.5, 0.5, 1.0];

/// Rings around the tube per knot step.
const TUBE_SEGMENTS: usize = 12;

/// Half-extent of the sky tetrahedron and the ground quad.
const SCENE_EXTENT: f64 = 100.0;
const GROUND_HEIGHT: f64 = -2.0;

const BALL_RADIUS: f64 = 0.1;
const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// One colour per world, indexed by world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette(pub [Rgba; WORLD_COUNT as usize]);

impl Palette {
    pub fn uniform(color: Rgba) -> Self {
        Palette([color; WORLD_COUNT as usize])
    }

    /// Visible only from `world`.
    pub fn only_in(world: World, color: Rgba) -> Self {
        let mut colors = [TRANSPARENT; WORLD_COUNT as usize];
        colors[world.index()] = color;
        Palette(colors)
    }

    pub fn select(&self, world: World) -> Rgba {
        self.0[world.index()]
    }

    /// The tube takes the colouring of the arc it runs along.
    fn for_arc(arc: Arc) -> Self {
        match arc {
            Arc::A => Palette([RED, RED, BLUE, GREEN, GREEN, BLUE]),
            Arc::B => Palette([GREEN, BLUE, RED, RED, BLUE, GREEN]),
            Arc::C => Palette([BLUE, GREEN, GREEN, BLUE, RED, RED]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Vector3<f64>; 3],
    /// Reference point for world resolution; the centroid when unset.
    pub center: Option<Vector3<f64>>,
    pub palette: Palette,
}

impl Triangle {
    pub fn new(vertices: [Vector3<f64>; 3], palette: Palette) -> Self {
        Self {
            vertices,
            center: None,
            palette,
        }
    }

    pub fn center(&self) -> Vector3<f64> {
        match self.center {
            Some(center) => center,
            None => {
                let [v0, v1, v2] = self.vertices;
                (v0 + v1 + v2) / 3.0
            }
        }
    }

    pub fn normal(&self) -> Vector3<f64> {
        let [v0, v1, v2] = self.vertices;
        (v1 - v0).cross(&(v2 - v0)).normalize()
    }
}

/// The tube around the knot.
pub fn trefoil_mesh() -> Vec<Triangle> {
    // The twist of 4 turns per loop lines the tube's seam up with the portal.
    let vertex = |step: usize, ring: usize| {
        let t = step as f64 * TAU / LOOP_STEPS as f64;
        let u = (4 * ring + 1) as f64 * TAU / (4 * TUBE_SEGMENTS) as f64;
        trefoil::tube(t, 4.0 * t + u)
    };

    let mut triangles = Vec::with_capacity(LOOP_STEPS * TUBE_SEGMENTS * 2);
    for step in 0..LOOP_STEPS {
        let palette = Palette::for_arc(trefoil::arc_at_step(step));
        for ring in 0..TUBE_SEGMENTS {
            let v0 = vertex(step, ring);
            let v1 = vertex(step + 1, ring);
            let v2 = vertex(step, ring + 1);
            let v3 = vertex(step + 1, ring + 1);

            triangles.push(Triangle::new([v0, v1, v2], palette));
            triangles.push(Triangle::new([v3, v2, v1], palette));
        }
    }
    triangles
}

/// A huge tetrahedron around everything, tinted per world.
pub fn skybox() -> Vec<Triangle> {
    let palette = Palette([
        [0.2, 0.7, 1.0, 1.0],
        [0.2, 1.0, 0.7, 1.0],
        [0.7, 1.0, 0.2, 1.0],
        [0.7, 0.2, 1.0, 1.0],
        [1.0, 0.2, 0.7, 1.0],
        [1.0, 0.7, 0.2, 1.0],
    ]);

    let e = SCENE_EXTENT;
    let v0 = Vector3::new(-e, -e, e);
    let v1 = Vector3::new(-e, e, -e);
    let v2 = Vector3::new(e, -e, -e);
    let v3 = Vector3::new(e, e, e);

    vec![
        Triangle::new([v2, v1, v0], palette),
        Triangle::new([v0, v1, v3], palette),
        Triangle::new([v3, v2, v0], palette),
        Triangle::new([v1, v2, v3], palette),
    ]
}

pub fn ground() -> Vec<Triangle> {
    let palette = Palette::uniform(GRAY);
    let e = SCENE_EXTENT;
    let v0 = Vector3::new(-e, -e, GROUND_HEIGHT);
    let v1 = Vector3::new(e, -e, GROUND_HEIGHT);
    let v2 = Vector3::new(e, e, GROUND_HEIGHT);
    let v3 = Vector3::new(-e, e, GROUND_HEIGHT);

    vec![
        Triangle::new([v0, v1, v2], palette),
        Triangle::new([v2, v3, v0], palette),
    ]
}

/// Everything that never moves.
pub fn static_geometry() -> Vec<Triangle> {
    let mut triangles = trefoil_mesh();
    triangles.extend(skybox());
    triangles.extend(ground());
    triangles
}

/// An icosahedron that exists only in `world`.
///
/// All faces share the ball's center as their reference point, so the whole
/// ball resolves to one world.
pub fn ball(center: Vector3<f64>, world: World, color: Rgba) -> Vec<Triangle> {
    let palette = Palette::only_in(world, color);
    let at = |x: f64, y: f64, z: f64| center + BALL_RADIUS * Vector3::new(x, y, z);
    let phi = GOLDEN_RATIO;

    let ur = at(1.0, 0.0, phi);
    let dr = at(1.0, 0.0, -phi);
    let ul = at(-1.0, 0.0, phi);
    let dl = at(-1.0, 0.0, -phi);
    let rf = at(phi, 1.0, 0.0);
    let lf = at(-phi, 1.0, 0.0);
    let rb = at(phi, -1.0, 0.0);
    let lb = at(-phi, -1.0, 0.0);
    let fu = at(0.0, phi, 1.0);
    let bu = at(0.0, -phi, 1.0);
    let fd = at(0.0, phi, -1.0);
    let bd = at(0.0, -phi, -1.0);

    let faces = [
        [ul, ur, fu],
        [ur, ul, bu],
        [dl, dr, bd],
        [dr, dl, fd],
        [rb, rf, ur],
        [rf, rb, dr],
        [lb, lf, dl],
        [lf, lb, ul],
        [fd, fu, rf],
        [fu, fd, lf],
        [bd, bu, lb],
        [bu, bd, rb],
        [fu, lf, ul],
        [fu, ur, rf],
        [fd, dl, lf],
        [fd, rf, dr],
        [bu, ul, lb],
        [bu, rb, ur],
        [bd, lb, dl],
        [bd, dr, rb],
    ];

    faces
        .into_iter()
        .map(|vertices| Triangle {
            vertices,
            center: Some(center),
            palette,
        })
        .collect()
}
