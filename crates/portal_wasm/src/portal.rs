//! Stateless traversal and solver entry points.

use anyhow::{Context, Result};
use portal_core::portal::{self as core_portal, point_from_slice, World};
use portal_core::solvers::quartic;
use wasm_bindgen::prelude::*;

/// World reached by walking from `start` to `end` starting in `world`.
#[wasm_bindgen]
pub fn travel(world: i32, start: Vec<f64>, end: Vec<f64>) -> Result<i32, JsValue> {
    travel_checked(world, &start, &end)
        .map_err(|e| JsValue::from_str(&format!("Travel failed: {:#}", e)))
}

/// World seen at `point` (on a surface anchored at `target`) from `eye`.
#[wasm_bindgen]
pub fn resolve_sample(
    eye_world: i32,
    eye: Vec<f64>,
    point: Vec<f64>,
    target: Vec<f64>,
) -> Result<i32, JsValue> {
    resolve_checked(eye_world, &eye, &point, &target)
        .map_err(|e| JsValue::from_str(&format!("Sample resolution failed: {:#}", e)))
}

/// Real roots of `x⁴ + a·x³ + b·x² + c·x + d`, ascending.
#[wasm_bindgen]
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    quartic(a, b, c, d).as_slice().to_vec()
}

pub(crate) fn travel_checked(world: i32, start: &[f64], end: &[f64]) -> Result<i32> {
    let mut world = World::new(world)?;
    let start = point_from_slice(start).context("Invalid start point.")?;
    let end = point_from_slice(end).context("Invalid end point.")?;
    core_portal::travel(&mut world, &start, &end);
    Ok(world.into())
}

pub(crate) fn resolve_checked(
    eye_world: i32,
    eye: &[f64],
    point: &[f64],
    target: &[f64],
) -> Result<i32> {
    let eye_world = World::new(eye_world)?;
    let eye = point_from_slice(eye).context("Invalid eye point.")?;
    let point = point_from_slice(point).context("Invalid sample point.")?;
    let target = point_from_slice(target).context("Invalid target point.")?;
    Ok(core_portal::resolve_sample(eye_world, &eye, &point, &target).into())
}
