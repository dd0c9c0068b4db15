//! Browser bindings for the trefoil portal.
//!
//! `scene` drives the simulated viewer and balls for a render loop on the JS
//! side; `portal` exposes the traversal and root solvers directly.

mod portal;
mod scene;

pub use portal::{resolve_sample, solve_quartic, travel};
pub use scene::WasmScene;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();
    init_logger();
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}
