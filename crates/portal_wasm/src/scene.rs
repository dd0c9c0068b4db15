//! Stateful scene wrapper driven once per animation frame.

use nalgebra::Vector3;
use portal_core::modeling::Triangle;
use portal_core::portal::{point_from_slice, World};
use portal_core::scene::{MoveInput, Scene, SceneSettings};
use portal_core::traits::Traveler;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmScene {
    scene: Scene,
    input: MoveInput,
    /// Flattened vertices of the static geometry, built once.
    static_positions: Vec<f32>,
}

fn flatten_positions<'a>(triangles: impl IntoIterator<Item = &'a Triangle>) -> Vec<f32> {
    triangles
        .into_iter()
        .flat_map(|tri| tri.vertices)
        .flat_map(|v| [v.x as f32, v.y as f32, v.z as f32])
        .collect()
}

/// Maps a `KeyboardEvent.key` onto the movement flag it drives.
fn key_flag<'a>(input: &'a mut MoveInput, key: &str) -> Option<&'a mut bool> {
    match key.to_ascii_lowercase().as_str() {
        "w" | "arrowup" => Some(&mut input.forward),
        "s" | "arrowdown" => Some(&mut input.back),
        "a" | "arrowleft" => Some(&mut input.left),
        "d" | "arrowright" => Some(&mut input.right),
        " " => Some(&mut input.up),
        "shift" => Some(&mut input.down),
        _ => None,
    }
}

impl WasmScene {
    fn from_settings(settings: SceneSettings) -> anyhow::Result<WasmScene> {
        let scene = Scene::new(settings)?;
        let static_positions = flatten_positions(scene.static_geometry());
        Ok(WasmScene {
            scene,
            input: MoveInput::default(),
            static_positions,
        })
    }

    /// Worlds for the static geometry followed by the balls, plus the ball triangles.
    fn resolved_worlds(&self) -> (Vec<World>, Vec<Triangle>) {
        let balls = self.scene.ball_geometry();
        let mut worlds = self.scene.triangle_worlds(self.scene.static_geometry());
        worlds.extend(self.scene.triangle_worlds(&balls));
        (worlds, balls)
    }

    fn positions(&self) -> Vec<f32> {
        let balls = self.scene.ball_geometry();
        let mut positions = Vec::with_capacity(self.static_positions.len() + 9 * balls.len());
        positions.extend_from_slice(&self.static_positions);
        positions.extend(flatten_positions(&balls));
        positions
    }

    fn resolved_colors(&self) -> Vec<f32> {
        let (worlds, balls) = self.resolved_worlds();
        self.scene
            .static_geometry()
            .iter()
            .chain(&balls)
            .zip(worlds)
            .flat_map(|(tri, world)| {
                let color = tri.palette.select(world);
                [color; 3]
            })
            .flatten()
            .collect()
    }
}

#[wasm_bindgen]
impl WasmScene {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmScene, JsValue> {
        console_error_panic_hook::set_once();
        WasmScene::from_settings(SceneSettings::default())
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))
    }

    /// Builds a scene from a (possibly partial) settings object.
    pub fn with_settings(settings: JsValue) -> Result<WasmScene, JsValue> {
        console_error_panic_hook::set_once();
        let settings: SceneSettings = serde_wasm_bindgen::from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
        WasmScene::from_settings(settings).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
    }

    /// Records a key press or release; returns false for keys that do not move the player.
    pub fn set_key(&mut self, key: &str, pressed: bool) -> bool {
        match key_flag(&mut self.input, key) {
            Some(flag) => {
                *flag = pressed;
                true
            }
            None => false,
        }
    }

    pub fn step(&mut self, dt: f64) {
        self.scene.step(&self.input, dt);
    }

    pub fn look(&mut self, dx: f64, dy: f64) {
        self.scene.look(dx, dy);
    }

    pub fn player_world(&self) -> i32 {
        self.scene.player().world().into()
    }

    pub fn player_position(&self) -> Vec<f64> {
        self.scene.player().position().as_slice().to_vec()
    }

    /// Column-major world-to-eye matrix; the eye looks down its -z axis.
    pub fn view_matrix(&self) -> Vec<f64> {
        let view = self.scene.player().isometry().inverse().to_homogeneous();
        view.as_slice().to_vec()
    }

    pub fn ball_worlds(&self) -> Vec<i32> {
        self.scene
            .balls()
            .iter()
            .map(|ball| ball.world().into())
            .collect()
    }

    /// Ball centers, flattened as `[x0, y0, z0, x1, ...]`.
    pub fn ball_positions(&self) -> Vec<f64> {
        self.scene
            .balls()
            .iter()
            .flat_map(|ball| {
                let p = ball.position();
                [p.x, p.y, p.z]
            })
            .collect()
    }

    /// Full triangle list, palettes included.
    pub fn geometry(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.scene.geometry())
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize geometry: {err}")))
    }

    /// World shown by each triangle of `geometry()`, in the same order.
    pub fn triangle_worlds(&self) -> Vec<i32> {
        let (worlds, _) = self.resolved_worlds();
        worlds.into_iter().map(i32::from).collect()
    }

    /// Vertex positions as a flat buffer, nine floats per triangle.
    pub fn vertex_positions(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.positions().as_slice())
    }

    /// Per-vertex RGBA colours seen from the player's current world.
    pub fn vertex_colors(&self) -> js_sys::Float32Array {
        let colors = self.resolved_colors();
        js_sys::Float32Array::from(colors.as_slice())
    }

    /// World seen at `point` on a surface anchored at `target`.
    pub fn sample_world(&self, point: Vec<f64>, target: Vec<f64>) -> Result<i32, JsValue> {
        let point = sample_point(&point)?;
        let target = sample_point(&target)?;
        Ok(self.scene.sample_world(&point, &target).into())
    }
}

fn sample_point(coords: &[f64]) -> Result<Vector3<f64>, JsValue> {
    point_from_slice(coords).map_err(|e| JsValue::from_str(&format!("Invalid point: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::modeling;

    fn scene() -> WasmScene {
        WasmScene::from_settings(SceneSettings::default()).expect("scene should build")
    }

    #[test]
    fn keys_map_onto_movement() {
        let mut scene = scene();
        assert!(scene.set_key("W", true));
        assert!(scene.set_key("Shift", true));
        assert!(!scene.set_key("q", true));
        assert!(scene.input.forward);
        assert!(scene.input.down);
        assert!(scene.set_key("w", false));
        assert!(!scene.input.forward);
    }

    #[test]
    fn stepping_walks_towards_the_knot() {
        let mut scene = WasmScene::new().expect("scene should build");
        scene.set_key("w", true);
        scene.step(1.0);
        let position = scene.player_position();
        assert_eq!(position.len(), 3);
        assert!((position[0] - 4.5).abs() < 1e-12);
        assert_eq!(scene.player_world(), 0);
    }

    #[test]
    fn balls_report_worlds_and_positions() {
        let scene = scene();
        assert_eq!(scene.ball_worlds(), vec![0, 3, 3]);
        assert_eq!(scene.ball_positions().len(), 9);
    }

    #[test]
    fn view_matrix_maps_eye_to_origin() {
        let scene = scene();
        let view = scene.view_matrix();
        assert_eq!(view.len(), 16);
        // Translation column applied to the player's position.
        let p = scene.player_position();
        for row in 0..3 {
            let value: f64 = (0..3).map(|col| view[col * 4 + row] * p[col]).sum::<f64>()
                + view[12 + row];
            assert!(value.abs() < 1e-12);
        }
    }

    #[test]
    fn view_matrix_puts_the_knot_in_front() {
        let scene = scene();
        let view = scene.view_matrix();
        // The origin's image is the translation column.
        let center = [view[12], view[13], view[14]];
        assert!(center[0].abs() < 1e-12);
        assert!(center[1].abs() < 1e-12);
        assert!((center[2] + 5.0).abs() < 1e-12);
    }

    #[test]
    fn triangle_worlds_cover_every_triangle() {
        let scene = scene();
        let expected = modeling::static_geometry().len() + 20 * scene.ball_worlds().len();
        assert_eq!(scene.triangle_worlds().len(), expected);
        assert_eq!(scene.resolved_colors().len(), expected * 12);
    }

    #[test]
    fn buffers_match_full_geometry_after_stepping() {
        let mut scene = scene();
        scene.step(0.7);
        let triangles = scene.scene.geometry();
        assert_eq!(scene.positions(), flatten_positions(&triangles));

        let worlds: Vec<i32> = scene
            .scene
            .triangle_worlds(&triangles)
            .into_iter()
            .map(i32::from)
            .collect();
        assert_eq!(scene.triangle_worlds(), worlds);

        let colors: Vec<f32> = triangles
            .iter()
            .zip(scene.scene.triangle_worlds(&triangles))
            .flat_map(|(tri, world)| [tri.palette.select(world); 3])
            .flatten()
            .collect();
        assert_eq!(scene.resolved_colors(), colors);
    }

    #[test]
    fn sample_world_accepts_points() {
        let scene = scene();
        let world = scene
            .sample_world(vec![5.0, 0.0, -2.0], vec![5.0, 0.0, -2.0])
            .expect("valid sample");
        assert_eq!(world, 0);
    }

    #[test]
    #[cfg(target_arch = "wasm32")]
    fn sample_world_rejects_short_points() {
        let scene = scene();
        assert!(scene.sample_world(vec![1.0], vec![0.0; 3]).is_err());
    }
}
