//! The moving parts of the portal scene: the viewer and the balls that wander
//! through the knot. Each carries its own world and hands every straight move
//! to `portal::travel`.

use crate::modeling::{self, Rgba, Triangle};
use crate::portal::{self, resolve_batch, resolve_sample, Sample, World};
use crate::traits::Traveler;
use anyhow::{bail, Context, Result};
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

const MAX_PITCH: f64 = FRAC_PI_2 - 0.001;

/// Closed loops the balls follow; `t` is time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallPath {
    /// Flat circle of radius 2 around the knot's axis.
    Orbit,
    /// Vertical loop through the bottom lobe.
    Hoop,
    /// A small trefoil threaded through the big one.
    Knotted,
}

impl BallPath {
    pub fn position(self, t: f64) -> Vector3<f64> {
        let (s, c) = t.sin_cos();
        match self {
            BallPath::Orbit => Vector3::new(2.0 * s, -2.0 * c, 0.0),
            BallPath::Hoop => Vector3::new(0.1, -3.0 + c, s),
            BallPath::Knotted => {
                let (s2, c2) = (2.0 * t).sin_cos();
                Vector3::new(s + 2.0 * s2, c - 2.0 * c2 + 0.1, (3.0 * t).sin() + 0.5)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallSettings {
    pub color: Rgba,
    pub world: World,
    pub path: BallPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub player_start: [f64; 3],
    /// Heading in radians; 0 looks down +x, increasing turns clockwise seen from above.
    pub player_heading: f64,
    pub player_world: World,
    /// Walking speed in units per second.
    pub move_speed: f64,
    /// Radians per pixel of mouse movement.
    pub look_sensitivity: f64,
    pub balls: Vec<BallSettings>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            player_start: [5.0, 0.0, 0.0],
            player_heading: std::f64::consts::PI,
            player_world: World::default(),
            move_speed: 0.5,
            look_sensitivity: 3e-3,
            balls: vec![
                BallSettings {
                    color: [0.6, 0.6, 0.8, 1.0],
                    world: World::ALL[0],
                    path: BallPath::Orbit,
                },
                BallSettings {
                    color: [0.8, 0.6, 0.2, 1.0],
                    world: World::ALL[3],
                    path: BallPath::Hoop,
                },
                BallSettings {
                    color: [0.2, 0.3, 0.9, 1.0],
                    world: World::ALL[3],
                    path: BallPath::Knotted,
                },
            ],
        }
    }
}

impl SceneSettings {
    pub fn validate(&self) -> Result<()> {
        if self.player_start.iter().any(|c| !c.is_finite()) {
            bail!("player_start must be finite.");
        }
        if !self.player_heading.is_finite() {
            bail!("player_heading must be finite.");
        }
        if !(self.move_speed.is_finite() && self.move_speed > 0.0) {
            bail!("move_speed must be positive.");
        }
        if !(self.look_sensitivity.is_finite() && self.look_sensitivity > 0.0) {
            bail!("look_sensitivity must be positive.");
        }
        for (idx, ball) in self.balls.iter().enumerate() {
            if ball.color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                bail!("Ball {} has a colour channel outside 0..=1.", idx);
            }
        }
        Ok(())
    }
}

/// Which movement keys are held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MoveInput {
    /// Unnormalized direction in the player's frame (+x ahead, +y left, +z up).
    fn local_direction(&self) -> Vector3<f64> {
        let axis = |pos: bool, neg: bool| f64::from(u8::from(pos)) - f64::from(u8::from(neg));
        Vector3::new(
            axis(self.forward, self.back),
            axis(self.left, self.right),
            axis(self.up, self.down),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    position: Vector3<f64>,
    heading: f64,
    pitch: f64,
    world: World,
}

impl Player {
    pub fn new(position: Vector3<f64>, heading: f64, world: World) -> Self {
        Self {
            position,
            heading,
            pitch: 0.0,
            world,
        }
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Turns by a mouse delta; pitch stops just short of straight up or down.
    pub fn look(&mut self, dx: f64, dy: f64, sensitivity: f64) {
        self.heading += dx * sensitivity;
        self.pitch = (self.pitch - dy * sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn look_direction(&self) -> Vector3<f64> {
        let (sh, ch) = self.heading.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vector3::new(ch * cp, -sh * cp, sp)
    }

    /// Eye frame: player space -> scene space, looking down the local -z axis.
    pub fn isometry(&self) -> Isometry3<f64> {
        let eye = Point3::from(self.position);
        let target = Point3::from(self.position - self.look_direction());
        Isometry3::face_towards(&eye, &target, &Vector3::z())
    }

    /// Walks for `dt` seconds; movement stays level regardless of pitch.
    pub fn walk(&mut self, input: &MoveInput, dt: f64, speed: f64) {
        let local = input.local_direction() * dt * speed;
        if local == Vector3::zeros() {
            return;
        }
        let turn = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -self.heading);
        self.move_to(self.position + turn * local);
    }
}

impl Traveler for Player {
    fn position(&self) -> Vector3<f64> {
        self.position
    }

    fn world(&self) -> World {
        self.world
    }

    fn move_to(&mut self, target: Vector3<f64>) {
        let before = self.world;
        portal::travel(&mut self.world, &self.position, &target);
        if self.world != before {
            log::debug!("player passed from world {} to world {}", before, self.world);
        }
        self.position = target;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    path: BallPath,
    t: f64,
    position: Vector3<f64>,
    world: World,
    color: Rgba,
}

impl Ball {
    pub fn new(settings: &BallSettings) -> Self {
        Self {
            path: settings.path,
            t: 0.0,
            position: settings.path.position(0.0),
            world: settings.world,
            color: settings.color,
        }
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn advance(&mut self, dt: f64) {
        self.t += dt;
        self.move_to(self.path.position(self.t));
    }

    pub fn geometry(&self) -> Vec<Triangle> {
        modeling::ball(self.position, self.world, self.color)
    }
}

impl Traveler for Ball {
    fn position(&self) -> Vector3<f64> {
        self.position
    }

    fn world(&self) -> World {
        self.world
    }

    fn move_to(&mut self, target: Vector3<f64>) {
        let before = self.world;
        portal::travel(&mut self.world, &self.position, &target);
        if self.world != before {
            log::debug!("{:?} ball passed from world {} to world {}", self.path, before, self.world);
        }
        self.position = target;
    }
}

#[derive(Debug)]
pub struct Scene {
    settings: SceneSettings,
    player: Player,
    balls: Vec<Ball>,
    static_geometry: Vec<Triangle>,
}

impl Scene {
    pub fn new(settings: SceneSettings) -> Result<Self> {
        settings.validate().context("Invalid scene settings.")?;

        let player = Player::new(
            Vector3::from(settings.player_start),
            settings.player_heading,
            settings.player_world,
        );
        let balls = settings.balls.iter().map(Ball::new).collect();

        Ok(Self {
            settings,
            player,
            balls,
            static_geometry: modeling::static_geometry(),
        })
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, input: &MoveInput, dt: f64) {
        self.player.walk(input, dt, self.settings.move_speed);
        for ball in &mut self.balls {
            ball.advance(dt);
        }
    }

    pub fn look(&mut self, dx: f64, dy: f64) {
        self.player.look(dx, dy, self.settings.look_sensitivity);
    }

    /// Everything that never moves, built once per scene.
    pub fn static_geometry(&self) -> &[Triangle] {
        &self.static_geometry
    }

    /// The balls at their current positions.
    pub fn ball_geometry(&self) -> Vec<Triangle> {
        self.balls.iter().flat_map(Ball::geometry).collect()
    }

    /// Static geometry followed by the balls at their current positions.
    pub fn geometry(&self) -> Vec<Triangle> {
        let mut triangles = self.static_geometry.clone();
        triangles.extend(self.ball_geometry());
        triangles
    }

    /// World in which the viewer sees `point` on a surface anchored at `target`.
    pub fn sample_world(&self, point: &Vector3<f64>, target: &Vector3<f64>) -> World {
        resolve_sample(self.player.world, &self.player.position, point, target)
    }

    pub fn sample_color(&self, triangle: &Triangle, point: &Vector3<f64>) -> Rgba {
        let world = self.sample_world(point, &triangle.center());
        triangle.palette.select(world)
    }

    /// World each triangle shows at its own reference point.
    pub fn triangle_worlds(&self, triangles: &[Triangle]) -> Vec<World> {
        let samples: Vec<Sample> = triangles
            .iter()
            .map(|tri| {
                let center = tri.center();
                Sample {
                    eye_world: self.player.world,
                    eye: self.player.position,
                    point: center,
                    target: center,
                }
            })
            .collect();
        resolve_batch(&samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn default_settings_validate() {
        SceneSettings::default()
            .validate()
            .expect("defaults should be valid");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = SceneSettings {
            move_speed: 0.0,
            ..SceneSettings::default()
        };
        assert_err_contains(Scene::new(settings), "move_speed must be positive");

        let settings = SceneSettings {
            player_start: [f64::NAN, 0.0, 0.0],
            ..SceneSettings::default()
        };
        assert_err_contains(Scene::new(settings), "player_start must be finite");

        let mut settings = SceneSettings::default();
        settings.balls[1].color = [2.0, 0.0, 0.0, 1.0];
        assert_err_contains(settings.validate(), "Ball 1");
    }

    #[test]
    fn walking_follows_heading() {
        let mut player = Player::new(Vector3::zeros(), 0.0, World::default());
        let forward = MoveInput {
            forward: true,
            ..MoveInput::default()
        };
        player.walk(&forward, 2.0, 0.5);
        assert!((player.position() - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);

        let mut player = Player::new(Vector3::zeros(), FRAC_PI_2, World::default());
        player.walk(&forward, 1.0, 1.0);
        let expected = player.look_direction();
        assert!((player.position() - expected).norm() < 1e-12);
        assert!((player.position() - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-12);

        let left = MoveInput {
            left: true,
            ..MoveInput::default()
        };
        let mut player = Player::new(Vector3::zeros(), 0.0, World::default());
        player.walk(&left, 1.0, 1.0);
        assert!((player.position() - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn idle_input_does_not_move() {
        let mut player = Player::new(Vector3::new(1.0, 2.0, 3.0), 0.3, World::ALL[4]);
        player.walk(&MoveInput::default(), 1.0, 1.0);
        assert_eq!(player.position(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(player.world(), World::ALL[4]);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut player = Player::new(Vector3::zeros(), 0.0, World::default());
        player.look(0.0, -10_000.0, 3e-3);
        assert!((player.pitch() - MAX_PITCH).abs() < 1e-12);
        player.look(0.0, 10_000.0, 3e-3);
        assert!((player.pitch() + MAX_PITCH).abs() < 1e-12);
        assert!(player.look_direction().z < 0.0);
    }

    #[test]
    fn eye_frame_looks_along_look_direction() {
        let mut player = Player::new(Vector3::new(5.0, 0.0, 0.0), 0.4, World::default());
        player.look(10.0, -20.0, 3e-3);
        let iso = player.isometry();
        let forward = iso.rotation * -Vector3::z();
        assert!((forward - player.look_direction()).norm() < 1e-9);
        let up = iso.rotation * Vector3::y();
        assert!(up.z > 0.0);
        assert!((iso.translation.vector - player.position()).norm() < 1e-12);
    }

    #[test]
    fn player_changes_world_under_the_knot() {
        let mut player = Player::new(Vector3::new(-0.61, -2.55, 0.0), 0.0, World::default());
        player.move_to(Vector3::new(-0.88, -2.85, 0.0));
        assert_eq!(player.world(), World::ALL[3]);
        player.move_to(Vector3::new(-0.61, -2.55, 0.0));
        assert_eq!(player.world(), World::ALL[0]);
    }

    #[test]
    fn balls_follow_their_paths() {
        let settings = BallSettings {
            color: [1.0, 1.0, 1.0, 1.0],
            world: World::ALL[2],
            path: BallPath::Hoop,
        };
        let mut ball = Ball::new(&settings);
        assert_eq!(ball.position(), BallPath::Hoop.position(0.0));
        for _ in 0..10 {
            ball.advance(0.05);
        }
        assert!((ball.time() - 0.5).abs() < 1e-12);
        assert!((ball.position() - BallPath::Hoop.position(0.5)).norm() < 1e-12);
    }

    #[test]
    fn ball_loop_retraced_backwards_restores_world() {
        let settings = BallSettings {
            color: [1.0, 1.0, 1.0, 1.0],
            world: World::ALL[1],
            path: BallPath::Orbit,
        };
        let mut ball = Ball::new(&settings);
        for _ in 0..40 {
            ball.advance(0.1);
        }
        for _ in 0..40 {
            ball.advance(-0.1);
        }
        assert_eq!(ball.world(), World::ALL[1]);
    }

    #[test]
    fn scene_geometry_includes_balls() {
        let scene = Scene::new(SceneSettings::default()).expect("scene");
        let expected = modeling::static_geometry().len() + 20 * scene.balls().len();
        assert_eq!(scene.geometry().len(), expected);
        assert_eq!(scene.static_geometry().len(), modeling::static_geometry().len());
        assert_eq!(scene.ball_geometry().len(), 20 * scene.balls().len());
        assert_eq!(
            &scene.geometry()[scene.static_geometry().len()..],
            scene.ball_geometry().as_slice()
        );
    }

    #[test]
    fn invalid_scene_reports_context() {
        let settings = SceneSettings {
            look_sensitivity: -1.0,
            ..SceneSettings::default()
        };
        let err = Scene::new(settings).expect_err("negative sensitivity");
        let message = format!("{err:#}");
        assert!(message.contains("Invalid scene settings"));
        assert!(message.contains("look_sensitivity must be positive"));
    }

    #[test]
    fn sample_color_uses_resolved_world() {
        let settings = SceneSettings {
            player_start: [-0.61, -2.55, 0.0],
            player_world: World::ALL[1],
            balls: Vec::new(),
            ..SceneSettings::default()
        };
        let scene = Scene::new(settings).expect("scene");
        let ground = &modeling::ground()[0];

        // Nothing between the eye and a point straight below it.
        let below = Vector3::new(-0.61, -2.55, -2.0);
        let world = scene.sample_world(&below, &below);
        assert_eq!(world, World::ALL[1]);
        assert_eq!(scene.sample_color(ground, &below), ground.palette.select(world));

        // Looking past arc C shows the world on its far side.
        let beyond = Vector3::new(-0.88, -2.85, 0.0);
        assert_eq!(scene.sample_world(&beyond, &beyond), World::ALL[2]);
    }

    #[test]
    fn triangle_worlds_match_single_samples() {
        let scene = Scene::new(SceneSettings::default()).expect("scene");
        let triangles = modeling::skybox();
        let worlds = scene.triangle_worlds(&triangles);
        assert_eq!(worlds.len(), triangles.len());
        for (tri, world) in triangles.iter().zip(worlds) {
            let center = tri.center();
            assert_eq!(scene.sample_world(&center, &center), world);
        }
    }

    #[test]
    fn stepping_moves_player_and_balls() {
        let mut scene = Scene::new(SceneSettings::default()).expect("scene");
        let start = scene.player().position();
        let input = MoveInput {
            forward: true,
            ..MoveInput::default()
        };
        scene.step(&input, 1.0);
        let moved = scene.player().position() - start;
        assert!((moved.norm() - 0.5).abs() < 1e-12);
        assert!(moved.x < 0.0);
        assert!(scene.balls().iter().all(|ball| (ball.time() - 1.0).abs() < 1e-12));
    }
}
