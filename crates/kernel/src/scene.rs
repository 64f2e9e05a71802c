use glam::{Quat, Vec3};
use synthwave_common::{Color, Transform};

use crate::config::{
    AtmosphereConfig, CarConfig, LightingConfig, SceneConfig, SunStyle, TerrainConfig,
};
use crate::scroll::{Recycled, ScrollRecycler};

/// Camera parameters exposed to the debug panel.
///
/// The camera sits on the travel axis at `height` and looks down -Z, tilted
/// by `pitch` radians about X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub height: f32,
    pub pitch: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl CameraRig {
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, self.height, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SunNode {
    pub style: SunStyle,
    pub radius: f32,
    pub segments: u32,
    pub transform: Transform,
    pub top_color: Color,
    pub bottom_color: Color,
}

/// Description of a loaded car model, as far as the scene needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct CarModel {
    pub name: String,
    pub vertex_count: u32,
    pub triangle_count: u32,
    pub asset_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarNode {
    pub model: CarModel,
    pub transform: Transform,
    pub color: Color,
}

/// State of the asynchronously loaded car.
///
/// `Failed` renders exactly like `Absent`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CarSlot {
    #[default]
    Absent,
    Loading,
    Present(CarNode),
    Failed(String),
}

impl CarSlot {
    pub fn node(&self) -> Option<&CarNode> {
        match self {
            CarSlot::Present(node) => Some(node),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CarSlot::Absent => "absent",
            CarSlot::Loading => "loading",
            CarSlot::Present(_) => "present",
            CarSlot::Failed(_) => "failed",
        }
    }
}

/// Result of one frame step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub recycled: Recycled,
    pub positions: (f32, f32),
}

/// The whole drive scene, owned in one place.
///
/// Built once from a [`SceneConfig`]; `update` is called once per rendered
/// frame and the renderer only reads from it afterwards.
#[derive(Debug, Clone)]
pub struct DriveScene {
    recycler: ScrollRecycler,
    max_speed: f32,
    camera: CameraRig,
    sun: SunNode,
    terrain: TerrainConfig,
    lighting: LightingConfig,
    atmosphere: AtmosphereConfig,
    car_config: CarConfig,
    car: CarSlot,
    frame: u64,
    recycle_count: u64,
}

impl DriveScene {
    pub fn new(config: &SceneConfig) -> Self {
        let cam = &config.camera;
        let sun = &config.sun;
        tracing::debug!(
            sun = ?sun.style,
            lighting = ?config.lighting.mode,
            "building drive scene"
        );
        Self {
            recycler: ScrollRecycler::new(config.scroll.state()),
            max_speed: config.scroll.max_speed,
            camera: CameraRig {
                height: cam.height,
                pitch: cam.pitch,
                fov_degrees: cam.fov_degrees,
                near: cam.near,
                far: cam.far,
                aspect: 16.0 / 9.0,
            },
            sun: SunNode {
                style: sun.style,
                radius: sun.radius,
                segments: sun.segments,
                transform: Transform::from_translation(Vec3::new(0.0, 0.0, -sun.distance)),
                top_color: sun.top_color,
                bottom_color: sun.bottom_color,
            },
            terrain: config.terrain.clone(),
            lighting: config.lighting.clone(),
            atmosphere: config.atmosphere.clone(),
            car_config: config.car.clone(),
            car: CarSlot::Absent,
            frame: 0,
            recycle_count: 0,
        }
    }

    /// Per-frame step: advance the terrain by the current speed.
    pub fn update(&mut self) -> FrameReport {
        let _span = tracing::trace_span!("scene_update", frame = self.frame + 1).entered();
        let recycled = self.recycler.step();
        self.frame += 1;
        self.recycle_count += u64::from(recycled.count());
        FrameReport {
            frame: self.frame,
            recycled,
            positions: self.recycler.positions(),
        }
    }

    pub fn speed(&self) -> f32 {
        self.recycler.speed()
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.recycler.set_speed(speed);
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn recycler(&self) -> &ScrollRecycler {
        &self.recycler
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn sun(&self) -> &SunNode {
        &self.sun
    }

    pub fn terrain(&self) -> &TerrainConfig {
        &self.terrain
    }

    pub fn lighting(&self) -> &LightingConfig {
        &self.lighting
    }

    pub fn atmosphere(&self) -> &AtmosphereConfig {
        &self.atmosphere
    }

    pub fn car_config(&self) -> &CarConfig {
        &self.car_config
    }

    pub fn car(&self) -> &CarSlot {
        &self.car
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn recycle_count(&self) -> u64 {
        self.recycle_count
    }

    /// Transforms of tile A and tile B, in that order.
    pub fn terrain_transforms(&self) -> [Transform; 2] {
        let (a, b) = self.recycler.positions();
        [
            Transform::from_translation(Vec3::new(0.0, 0.0, a)),
            Transform::from_translation(Vec3::new(0.0, 0.0, b)),
        ]
    }

    pub fn begin_car_load(&mut self) {
        self.car = CarSlot::Loading;
    }

    /// Join a finished car load into the scene.
    ///
    /// A failure is logged and leaves the scene without a car; the frame
    /// loop carries on either way.
    pub fn attach_car(&mut self, result: Result<CarModel, String>) {
        match result {
            Ok(model) => {
                tracing::info!(
                    name = %model.name,
                    vertices = model.vertex_count,
                    triangles = model.triangle_count,
                    "car model attached"
                );
                let cfg = &self.car_config;
                self.car = CarSlot::Present(CarNode {
                    model,
                    transform: Transform {
                        position: cfg.position,
                        rotation: Quat::from_rotation_y(cfg.yaw),
                        scale: Vec3::splat(cfg.scale),
                    },
                    color: cfg.color,
                });
            }
            Err(reason) => {
                tracing::error!("error during car model loading: {reason}");
                self.car = CarSlot::Failed(reason);
            }
        }
    }
}

impl Default for DriveScene {
    fn default() -> Self {
        Self::new(&SceneConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> CarModel {
        CarModel {
            name: "car".into(),
            vertex_count: 8,
            triangle_count: 12,
            asset_id: 7,
        }
    }

    #[test]
    fn scene_starts_with_default_layout() {
        let scene = DriveScene::default();
        assert_eq!(scene.frame(), 0);
        assert_eq!(scene.recycler().positions(), (-25.0, -75.0));
        assert_eq!(scene.sun().transform.position.z, -50.0);
        assert_eq!(scene.camera().position(), Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(*scene.car(), CarSlot::Absent);
    }

    #[test]
    fn update_moves_both_tiles() {
        let mut scene = DriveScene::default();
        let report = scene.update();
        assert_eq!(report.frame, 1);
        let [a, b] = scene.terrain_transforms();
        assert!((a.position.z - -24.9).abs() < 1e-5);
        assert!((b.position.z - -74.9).abs() < 1e-5);
    }

    #[test]
    fn recycles_are_counted() {
        let mut config = SceneConfig::default();
        config.scroll.speed = 1.0;
        let mut scene = DriveScene::new(&config);
        for _ in 0..200 {
            scene.update();
        }
        // A passes 25 on frame 51, B on frame 101, A again on 151.
        assert_eq!(scene.recycle_count(), 3);
        assert_eq!(scene.frame(), 200);
    }

    #[test]
    fn speed_slider_feeds_next_update() {
        let mut scene = DriveScene::default();
        scene.set_speed(0.0);
        scene.update();
        assert_eq!(scene.recycler().positions(), (-25.0, -75.0));
        assert_eq!(scene.speed(), 0.0);
    }

    #[test]
    fn attach_car_success_places_model() {
        let mut scene = DriveScene::default();
        scene.begin_car_load();
        assert_eq!(scene.car().label(), "loading");
        scene.attach_car(Ok(model()));
        let node = scene.car().node().unwrap();
        assert_eq!(node.transform.position, Vec3::new(0.0, 0.15, -4.0));
        assert_eq!(node.model.triangle_count, 12);
    }

    #[test]
    fn attach_car_failure_leaves_scene_car_absent() {
        let mut scene = DriveScene::default();
        scene.begin_car_load();
        scene.attach_car(Err("no such file".into()));
        assert!(scene.car().node().is_none());
        assert_eq!(scene.car().label(), "failed");
        // Frame loop unaffected.
        scene.update();
        assert_eq!(scene.frame(), 1);
    }
}
