use synthwave_kernel::{CarSlot, DriveScene};

/// Read-only queries against the drive scene for the debug panel and CLI.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &DriveScene) -> SceneSummary {
        let recycler = scene.recycler();
        let (tile_a, tile_b) = recycler.positions();
        SceneSummary {
            frame: scene.frame(),
            speed: scene.speed(),
            tile_a,
            tile_b,
            spacing: recycler.spacing(),
            recycles: scene.recycle_count(),
            camera_height: scene.camera().height,
            camera_pitch: scene.camera().pitch,
            car: match scene.car() {
                CarSlot::Present(node) => node.model.name.clone(),
                other => other.label().to_string(),
            },
        }
    }

    /// Distance each tile still has to travel before it is recycled.
    pub fn distance_to_recycle(scene: &DriveScene) -> (f32, f32) {
        let recycler = scene.recycler();
        let threshold = recycler.state().threshold();
        let (a, b) = recycler.positions();
        (threshold - a, threshold - b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub frame: u64,
    pub speed: f32,
    pub tile_a: f32,
    pub tile_b: f32,
    pub spacing: f32,
    pub recycles: u64,
    pub camera_height: f32,
    pub camera_pitch: f32,
    pub car: String,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: frame={} speed={:.2} tiles=({:.2}, {:.2}) spacing={:.2} recycles={} camera=(y {:.2}, pitch {:.2}) car={}",
            self.frame,
            self.speed,
            self.tile_a,
            self.tile_b,
            self.spacing,
            self.recycles,
            self.camera_height,
            self.camera_pitch,
            self.car,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthwave_kernel::CarModel;

    #[test]
    fn summary_fresh_scene() {
        let scene = DriveScene::default();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.frame, 0);
        assert_eq!(summary.tile_a, -25.0);
        assert_eq!(summary.tile_b, -75.0);
        assert_eq!(summary.spacing, 50.0);
        assert_eq!(summary.car, "absent");
    }

    #[test]
    fn summary_tracks_updates() {
        let mut scene = DriveScene::default();
        scene.set_speed(1.0);
        for _ in 0..60 {
            scene.update();
        }
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.frame, 60);
        assert_eq!(summary.recycles, 1);
        assert!((summary.spacing - 50.0).abs() < 1e-3);
    }

    #[test]
    fn summary_names_loaded_car() {
        let mut scene = DriveScene::default();
        scene.attach_car(Ok(CarModel {
            name: "testarossa".into(),
            vertex_count: 3,
            triangle_count: 1,
            asset_id: 7,
        }));
        assert_eq!(SceneInspector::summary(&scene).car, "testarossa");
    }

    #[test]
    fn distance_to_recycle_from_start() {
        let scene = DriveScene::default();
        assert_eq!(SceneInspector::distance_to_recycle(&scene), (50.0, 100.0));
    }

    #[test]
    fn summary_display() {
        let scene = DriveScene::default();
        let s = format!("{}", SceneInspector::summary(&scene));
        assert!(s.contains("frame=0"));
        assert!(s.contains("car=absent"));
    }
}
