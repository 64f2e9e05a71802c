use std::fmt::Write;
use synthwave_kernel::{CarSlot, DriveScene};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and produces output. It never mutates the
/// scene; segment positions belong to the recycler.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene.
    fn render(&self, scene: &DriveScene) -> Self::Output;
}

/// Produces a human-readable description of one frame.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Include sun, lighting and atmosphere lines, not just the moving parts.
    pub verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &DriveScene) -> String {
        let mut out = String::new();
        let recycler = scene.recycler();
        let (a, b) = recycler.positions();
        let cam = scene.camera();

        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "=== Frame {} (speed={:.2}, recycles={}) ===",
            scene.frame(),
            scene.speed(),
            scene.recycle_count()
        );
        let _ = writeln!(
            out,
            "Terrain: A.z={a:.2} B.z={b:.2} spacing={:.2} threshold={:.1}",
            recycler.spacing(),
            recycler.state().threshold()
        );
        let _ = writeln!(
            out,
            "Camera: y={:.2} pitch={:.2} fov={:.0}",
            cam.height, cam.pitch, cam.fov_degrees
        );
        match scene.car() {
            CarSlot::Present(node) => {
                let p = node.transform.position;
                let _ = writeln!(
                    out,
                    "Car: {} ({} tris) pos=({:.2}, {:.2}, {:.2})",
                    node.model.name, node.model.triangle_count, p.x, p.y, p.z
                );
            }
            CarSlot::Failed(reason) => {
                let _ = writeln!(out, "Car: failed ({reason})");
            }
            other => {
                let _ = writeln!(out, "Car: {}", other.label());
            }
        }

        if self.verbose {
            let sun = scene.sun();
            let atmo = scene.atmosphere();
            let _ = writeln!(
                out,
                "Sun: {:?} r={:.1} z={:.1}",
                sun.style, sun.radius, sun.transform.position.z
            );
            let _ = writeln!(out, "Lighting: {:?}", scene.lighting().mode);
            let _ = writeln!(
                out,
                "Fog: {} {:.0}..{:.0} exposure={:.1}",
                String::from(atmo.fog_color),
                atmo.fog_near,
                atmo.fog_far,
                atmo.exposure
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthwave_kernel::CarModel;

    #[test]
    fn fresh_scene_output() {
        let scene = DriveScene::default();
        let output = DebugTextRenderer::new().render(&scene);

        assert!(output.contains("Frame 0"));
        assert!(output.contains("A.z=-25.00 B.z=-75.00"));
        assert!(output.contains("spacing=50.00"));
        assert!(output.contains("Car: absent"));
        assert!(!output.contains("Sun:"));
    }

    #[test]
    fn output_follows_updates() {
        let mut scene = DriveScene::default();
        scene.set_speed(1.0);
        scene.update();
        let output = DebugTextRenderer::new().render(&scene);
        assert!(output.contains("Frame 1"));
        assert!(output.contains("A.z=-24.00"));
    }

    #[test]
    fn car_line_reflects_slot() {
        let mut scene = DriveScene::default();
        scene.attach_car(Ok(CarModel {
            name: "testarossa".into(),
            vertex_count: 3,
            triangle_count: 1,
            asset_id: 0,
        }));
        let output = DebugTextRenderer::new().render(&scene);
        assert!(output.contains("Car: testarossa (1 tris)"));

        scene.attach_car(Err("bad file".into()));
        let output = DebugTextRenderer::new().render(&scene);
        assert!(output.contains("Car: failed (bad file)"));
    }

    #[test]
    fn verbose_adds_scene_details() {
        let scene = DriveScene::default();
        let output = DebugTextRenderer::verbose().render(&scene);
        assert!(output.contains("Sun: Textured"));
        assert!(output.contains("Fog: #250025 25..60"));
    }
}
