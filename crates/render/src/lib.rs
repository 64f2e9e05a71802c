//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene after `DriveScene::update` and never mutate it.
//! - Frame output derives from scene state alone.
//!
//! The GPU backend lives in `synthwave-render-wgpu`; the debug text renderer
//! here serves the CLI, logs and tests.

mod renderer;

pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "synthwave-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
