//! Developer tooling: scene inspector and frame timing for the debug panel.
//!
//! # Invariants
//! - Tools only read the scene; they never drive it.

mod inspector;
mod timer;

pub use inspector::{SceneInspector, SceneSummary};
pub use timer::FrameTimer;

pub fn crate_info() -> &'static str {
    "synthwave-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
