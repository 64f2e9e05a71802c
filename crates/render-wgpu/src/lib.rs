//! wgpu render backend for the drive scene.
//!
//! Draws the sun half-disc, two wireframe terrain tiles at the recycler's
//! positions, and the car once its model has loaded.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Camera orbiting is view state, not part of the scene.
//! - Meshes arriving late (heightmap, car) are swapped in without a rebuild.

mod camera;
mod gpu;
pub mod mesh;
mod shaders;

pub use camera::{OrbitControls, SceneCamera, projection, rig_forward, rig_view};
pub use gpu::SceneRenderer;
pub use mesh::Vertex;
