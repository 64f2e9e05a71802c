//! Drive kernel: scroll recycler, scene configuration and the owned scene context.
//!
//! # Invariants
//! - The two terrain segments stay exactly one tile length apart.
//! - All scene state lives in one [`DriveScene`]; nothing is process-global.
//! - `DriveScene::update` runs once per frame and is not scaled by frame time.

pub mod config;
pub mod scene;
pub mod scroll;

pub use config::{
    AtmosphereConfig, CameraConfig, CarConfig, ConfigError, LightingConfig, LightingMode,
    SceneConfig, ScrollConfig, SunConfig, SunStyle, TerrainConfig, TextureConfig,
};
pub use scene::{CameraRig, CarModel, CarNode, CarSlot, DriveScene, FrameReport, SunNode};
pub use scroll::{Recycled, ScrollRecycler, ScrollState, Segment};
