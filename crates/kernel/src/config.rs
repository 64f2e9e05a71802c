//! Scene configuration.
//!
//! One struct describes every variant of the drive scene (lighting mode,
//! textured or gradient sun, car model, scroll constants). Loaded from YAML;
//! any field left out takes the default below.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use synthwave_common::Color;

use crate::scroll::ScrollState;

/// Errors from loading or validating a scene config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Starting travel speed, in world units per frame.
    pub speed: f32,
    /// Upper end of the speed slider.
    pub max_speed: f32,
    pub threshold: f32,
    pub tile_length: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            speed: 0.1,
            max_speed: 1.0,
            threshold: 25.0,
            tile_length: 50.0,
        }
    }
}

impl ScrollConfig {
    pub fn state(&self) -> ScrollState {
        ScrollState::new(self.speed, self.threshold, self.tile_length)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub height: f32,
    /// Rotation about X in radians; negative tilts the view down.
    pub pitch: f32,
    /// Right-drag orbits the camera around the car.
    pub orbit_controls: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            near: 1.0,
            far: 1000.0,
            height: 1.5,
            pitch: -0.1,
            orbit_controls: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunStyle {
    /// Half disc mapped with the sun texture.
    Textured,
    /// Half disc shaded with a banded vertical gradient.
    Gradient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunConfig {
    pub style: SunStyle,
    pub radius: f32,
    pub segments: u32,
    /// Distance from the camera along -Z.
    pub distance: f32,
    pub top_color: Color,
    pub bottom_color: Color,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            style: SunStyle::Textured,
            radius: 8.0,
            segments: 50,
            distance: 50.0,
            top_color: Color::from_hex(0xFFF500),
            bottom_color: Color::from_hex(0xFF2A6D),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Edge length of one square tile. Must equal `scroll.tile_length`.
    pub size: f32,
    pub segments: u32,
    pub color: Color,
    pub displacement_scale: f32,
    /// Fragments with z below `-clip_distance` are discarded.
    pub clip_distance: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 50.0,
            segments: 25,
            color: Color::from_hex(0xFF71CE),
            displacement_scale: 5.0,
            clip_distance: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingMode {
    /// Yellow spot light behind the sun plus a hemisphere fill.
    SpotAndHemisphere,
    HemisphereOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub mode: LightingMode,
    pub spot_color: Color,
    pub spot_position: Vec3,
    pub spot_target: Vec3,
    pub spot_intensity: f32,
    /// Half-angle of the spot cone in radians.
    pub spot_angle: f32,
    pub sky_color: Color,
    pub ground_color: Color,
    pub hemisphere_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            mode: LightingMode::SpotAndHemisphere,
            spot_color: Color::from_hex(0xFFF500),
            spot_position: Vec3::new(0.0, 4.0, -50.0),
            spot_target: Vec3::ZERO,
            spot_intensity: 1.0,
            spot_angle: PI / 3.0,
            sky_color: Color::WHITE,
            ground_color: Color::from_hex(0x250025),
            hemisphere_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    pub background: Color,
    pub fog_color: Color,
    pub fog_near: f32,
    pub fog_far: f32,
    /// Reinhard tone mapping exposure.
    pub exposure: f32,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            background: Color::from_hex(0x250025),
            fog_color: Color::from_hex(0x250025),
            fog_near: 25.0,
            fog_far: 60.0,
            exposure: 2.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarConfig {
    pub model: PathBuf,
    pub position: Vec3,
    /// Rotation about the vertical axis in radians.
    pub yaw: f32,
    pub scale: f32,
    pub color: Color,
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/models/car.obj"),
            position: Vec3::new(0.0, 0.15, -4.0),
            yaw: PI,
            scale: 1.0,
            color: Color::from_hex(0xD8D8E0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub heightmap: PathBuf,
    pub sun: PathBuf,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            heightmap: PathBuf::from("assets/height.png"),
            sun: PathBuf::from("assets/sun.png"),
        }
    }
}

/// Complete description of a drive scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub scroll: ScrollConfig,
    pub camera: CameraConfig,
    pub sun: SunConfig,
    pub terrain: TerrainConfig,
    pub lighting: LightingConfig,
    pub atmosphere: AtmosphereConfig,
    pub car: CarConfig,
    pub textures: TextureConfig,
}

impl SceneConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&data)?;
        tracing::debug!(path = %path.as_ref().display(), "scene config loaded");
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Reject values the scene cannot be built from.
    ///
    /// The recycler itself accepts any speed; only the starting value from
    /// a file is held to the slider range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scroll;
        finite("scroll.speed", s.speed)?;
        finite("scroll.threshold", s.threshold)?;
        positive("scroll.tile_length", s.tile_length)?;
        positive("scroll.max_speed", s.max_speed)?;
        if s.speed < 0.0 || s.speed > s.max_speed {
            return Err(invalid(
                "scroll.speed",
                format!("must lie in 0..={}, got {}", s.max_speed, s.speed),
            ));
        }

        let c = &self.camera;
        finite("camera.fov_degrees", c.fov_degrees)?;
        if c.fov_degrees <= 0.0 || c.fov_degrees >= 180.0 {
            return Err(invalid(
                "camera.fov_degrees",
                format!("must lie in (0, 180), got {}", c.fov_degrees),
            ));
        }
        positive("camera.near", c.near)?;
        finite("camera.far", c.far)?;
        if c.far <= c.near {
            return Err(invalid("camera.far", format!("must exceed near ({})", c.near)));
        }
        finite("camera.height", c.height)?;
        finite("camera.pitch", c.pitch)?;

        positive("sun.radius", self.sun.radius)?;
        if self.sun.segments < 3 {
            return Err(invalid("sun.segments", "must be at least 3".into()));
        }

        positive("terrain.size", self.terrain.size)?;
        if self.terrain.size != s.tile_length {
            return Err(invalid(
                "terrain.size",
                format!(
                    "must equal scroll.tile_length ({}), got {}",
                    s.tile_length, self.terrain.size
                ),
            ));
        }
        if self.terrain.segments == 0 {
            return Err(invalid("terrain.segments", "must be at least 1".into()));
        }
        finite("terrain.displacement_scale", self.terrain.displacement_scale)?;
        finite("terrain.clip_distance", self.terrain.clip_distance)?;

        let a = &self.atmosphere;
        finite("atmosphere.fog_near", a.fog_near)?;
        finite("atmosphere.fog_far", a.fog_far)?;
        if a.fog_far <= a.fog_near {
            return Err(invalid(
                "atmosphere.fog_far",
                format!("must exceed fog_near ({})", a.fog_near),
            ));
        }
        positive("atmosphere.exposure", a.exposure)?;

        positive("car.scale", self.car.scale)?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {value}")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_scene() {
        let c = SceneConfig::default();
        assert_eq!(c.scroll.threshold, 25.0);
        assert_eq!(c.scroll.tile_length, 50.0);
        assert_eq!(c.scroll.speed, 0.1);
        assert_eq!(c.terrain.color.to_hex(), 0xFF71CE);
        assert_eq!(c.atmosphere.background.to_hex(), 0x250025);
        assert_eq!(c.atmosphere.exposure, 2.3);
        assert_eq!(c.camera.fov_degrees, 70.0);
        assert_eq!(c.car.position, Vec3::new(0.0, 0.15, -4.0));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = r##"
scroll:
  speed: 0.5
sun:
  style: gradient
lighting:
  mode: hemisphere_only
terrain:
  color: "#00FFFF"
"##;
        let c = SceneConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.scroll.speed, 0.5);
        assert_eq!(c.scroll.tile_length, 50.0);
        assert_eq!(c.sun.style, SunStyle::Gradient);
        assert_eq!(c.lighting.mode, LightingMode::HemisphereOnly);
        assert_eq!(c.terrain.color.to_hex(), 0x00FFFF);
        assert_eq!(c.camera.height, 1.5);
    }

    #[test]
    fn yaml_dump_loads_back() {
        let mut c = SceneConfig::default();
        c.sun.style = SunStyle::Gradient;
        c.camera.orbit_controls = true;
        let yaml = c.to_yaml().unwrap();
        let back = SceneConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back.sun.style, SunStyle::Gradient);
        assert!(back.camera.orbit_controls);
        assert_eq!(back.terrain.color, c.terrain.color);
    }

    #[test]
    fn save_and_load_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let c = SceneConfig::default();
        c.save(tmp.path()).unwrap();
        let loaded = SceneConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded.scroll, c.scroll);
        assert_eq!(loaded.car.model, c.car.model);
    }

    #[test]
    fn negative_start_speed_rejected() {
        let err = SceneConfig::from_yaml_str("scroll:\n  speed: -0.2\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "scroll.speed",
                ..
            }
        ));
    }

    #[test]
    fn bad_values_rejected() {
        let mut c = SceneConfig::default();
        c.scroll.tile_length = 0.0;
        assert!(c.validate().is_err());

        let mut c = SceneConfig::default();
        c.atmosphere.fog_far = 10.0;
        assert!(c.validate().is_err());

        let mut c = SceneConfig::default();
        c.camera.far = 0.5;
        assert!(c.validate().is_err());

        let mut c = SceneConfig::default();
        c.scroll.threshold = f32::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn tile_size_must_match_recycle_spacing() {
        let err = SceneConfig::from_yaml_str("scroll:\n  tile_length: 80\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "terrain.size",
                ..
            }
        ));

        let mut c = SceneConfig::default();
        c.terrain.size = 40.0;
        assert!(c.validate().is_err());

        let yaml = "scroll:\n  tile_length: 80\n  threshold: 40\nterrain:\n  size: 80\n";
        let c = SceneConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.terrain.size, c.scroll.tile_length);
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = SceneConfig::from_yaml_str("scroll: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SceneConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
