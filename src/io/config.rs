use crate::error::ConfigError;
use crate::scene::normalize::FitOptions;
use crate::scene::orbit::OrbitSettings;
use crate::upload::intake::IntakeLimits;
use crate::upload::session::DecodeErrorPolicy;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Everything the showcase reads from `showcase.toml`.
///
/// Every section is optional; a partial file only overrides what it names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewer: ViewerConfig,
    pub limits: IntakeLimits,
    pub camera: CameraConfig,
    pub controls: OrbitSettings,
    pub render: RenderConfig,
    pub lights: Vec<LightConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewer: ViewerConfig::default(),
            limits: IntakeLimits::default(),
            camera: CameraConfig::default(),
            controls: OrbitSettings::default(),
            render: RenderConfig::default(),
            lights: vec![
                LightConfig {
                    r#type: "directional".to_string(),
                    position: [20.0, 20.0, 10.0],
                    color: [1.0, 1.0, 1.0],
                    intensity: 1.2,
                    cast_shadow: true,
                },
                LightConfig {
                    r#type: "point".to_string(),
                    position: [0.0, 10.0, 0.0],
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.8,
                    cast_shadow: false,
                },
            ],
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub target_size: f32,
    pub scale_ceiling: f32,
    /// What a failed decode does to the model currently on screen.
    pub on_decode_error: DecodeErrorPolicy,
    /// Textures larger than this on either side are downscaled at load.
    pub max_texture_size: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let fit = FitOptions::default();
        Self {
            target_size: fit.target_size,
            scale_ceiling: fit.scale_ceiling,
            on_decode_error: DecodeErrorPolicy::default(),
            max_texture_size: 2048,
        }
    }
}

impl ViewerConfig {
    pub fn fit(&self) -> FitOptions {
        FitOptions {
            target_size: self.target_size,
            scale_ceiling: self.scale_ceiling,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 15.0],
            target: [0.0, 0.0, 0.0],
            fov: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output resolution relative to the viewer panel.
    pub render_scale: f32,
    /// Supersampling factor per axis.
    pub samples: usize,
    pub exposure: f32,
    pub use_aces: bool,

    /// sRGB `0xRRGGBB`.
    pub background: u32,
    pub ambient_intensity: f32,
    pub ground_size: f32,
    pub ground_color: u32,

    pub use_shadows: bool,
    pub shadow_map_size: usize,
    /// Half extent of the light's orthographic frustum.
    pub shadow_ortho_size: f32,
    pub shadow_bias: f32,
    pub pcf_kernel_size: i32,

    /// Models above this many triangles render with the reduced profile.
    pub heavy_triangle_count: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.0,
            samples: 2,
            exposure: 1.0,
            use_aces: false,
            background: 0x0f0f23,
            ambient_intensity: 0.6,
            ground_size: 20.0,
            ground_color: 0x1c1c3a,
            use_shadows: true,
            shadow_map_size: 2048,
            shadow_ortho_size: 8.0,
            shadow_bias: 0.004,
            pcf_kernel_size: 1,
            heavy_triangle_count: 250_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightConfig {
    /// "directional" or "point".
    pub r#type: String,
    pub position: [f32; 3],
    #[serde(default = "default_light_color")]
    pub color: [f32; 3],
    pub intensity: f32,
    #[serde(default)]
    pub cast_shadow: bool,
}

fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::upload::session::DecodeErrorPolicy;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").expect("empty config parses");
        assert_eq!(config.viewer.target_size, 5.0);
        assert_eq!(config.viewer.scale_ceiling, 3.0);
        assert_eq!(config.limits.max_bytes, 500 * 1024 * 1024);
        assert_eq!(config.limits.warn_bytes, 100 * 1024 * 1024);
        assert_eq!(config.camera.position, [0.0, 5.0, 15.0]);
        assert_eq!(config.lights.len(), 2);
        assert_eq!(config.render.background, 0x0f0f23);
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config = Config::from_toml(
            r#"
            [viewer]
            target_size = 3.0
            on_decode_error = "keep_previous"

            [controls]
            max_distance = 50.0

            [[lights]]
            type = "point"
            position = [1.0, 2.0, 3.0]
            intensity = 2.0
            "#,
        )
        .expect("config parses");
        assert_eq!(config.viewer.target_size, 3.0);
        assert_eq!(config.viewer.scale_ceiling, 3.0);
        assert_eq!(config.viewer.on_decode_error, DecodeErrorPolicy::KeepPrevious);
        assert_eq!(config.controls.max_distance, 50.0);
        assert_eq!(config.controls.min_distance, 1.0);
        assert_eq!(config.lights.len(), 1);
        assert_eq!(config.lights[0].color, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn bundled_sample_matches_the_defaults() {
        let sample = Config::from_toml(include_str!("../../showcase.toml")).expect("sample parses");
        let defaults = Config::default();
        assert_eq!(sample.limits, defaults.limits);
        assert_eq!(sample.viewer.fit(), defaults.viewer.fit());
        assert_eq!(sample.controls, defaults.controls);
        assert_eq!(sample.render.background, defaults.render.background);
        assert_eq!(sample.render.heavy_triangle_count, defaults.render.heavy_triangle_count);
        assert_eq!(sample.lights.len(), 2);
        assert!(sample.lights[0].cast_shadow);
    }

    #[test]
    fn load_reports_the_failing_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[viewer").expect("write");
        let err = Config::load(file.path()).expect_err("broken TOML");
        assert!(err.to_string().contains("failed to parse"));

        let missing = Config::load("/definitely/not/here/showcase.toml").expect_err("missing");
        assert!(missing.to_string().contains("failed to read"));
    }
}
