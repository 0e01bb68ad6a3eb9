//! Engine configuration.
//!
//! Everything has a default, so the engine runs without any configuration
//! file. When `flow-cube.toml` exists in the working directory it is read at
//! start-up; any table or key it leaves out keeps its default:
//!
//! ```toml
//! failure_policy = "strict"
//! textures = ["textures/wall.png"]
//!
//! [window]
//! title = "EngineOne"
//! vsync = false
//!
//! [camera]
//! speed = 5.0
//!
//! [scene]
//! initial_items = ["cube", "quad"]
//! ```

use std::path::{Path, PathBuf};

use cgmath::Deg;
use serde::Deserialize;

use crate::{
    camera::{Camera, CameraController},
    data_structures::scene::Primitive,
    errors::{CubeError, Result},
    input::LookButton,
    logging::LoggingConfig,
    resources::shader::ShaderPaths,
};

/// Name of the configuration file looked up by [`EngineConfig::discover`].
pub const CONFIG_FILE: &str = "flow-cube.toml";

/// What happens when a shader or texture fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and keep rendering with whatever did load.
    #[default]
    Lenient,
    /// Abort start-up with the error.
    Strict,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "EngineOne".to_string(),
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

/// Start pose, optics and controls of the camera. Angles in degrees.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub fov_min: f32,
    pub fov_max: f32,
    pub znear: f32,
    pub zfar: f32,
    pub speed: f32,
    pub sensitivity: f32,
    pub pan_speed: f32,
    pub look_button: LookButton,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            fov_min: 1.0,
            fov_max: 45.0,
            znear: 0.1,
            zfar: 100.0,
            speed: 2.5,
            sensitivity: 0.1,
            pan_speed: 0.01,
            look_button: LookButton::Right,
        }
    }
}

impl CameraConfig {
    /// The start camera. Pitch is limited to
    /// [`PITCH_LIMIT`](crate::camera::PITCH_LIMIT) and the field of
    /// view to the zoom range.
    pub fn camera(&self) -> Camera {
        Camera::new(
            self.position,
            Deg(self.yaw),
            Deg(self.pitch),
            Deg(self.fov.max(self.fov_min).min(self.fov_max)),
        )
    }

    /// Rejects values that would make the camera degenerate.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let finite = [
            ("yaw", self.yaw),
            ("pitch", self.pitch),
            ("fov", self.fov),
            ("fov_min", self.fov_min),
            ("fov_max", self.fov_max),
            ("znear", self.znear),
            ("zfar", self.zfar),
            ("speed", self.speed),
            ("sensitivity", self.sensitivity),
            ("pan_speed", self.pan_speed),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("camera.{} must be a finite number", name));
        }
        if self.position.iter().any(|v| !v.is_finite()) {
            return Err("camera.position must be finite".to_string());
        }
        if !(self.fov_min > 0.0 && self.fov_min <= self.fov_max && self.fov_max < 180.0) {
            return Err(format!(
                "camera zoom range [{}, {}] must satisfy 0 < fov_min <= fov_max < 180",
                self.fov_min, self.fov_max
            ));
        }
        if !(self.znear > 0.0 && self.znear < self.zfar) {
            return Err(format!(
                "camera clip planes {}..{} must satisfy 0 < znear < zfar",
                self.znear, self.zfar
            ));
        }
        Ok(())
    }

    pub fn controller(&self) -> CameraController {
        CameraController {
            speed: self.speed,
            sensitivity: self.sensitivity,
            pan_speed: self.pan_speed,
            fov_min: Deg(self.fov_min),
            fov_max: Deg(self.fov_max),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Degrees per second the angle accumulator advances.
    pub spin_deg_per_sec: f32,
    /// Items present before any key is pressed.
    pub initial_items: Vec<Primitive>,
    /// Fixed seed for item colours; random when unset.
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            spin_deg_per_sec: 50.0,
            initial_items: vec![Primitive::Cube],
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    /// RGBA clear colour.
    pub clear_colour: [f64; 4],
    pub camera: CameraConfig,
    pub scene: SceneConfig,
    pub shaders: ShaderPaths,
    /// Image files for the texture slots, in slot order.
    pub textures: Vec<PathBuf>,
    /// Directory shader and texture paths are relative to.
    pub assets_dir: PathBuf,
    pub failure_policy: FailurePolicy,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_colour: [0.2, 0.3, 0.3, 1.0],
            camera: CameraConfig::default(),
            scene: SceneConfig::default(),
            shaders: ShaderPaths::default(),
            textures: vec![
                PathBuf::from("textures/wall.png"),
                PathBuf::from("textures/balls.png"),
                PathBuf::from("textures/face.png"),
                PathBuf::from("textures/grid.png"),
            ],
            assets_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets")),
            failure_policy: FailurePolicy::Lenient,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates `text`; `path` only names the source in errors.
    pub fn from_toml(path: &Path, text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|source| CubeError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config
            .camera
            .validate()
            .map_err(|reason| CubeError::InvalidConfig {
                path: path.to_path_buf(),
                reason,
            })?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(path, &text)
    }

    /// Reads [`CONFIG_FILE`] from the working directory, or returns the
    /// defaults when there is none.
    pub fn discover() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn wgpu_clear_colour(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_colour;
        wgpu::Color { r, g, b, a }
    }
}
