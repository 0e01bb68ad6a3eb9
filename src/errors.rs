//! Error types.
//!
//! [`CubeError`] covers everything that can abort start-up: window and GPU
//! bring-up, configuration parsing and, under
//! [`FailurePolicy::Strict`](crate::config::FailurePolicy::Strict), shader and
//! texture failures. Lenient resource failures never surface here; they are
//! logged and rendering continues degraded.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type of the render loop.
#[derive(Error, Debug)]
pub enum CubeError {
    /// The winit event loop could not be created or failed while running.
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The platform refused to open a window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// No surface could be created for the window.
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// No adapter is compatible with the surface.
    #[error("Failed to request WGPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to create a device.
    #[error("Failed to create WGPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The surface reports no usable format for this adapter.
    #[error("Surface is not supported by the selected adapter")]
    UnsupportedSurface,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file exists but is not valid TOML for [`EngineConfig`](crate::config::EngineConfig).
    #[error("Failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The configuration parsed but holds values the engine cannot run with.
    #[error("Invalid config {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    /// Shader compile or link failure (strict policy only).
    #[error("Shader program '{label}' failed:\n{diagnostics}")]
    Shader { label: String, diagnostics: String },

    /// Texture read or decode failure (strict policy only).
    #[error("Texture '{path}' failed to load: {reason}")]
    Texture { path: String, reason: String },

    /// A second logger was installed by someone else before ours.
    #[error("Logger could not be installed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Alias used by every fallible public API of the crate.
pub type Result<T> = std::result::Result<T, CubeError>;
