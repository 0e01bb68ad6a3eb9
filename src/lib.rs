//! flow-cube
//!
//! A minimal real-time render loop built on wgpu and winit. It opens a window,
//! compiles a WGSL shader program, loads a handful of textures and draws
//! instanced triangles, quads and cubes that the user adds at runtime while
//! flying a free-look camera through the scene.
//!
//! High-level modules
//! - `camera`: fly camera, projection and the controller applying input to it
//! - `clock`: per-frame delta time
//! - `config`: the `flow-cube.toml` configuration
//! - `context`: window, surface, device/queue and per-window state
//! - `data_structures`: geometry, instances, drawables, textures and the scene
//! - `errors`: the crate error type
//! - `flow`: the render loop and its life-cycle phases
//! - `input`: keyboard/mouse state gathered from window events
//! - `logging`: log formatting and the log file
//! - `pipelines`: bind group layouts and render pipeline construction
//! - `render`: per-frame uploads and draw calls
//! - `resources`: shader/texture loading and owning GPU handles
//!

pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod errors;
pub mod flow;
pub mod input;
pub mod logging;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use config::EngineConfig;
pub use data_structures::scene::{Primitive, Scene};
pub use errors::{CubeError, Result};
pub use flow::run;
