//! Render data structures: geometry, drawables, textures, instances and the scene.
//!
//! - `geometry` contains CPU vertex data and the built-in primitives
//! - `drawable` uploads geometry into vertex/index buffers
//! - `texture` contains the move-only GPU texture wrapper
//! - `instance` holds per-object transformation data
//! - `scene` is the ordered collection of items the user adds

pub mod drawable;
pub mod geometry;
pub mod instance;
pub mod scene;
pub mod texture;
