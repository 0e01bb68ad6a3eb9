//! Render pipeline construction.
//!
//! - `basic` holds the bind group layouts of the scene and the pipeline builder
//! - `mipmap` fills the mip chain of uploaded textures

pub mod basic;
pub mod mipmap;
