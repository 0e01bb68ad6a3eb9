use std::path::Path;

use anyhow::Context;

/**
 * This module contains all logic for loading shaders and textures from external files
 * and for owning the GPU objects created from them.
 */
pub mod handle;
pub mod shader;
pub mod texture;
pub mod uniform;

pub async fn load_string(assets_dir: &Path, file_name: &Path) -> anyhow::Result<String> {
    let path = assets_dir.join(file_name);
    let txt = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(txt)
}

pub async fn load_binary(assets_dir: &Path, file_name: &Path) -> anyhow::Result<Vec<u8>> {
    let path = assets_dir.join(file_name);
    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(data)
}
