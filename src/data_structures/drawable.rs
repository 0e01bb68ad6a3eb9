//! GPU buffers for one piece of geometry.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::geometry::Geometry,
    resources::handle::{GpuHandle, ResourceLedger},
};

/// A vertex buffer plus an optional index buffer.
///
/// Buffer contents are fixed at construction; both buffers are released when
/// the drawable drops.
#[derive(Debug)]
pub struct Drawable {
    pub name: String,
    vertex_buffer: GpuHandle<wgpu::Buffer>,
    index_buffer: Option<GpuHandle<wgpu::Buffer>>,
    vertex_count: u32,
    index_count: u32,
}

impl Drawable {
    /// Uploads `geometry`. Empty geometry is rejected with a warning.
    pub fn new(
        device: &wgpu::Device,
        ledger: &ResourceLedger,
        name: &str,
        geometry: &Geometry,
    ) -> Option<Self> {
        if geometry.is_empty() {
            log::warn!("Drawable '{}' has no vertices and will not be created.", name);
            return None;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = geometry.indices.as_ref().map(|indices| {
            // index buffers must be a multiple of 4 bytes long
            let mut padded = indices.clone();
            if padded.len() % 2 == 1 {
                padded.push(0);
            }
            ledger.track(
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", name)),
                    contents: bytemuck::cast_slice(&padded),
                    usage: wgpu::BufferUsages::INDEX,
                }),
            )
        });
        log::debug!(
            "Drawable '{}': {} vertices, {} triangles",
            name,
            geometry.vertex_count(),
            geometry.triangle_count()
        );
        Some(Self {
            name: name.to_string(),
            vertex_buffer: ledger.track(vertex_buffer),
            index_buffer,
            vertex_count: geometry.vertex_count() as u32,
            index_count: geometry.index_count() as u32,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn triangle_count(&self) -> u32 {
        if self.is_indexed() {
            self.index_count / 3
        } else {
            self.vertex_count / 3
        }
    }
}

/// Draw calls for [`Drawable`]s, implemented on the render pass.
pub trait DrawDrawable {
    /// Sets the drawable's vertex buffer on slot 0 and its index buffer, if any.
    fn bind_drawable(&mut self, drawable: &Drawable);

    /// Binds and draws `instances` of the drawable. The instance buffer must
    /// already be set on slot 1.
    fn draw_drawable(&mut self, drawable: &Drawable, instances: Range<u32>);
}

impl DrawDrawable for wgpu::RenderPass<'_> {
    fn bind_drawable(&mut self, drawable: &Drawable) {
        self.set_vertex_buffer(0, drawable.vertex_buffer.slice(..));
        if let Some(index_buffer) = &drawable.index_buffer {
            self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        }
    }

    fn draw_drawable(&mut self, drawable: &Drawable, instances: Range<u32>) {
        self.bind_drawable(drawable);
        if drawable.is_indexed() {
            self.draw_indexed(0..drawable.index_count, 0, instances);
        } else {
            self.draw(0..drawable.vertex_count, instances);
        }
    }
}
