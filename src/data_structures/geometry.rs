//! CPU-side vertex data and the built-in primitives.
//!
//! Raw vertex arrays come in the float layouts the shaders were written
//! against (position only, position + texcoord, position + color + texcoord).
//! [`Geometry::from_floats`] unpacks any of them into the single [`ModelVertex`]
//! format the pipeline consumes, filling absent attributes with defaults.

use cgmath::InnerSpace;

/// Anything that can describe its own vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Interleaving of a raw float array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayout {
    /// `x y z`
    Position,
    /// `x y z u v`
    PositionTexCoord,
    /// `x y z r g b u v`
    PositionColorTexCoord,
}

impl VertexLayout {
    /// Floats per vertex.
    pub fn stride(self) -> usize {
        match self {
            VertexLayout::Position => 3,
            VertexLayout::PositionTexCoord => 5,
            VertexLayout::PositionColorTexCoord => 8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Option<Vec<u16>>,
}

impl Geometry {
    /// Unpacks `data` laid out as `layout`.
    ///
    /// A trailing partial vertex is dropped with a warning. Normals are
    /// computed per triangle (flat shading).
    pub fn from_floats(data: &[f32], layout: VertexLayout, indices: Option<Vec<u16>>) -> Self {
        let stride = layout.stride();
        let remainder = data.len() % stride;
        if remainder != 0 {
            log::warn!(
                "vertex data has {} trailing floats that do not form a full {:?} vertex",
                remainder,
                layout
            );
        }
        let vertices = data
            .chunks_exact(stride)
            .map(|v| {
                let position = [v[0], v[1], v[2]];
                let (color, tex_coords) = match layout {
                    VertexLayout::Position => ([1.0; 3], [0.0; 2]),
                    VertexLayout::PositionTexCoord => ([1.0; 3], [v[3], v[4]]),
                    VertexLayout::PositionColorTexCoord => ([v[3], v[4], v[5]], [v[6], v[7]]),
                };
                ModelVertex {
                    position,
                    color,
                    tex_coords,
                    normal: [0.0; 3],
                }
            })
            .collect();
        let mut geometry = Self { vertices, indices };
        geometry.compute_flat_normals();
        geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }

    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertices.len() / 3,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn triangles(&self) -> Vec<[usize; 3]> {
        match &self.indices {
            Some(indices) => indices
                .chunks_exact(3)
                .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
                .collect(),
            None => (0..self.vertices.len() / 3)
                .map(|t| [t * 3, t * 3 + 1, t * 3 + 2])
                .collect(),
        }
    }

    /// Face normal of each triangle, accumulated and averaged on shared vertices.
    fn compute_flat_normals(&mut self) {
        let mut sums = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];
        for [a, b, c] in self.triangles() {
            if a >= sums.len() || b >= sums.len() || c >= sums.len() {
                log::warn!("index ({}, {}, {}) is out of range, skipping triangle", a, b, c);
                continue;
            }
            let p0: cgmath::Vector3<f32> = self.vertices[a].position.into();
            let p1: cgmath::Vector3<f32> = self.vertices[b].position.into();
            let p2: cgmath::Vector3<f32> = self.vertices[c].position.into();
            let face = (p1 - p0).cross(p2 - p0);
            sums[a] += face;
            sums[b] += face;
            sums[c] += face;
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            // degenerate triangles keep a zero normal
            if sum.magnitude2() > f32::EPSILON {
                vertex.normal = sum.normalize().into();
            }
        }
    }

    /// The coloured "hello triangle".
    pub fn triangle() -> Self {
        #[rustfmt::skip]
        let data = [
            // positions        // colors        // texture coords
             0.5, -0.5, 0.0,    1.0, 0.0, 0.0,   1.0, 0.0,
            -0.5, -0.5, 0.0,    0.0, 1.0, 0.0,   0.0, 0.0,
             0.0,  0.5, 0.0,    0.0, 0.0, 1.0,   0.5, 1.0,
        ];
        Self::from_floats(&data, VertexLayout::PositionColorTexCoord, None)
    }

    /// A textured rectangle drawn through an index buffer.
    pub fn quad() -> Self {
        #[rustfmt::skip]
        let data = [
             0.5,  0.5, 0.0,   1.0, 0.0, 0.0,   1.0, 1.0, // top right
             0.5, -0.5, 0.0,   0.0, 1.0, 0.0,   1.0, 0.0, // bottom right
            -0.5, -0.5, 0.0,   0.0, 0.0, 1.0,   0.0, 0.0, // bottom left
            -0.5,  0.5, 0.0,   1.0, 1.0, 0.0,   0.0, 1.0, // top left
        ];
        Self::from_floats(
            &data,
            VertexLayout::PositionColorTexCoord,
            Some(vec![0, 1, 3, 1, 2, 3]),
        )
    }

    /// A unit cube as 36 unindexed vertices (6 faces, 2 triangles each).
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let data = [
            -0.5, -0.5, -0.5,  0.0, 0.0,
             0.5, -0.5, -0.5,  1.0, 0.0,
             0.5,  0.5, -0.5,  1.0, 1.0,
             0.5,  0.5, -0.5,  1.0, 1.0,
            -0.5,  0.5, -0.5,  0.0, 1.0,
            -0.5, -0.5, -0.5,  0.0, 0.0,

            -0.5, -0.5,  0.5,  0.0, 0.0,
             0.5, -0.5,  0.5,  1.0, 0.0,
             0.5,  0.5,  0.5,  1.0, 1.0,
             0.5,  0.5,  0.5,  1.0, 1.0,
            -0.5,  0.5,  0.5,  0.0, 1.0,
            -0.5, -0.5,  0.5,  0.0, 0.0,

            -0.5,  0.5,  0.5,  1.0, 0.0,
            -0.5,  0.5, -0.5,  1.0, 1.0,
            -0.5, -0.5, -0.5,  0.0, 1.0,
            -0.5, -0.5, -0.5,  0.0, 1.0,
            -0.5, -0.5,  0.5,  0.0, 0.0,
            -0.5,  0.5,  0.5,  1.0, 0.0,

             0.5,  0.5,  0.5,  1.0, 0.0,
             0.5,  0.5, -0.5,  1.0, 1.0,
             0.5, -0.5, -0.5,  0.0, 1.0,
             0.5, -0.5, -0.5,  0.0, 1.0,
             0.5, -0.5,  0.5,  0.0, 0.0,
             0.5,  0.5,  0.5,  1.0, 0.0,

            -0.5, -0.5, -0.5,  0.0, 1.0,
             0.5, -0.5, -0.5,  1.0, 1.0,
             0.5, -0.5,  0.5,  1.0, 0.0,
             0.5, -0.5,  0.5,  1.0, 0.0,
            -0.5, -0.5,  0.5,  0.0, 0.0,
            -0.5, -0.5, -0.5,  0.0, 1.0,

            -0.5,  0.5, -0.5,  0.0, 1.0,
             0.5,  0.5, -0.5,  1.0, 1.0,
             0.5,  0.5,  0.5,  1.0, 0.0,
             0.5,  0.5,  0.5,  1.0, 0.0,
            -0.5,  0.5,  0.5,  0.0, 0.0,
            -0.5,  0.5, -0.5,  0.0, 1.0,
        ];
        Self::from_floats(&data, VertexLayout::PositionTexCoord, None)
    }
}
