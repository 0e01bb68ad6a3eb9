//! Named uniform slots.
//!
//! The uniform block of a program is reflected from its WGSL source: the
//! `var<uniform>` at `@group(0) @binding(0)` must be a struct, and every member
//! of a supported type becomes a named [`UniformField`] at its std140 offset.
//! Values are written by name into a CPU copy of the block and uploaded once per
//! frame.

use naga::{ScalarKind, TypeInner, VectorSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Uint,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Bytes written for a value of this kind.
    pub fn size(self) -> usize {
        match self {
            UniformKind::Float | UniformKind::Int | UniformKind::Uint => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }

    fn from_naga(inner: &TypeInner) -> Option<Self> {
        match inner {
            TypeInner::Scalar(scalar) if scalar.width == 4 => match scalar.kind {
                ScalarKind::Float => Some(UniformKind::Float),
                ScalarKind::Sint => Some(UniformKind::Int),
                ScalarKind::Uint => Some(UniformKind::Uint),
                _ => None,
            },
            TypeInner::Vector { size, scalar }
                if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
            {
                match size {
                    VectorSize::Tri => Some(UniformKind::Vec3),
                    VectorSize::Quad => Some(UniformKind::Vec4),
                    _ => None,
                }
            }
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar.kind == ScalarKind::Float && scalar.width == 4 => Some(UniformKind::Mat4),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u32,
}

/// Member names, kinds and offsets of one uniform struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: u32,
}

impl UniformLayout {
    /// Reads the struct bound at `@group(group) @binding(binding)` in `module`.
    ///
    /// Returns `None` when the module declares no uniform there. Members of
    /// unsupported types are skipped but still count towards the size.
    pub fn reflect(module: &naga::Module, group: u32, binding: u32) -> Option<Self> {
        let (_, global) = module.global_variables.iter().find(|(_, var)| {
            var.space == naga::AddressSpace::Uniform
                && var
                    .binding
                    .as_ref()
                    .is_some_and(|rb| rb.group == group && rb.binding == binding)
        })?;

        match &module.types[global.ty].inner {
            TypeInner::Struct { members, span } => {
                let mut fields = Vec::with_capacity(members.len());
                for member in members {
                    let name = match &member.name {
                        Some(name) => name.clone(),
                        None => continue,
                    };
                    match UniformKind::from_naga(&module.types[member.ty].inner) {
                        Some(kind) => fields.push(UniformField {
                            name,
                            kind,
                            offset: member.offset,
                        }),
                        None => log::debug!("uniform member '{}' has an unsupported type", name),
                    }
                }
                Some(Self {
                    fields,
                    size: *span,
                })
            }
            // a bare `var<uniform> x: f32` is a one-field block named after the variable
            other => {
                let kind = UniformKind::from_naga(other)?;
                let name = global.name.clone()?;
                Some(Self {
                    fields: vec![UniformField {
                        name,
                        kind,
                        offset: 0,
                    }],
                    size: kind.size() as u32,
                })
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Byte size of the struct as declared (before padding to 16).
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// CPU copy of a uniform block, written by field name.
///
/// Every setter resolves the name on each call. An unknown name or a value of
/// the wrong kind leaves the block untouched and returns `false`.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        // uniform buffers are bound in 16 byte units
        let len = (layout.size().max(16) as usize).next_multiple_of(16);
        Self {
            layout,
            bytes: vec![0; len],
            dirty: true,
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    fn write(&mut self, name: &str, accepts: impl Fn(UniformKind) -> bool, value: &[u8]) -> bool {
        let field = match self.layout.field(name) {
            Some(field) => field,
            None => {
                log::trace!("no uniform named '{}'", name);
                return false;
            }
        };
        if !accepts(field.kind) {
            log::trace!("uniform '{}' is a {:?}", name, field.kind);
            return false;
        }
        let start = field.offset as usize;
        let end = start + value.len();
        if end > self.bytes.len() {
            log::trace!("uniform '{}' lies outside the block", name);
            return false;
        }
        self.bytes[start..end].copy_from_slice(value);
        self.dirty = true;
        true
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> bool {
        self.write(name, |k| k == UniformKind::Int, bytemuck::bytes_of(&value))
    }

    pub fn set_uint(&mut self, name: &str, value: u32) -> bool {
        self.write(name, |k| k == UniformKind::Uint, bytemuck::bytes_of(&value))
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> bool {
        self.write(name, |k| k == UniformKind::Float, bytemuck::bytes_of(&value))
    }

    /// Stored as 0 or 1 in an `i32` or `u32` member.
    pub fn set_bool(&mut self, name: &str, value: bool) -> bool {
        let value = value as u32;
        self.write(
            name,
            |k| matches!(k, UniformKind::Int | UniformKind::Uint),
            bytemuck::bytes_of(&value),
        )
    }

    pub fn set_vec3(&mut self, name: &str, value: [f32; 3]) -> bool {
        self.write(name, |k| k == UniformKind::Vec3, bytemuck::cast_slice(&value))
    }

    pub fn set_vec4(&mut self, name: &str, value: [f32; 4]) -> bool {
        self.write(name, |k| k == UniformKind::Vec4, bytemuck::cast_slice(&value))
    }

    /// Column-major, as produced by `cgmath::Matrix4::into`.
    pub fn set_mat4(&mut self, name: &str, value: [[f32; 4]; 4]) -> bool {
        self.write(name, |k| k == UniformKind::Mat4, bytemuck::cast_slice(&value))
    }

    /// Current bytes of field `name`.
    pub fn field_bytes(&self, name: &str) -> Option<&[u8]> {
        let field = self.layout.field(name)?;
        let start = field.offset as usize;
        self.bytes.get(start..start + field.kind.size())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the block into `buffer` if anything changed since the last upload.
    pub fn upload(&mut self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        if self.dirty {
            queue.write_buffer(buffer, 0, &self.bytes);
            self.dirty = false;
        }
    }
}
