//! Frame rendering.
//!
//! The [`Renderer`] owns everything that is drawn: the shader program, the
//! per-frame uniform buffer, the texture slots, one [`Drawable`] per
//! [`Primitive`] and a growable instance buffer. Each frame the scene items are
//! sorted into [`Batch`]es of equal primitives so every primitive costs a single
//! instanced draw call.

use std::{collections::HashMap, mem, ops::Range};

use wgpu::util::DeviceExt;

use crate::{
    clock::FrameTime,
    config::EngineConfig,
    context::Context,
    data_structures::{
        drawable::{DrawDrawable, Drawable},
        geometry::{Geometry, ModelVertex, Vertex},
        instance::InstanceRaw,
        scene::{Primitive, Scene, SceneItem},
        texture::Texture,
    },
    errors::Result,
    pipelines::basic::mk_scene_layouts,
    resources::{
        handle::{GpuHandle, ResourceLedger},
        shader::{ShaderProgram, load_program},
        texture::{TEXTURE_SLOTS, load_texture_slot},
    },
};

/// Consecutive instances drawn with the same primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub primitive: Primitive,
    pub instances: Range<u32>,
}

/// Flattens `items` into instance data grouped by primitive.
///
/// Items keep their insertion order inside a batch; batches follow
/// [`Primitive::ALL`].
pub fn plan_batches(items: &[SceneItem]) -> (Vec<InstanceRaw>, Vec<Batch>) {
    let mut raw = Vec::with_capacity(items.len());
    let mut batches = Vec::new();
    for primitive in Primitive::ALL {
        let start = raw.len() as u32;
        raw.extend(
            items
                .iter()
                .filter(|item| item.primitive == primitive)
                .map(|item| {
                    item.instance
                        .to_raw(item.material.color, item.material.texture_slot)
                }),
        );
        let end = raw.len() as u32;
        if end > start {
            batches.push(Batch {
                primitive,
                instances: start..end,
            });
        }
    }
    (raw, batches)
}

pub fn geometry_of(primitive: Primitive) -> Geometry {
    match primitive {
        Primitive::Triangle => Geometry::triangle(),
        Primitive::Quad => Geometry::quad(),
        Primitive::Cube => Geometry::cube(),
    }
}

/// The texture slots and the bind group exposing them.
///
/// Empty slots are bound to a 1×1 white placeholder.
#[derive(Debug)]
pub struct TextureUnits {
    bind_group: wgpu::BindGroup,
    slots: Vec<Option<Texture>>,
    placeholder: Texture,
}

impl TextureUnits {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ledger: &ResourceLedger,
        layout: &wgpu::BindGroupLayout,
        mut slots: Vec<Option<Texture>>,
    ) -> Self {
        slots.resize_with(TEXTURE_SLOTS as usize, || None);
        let placeholder = Texture::placeholder(device, queue, ledger);
        let bind_group = {
            let mut entries: Vec<wgpu::BindGroupEntry> = slots
                .iter()
                .enumerate()
                .map(|(binding, slot)| wgpu::BindGroupEntry {
                    binding: binding as u32,
                    resource: wgpu::BindingResource::TextureView(
                        &slot.as_ref().unwrap_or(&placeholder).view,
                    ),
                })
                .collect();
            if let Some(sampler) = &placeholder.sampler {
                entries.push(wgpu::BindGroupEntry {
                    binding: TEXTURE_SLOTS,
                    resource: wgpu::BindingResource::Sampler(sampler),
                });
            }
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout,
                entries: &entries,
                label: Some("texture_units_bind_group"),
            })
        };

        Self {
            bind_group,
            slots,
            placeholder,
        }
    }

    /// The texture sampled through `slot`: the loaded image, or the placeholder
    /// when the slot is empty.
    pub fn bound(&self, slot: usize) -> &Texture {
        match self.slots.get(slot) {
            Some(Some(texture)) => texture,
            _ => &self.placeholder,
        }
    }

    pub fn loaded(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn placeholder(&self) -> &Texture {
        &self.placeholder
    }
}

/// Direction the light travels in, world space.
const LIGHT_DIRECTION: [f32; 3] = [-0.2, -1.0, -0.3];
const AMBIENT: f32 = 0.3;
const INITIAL_INSTANCE_CAPACITY: usize = 16;

pub struct Renderer {
    program: ShaderProgram,
    globals_bind_group: wgpu::BindGroup,
    globals_buffer: GpuHandle<wgpu::Buffer>,
    textures: TextureUnits,
    drawables: HashMap<Primitive, Drawable>,
    instance_buffer: GpuHandle<wgpu::Buffer>,
    instance_capacity: usize,
    batches: Vec<Batch>,
}

impl Renderer {
    /// Loads the shader program and the texture slots and uploads the
    /// primitives.
    ///
    /// Resource failures only fail this call under the strict policy.
    pub async fn new(ctx: &Context, config: &EngineConfig) -> Result<Self> {
        let device = &ctx.device;
        let layouts = mk_scene_layouts(device);
        let vertex_layouts = [ModelVertex::desc(), InstanceRaw::desc()];

        if config.textures.len() > TEXTURE_SLOTS as usize {
            log::warn!(
                "{} textures configured but only {} slots exist; the rest are ignored",
                config.textures.len(),
                TEXTURE_SLOTS
            );
        }
        let texture_loads = config
            .textures
            .iter()
            .take(TEXTURE_SLOTS as usize)
            .map(|path| {
                load_texture_slot(
                    &config.assets_dir,
                    path,
                    device,
                    &ctx.queue,
                    &ctx.ledger,
                    config.failure_policy,
                )
            });
        let (build, slots) = futures::join!(
            load_program(&config.assets_dir, "scene", &config.shaders, &vertex_layouts),
            futures::future::join_all(texture_loads)
        );
        let slots = slots.into_iter().collect::<Result<Vec<_>>>()?;

        let program = ShaderProgram::link(
            device,
            &ctx.ledger,
            build,
            &layouts.pipeline,
            ctx.config.format,
            &vertex_layouts,
        )
        .await
        .checked(config.failure_policy)?;

        let globals_buffer = ctx.ledger.track(device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Globals Buffer"),
                contents: program.uniforms.bytes(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        ));
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.globals,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
            label: Some("globals_bind_group"),
        });

        let textures = TextureUnits::new(device, &ctx.queue, &ctx.ledger, &layouts.textures, slots);
        log::info!("{} of {} texture slots loaded", textures.loaded(), TEXTURE_SLOTS);

        let drawables = Primitive::ALL
            .iter()
            .filter_map(|primitive| {
                let name = format!("{:?}", primitive);
                Drawable::new(device, &ctx.ledger, &name, &geometry_of(*primitive))
                    .map(|drawable| (*primitive, drawable))
            })
            .collect();

        let instance_buffer = Self::mk_instance_buffer(device, &ctx.ledger, INITIAL_INSTANCE_CAPACITY);

        Ok(Self {
            program,
            globals_bind_group,
            globals_buffer,
            textures,
            drawables,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            batches: Vec::new(),
        })
    }

    fn mk_instance_buffer(
        device: &wgpu::Device,
        ledger: &ResourceLedger,
        capacity: usize,
    ) -> GpuHandle<wgpu::Buffer> {
        ledger.track(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (capacity * mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }))
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Writes the uniforms and the instance data of this frame.
    pub fn prepare(&mut self, ctx: &Context, scene: &Scene, time: &FrameTime) {
        let view_proj = ctx.projection.calc_matrix(ctx.camera.fovy) * ctx.camera.calc_view();
        let program = &mut self.program;
        program.set_mat4("view_proj", view_proj.into());
        program.set_vec4("view_position", ctx.camera.position.to_homogeneous().into());
        program.set_vec3("light_direction", LIGHT_DIRECTION);
        program.set_float("time", time.elapsed.as_secs_f32());
        program.set_float("ambient", AMBIENT);
        program.set_float("texture_strength", 1.0);
        program.uniforms.upload(&ctx.queue, &self.globals_buffer);

        let (raw, batches) = plan_batches(scene.items());
        if raw.len() > self.instance_capacity {
            self.instance_capacity = raw.len().next_power_of_two();
            self.instance_buffer =
                Self::mk_instance_buffer(&ctx.device, &ctx.ledger, self.instance_capacity);
            log::debug!("instance buffer grown to {}", self.instance_capacity);
        }
        if !raw.is_empty() {
            ctx.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw));
        }
        self.batches = batches;
    }

    /// Clears the frame, draws the prepared batches and presents.
    ///
    /// An invalid program still clears the frame; it just draws nothing.
    pub fn render(&self, ctx: &Context) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if self.program.use_program(&mut render_pass) && !self.batches.is_empty() {
                render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
                render_pass.set_bind_group(1, &self.textures.bind_group, &[]);
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                for batch in &self.batches {
                    if let Some(drawable) = self.drawables.get(&batch.primitive) {
                        render_pass.draw_drawable(drawable, batch.instances.clone());
                    }
                }
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
