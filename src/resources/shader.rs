//! Shader programs: WGSL stages checked with naga, then linked into a wgpu
//! render pipeline.
//!
//! Building a program never fails outright. Every problem becomes a
//! [`Diagnostic`], and a program with at least one error diagnostic simply has
//! no pipeline ([`ShaderProgram::is_valid`] is `false`). Such a program still
//! accepts uniform updates and [`ShaderProgram::use_program`] turns into a
//! no-op, so the frame is cleared but nothing is drawn.
//!
//! Sources are validated with naga first, so wgpu only sees stages that
//! compile and whose interface matches the pipeline layout. Whatever wgpu
//! still rejects is caught in a validation error scope and reported as a link
//! diagnostic.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use naga::{AddressSpace, Binding, ScalarKind, TypeInner};
use serde::Deserialize;

use crate::{
    config::FailurePolicy,
    errors::{CubeError, Result},
    pipelines::basic::mk_render_pipeline,
    resources::{
        handle::{GpuHandle, ResourceLedger},
        load_string,
        texture::TEXTURE_SLOTS,
        uniform::{UniformBlock, UniformLayout},
    },
};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Group and binding of the per-frame uniform block.
pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;
/// Group holding the texture slots (bindings `0..TEXTURE_SLOTS`) and the sampler.
pub const TEXTURE_GROUP: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
    Geometry,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
            Stage::Geometry => f.write_str("geometry"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One compile or link message. `stage` is `None` for link problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Option<Stage>,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    fn error(stage: Option<Stage>, message: impl Into<String>) -> Self {
        Self {
            stage,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(stage: Option<Stage>, message: impl Into<String>) -> Self {
        Self {
            stage,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.stage {
            Some(stage) => write!(f, "[{}] {}: {}", stage, severity, self.message),
            None => write!(f, "[link] {}: {}", severity, self.message),
        }
    }
}

/// Shader file names relative to the assets directory (`[shaders]` table).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
    /// Accepted for compatibility; reported and ignored.
    pub geometry: Option<PathBuf>,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("shaders/scene.vert.wgsl"),
            fragment: PathBuf::from("shaders/scene.frag.wgsl"),
            geometry: None,
        }
    }
}

/// A stage that parsed and validated.
#[derive(Debug)]
pub struct CompiledStage {
    source: String,
    pub module: naga::Module,
}

/// Parses and validates one WGSL stage.
pub fn compile_stage(stage: Stage, source: &str) -> std::result::Result<naga::Module, Diagnostic> {
    if source.trim().is_empty() {
        return Err(Diagnostic::error(Some(stage), "source is empty"));
    }
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| Diagnostic::error(Some(stage), e.emit_to_string(source)))?;
    // only what every adapter supports
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator
        .validate(&module)
        .map_err(|e| Diagnostic::error(Some(stage), format!("validation error: {}", e)))?;
    Ok(module)
}

/// Result of compiling and link-checking the stages of one program.
#[derive(Debug)]
pub struct ProgramBuild {
    pub label: String,
    pub vertex: Option<CompiledStage>,
    pub fragment: Option<CompiledStage>,
    pub uniforms: UniformLayout,
    pub diagnostics: Vec<Diagnostic>,
}

impl ProgramBuild {
    /// Compiles `vertex` and `fragment` (and notes `geometry`), then checks that
    /// they link against each other and against `vertex_layouts`.
    pub fn from_sources(
        label: &str,
        vertex: &str,
        fragment: &str,
        geometry: Option<&str>,
        vertex_layouts: &[wgpu::VertexBufferLayout],
    ) -> Self {
        let mut diagnostics = Vec::new();
        let mut compile = |stage: Stage, source: &str| match compile_stage(stage, source) {
            Ok(module) => Some(CompiledStage {
                source: source.to_string(),
                module,
            }),
            Err(diagnostic) => {
                diagnostics.push(diagnostic);
                None
            }
        };
        let vertex = compile(Stage::Vertex, vertex);
        let fragment = compile(Stage::Fragment, fragment);
        if geometry.is_some() {
            diagnostics.push(Diagnostic::warning(
                Some(Stage::Geometry),
                "geometry shaders are not supported by the pipeline; stage ignored",
            ));
        }

        let mut build = Self {
            label: label.to_string(),
            vertex,
            fragment,
            uniforms: UniformLayout::default(),
            diagnostics,
        };
        build.link_check(vertex_layouts);
        build.log_diagnostics();
        build
    }

    fn log_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Error => log::error!("shader '{}' {}", self.label, diagnostic),
                Severity::Warning => log::warn!("shader '{}' {}", self.label, diagnostic),
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// All diagnostics, one per line.
    pub fn report(&self) -> String {
        self.diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn link_check(&mut self, vertex_layouts: &[wgpu::VertexBufferLayout]) {
        let (vertex, fragment) = match (&self.vertex, &self.fragment) {
            (Some(v), Some(f)) => (&v.module, &f.module),
            // nothing to link; the compile diagnostics already explain why
            _ => return,
        };
        let mut errors = Vec::new();

        let vs = find_entry(vertex, naga::ShaderStage::Vertex, VERTEX_ENTRY);
        let fs = find_entry(fragment, naga::ShaderStage::Fragment, FRAGMENT_ENTRY);
        if vs.is_none() {
            errors.push(format!("vertex module has no @vertex fn {}", VERTEX_ENTRY));
        }
        if fs.is_none() {
            errors.push(format!("fragment module has no @fragment fn {}", FRAGMENT_ENTRY));
        }

        if let (Some(vs), Some(fs)) = (vs, fs) {
            let provided = attribute_kinds(vertex_layouts);
            for input in entry_inputs(vertex, vs) {
                match provided.get(&input.location) {
                    None => errors.push(format!(
                        "vertex input @location({}) is not provided by any vertex buffer",
                        input.location
                    )),
                    Some(kind) if scalar_kind(&input.ty) != Some(*kind) => errors.push(format!(
                        "vertex input @location({}) does not match the buffer format",
                        input.location
                    )),
                    Some(_) => {}
                }
            }

            let outputs: HashMap<u32, Varying> = entry_outputs(vertex, vs)
                .into_iter()
                .map(|output| (output.location, output))
                .collect();
            for input in entry_inputs(fragment, fs) {
                match outputs.get(&input.location) {
                    None => errors.push(format!(
                        "fragment input @location({}) is not written by the vertex stage",
                        input.location
                    )),
                    Some(out) if out.ty != input.ty => errors.push(format!(
                        "@location({}) has different types in the vertex and fragment stages",
                        input.location
                    )),
                    Some(out)
                        if out.interpolation != input.interpolation
                            || out.sampling != input.sampling =>
                    {
                        errors.push(format!(
                            "@location({}) is interpolated differently in the vertex and fragment stages",
                            input.location
                        ))
                    }
                    Some(_) => {}
                }
            }

            match entry_outputs(fragment, fs).iter().find(|o| o.location == 0) {
                None => errors.push("fragment stage writes no colour to @location(0)".to_string()),
                // every colour target the renderer draws into is a float format
                Some(colour) if scalar_kind(&colour.ty) != Some(ScalarKind::Float) => errors
                    .push("fragment @location(0) must be a float value for the colour target".to_string()),
                Some(_) => {}
            }
        }

        for (stage, module) in [(Stage::Vertex, vertex), (Stage::Fragment, fragment)] {
            errors.extend(
                unknown_bindings(stage, module)
                    .into_iter()
                    .map(|m| format!("{} stage: {}", stage, m)),
            );
        }

        let vs_uniforms = UniformLayout::reflect(vertex, UNIFORM_GROUP, UNIFORM_BINDING);
        let fs_uniforms = UniformLayout::reflect(fragment, UNIFORM_GROUP, UNIFORM_BINDING);
        self.uniforms = match (vs_uniforms, fs_uniforms) {
            (Some(v), Some(f)) if v != f => {
                errors.push("the uniform block differs between the vertex and fragment stages".to_string());
                v
            }
            (Some(v), _) => v,
            (None, Some(f)) => f,
            (None, None) => UniformLayout::default(),
        };

        self.diagnostics
            .extend(errors.into_iter().map(|m| Diagnostic::error(None, m)));
    }
}

fn find_entry<'m>(
    module: &'m naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
}

/// A user-defined stage input or output.
struct Varying {
    location: u32,
    ty: TypeInner,
    interpolation: Option<naga::Interpolation>,
    sampling: Option<naga::Sampling>,
}

impl Varying {
    fn from_binding(module: &naga::Module, ty: naga::Handle<naga::Type>, binding: &Binding) -> Option<Self> {
        match binding {
            Binding::Location {
                location,
                interpolation,
                sampling,
                ..
            } => Some(Self {
                location: *location,
                ty: module.types[ty].inner.clone(),
                interpolation: *interpolation,
                sampling: *sampling,
            }),
            Binding::BuiltIn(_) => None,
        }
    }
}

/// Locations bound on a value of type `ty`, descending one level into structs.
fn locations(module: &naga::Module, ty: naga::Handle<naga::Type>, binding: Option<&Binding>) -> Vec<Varying> {
    match binding {
        Some(binding) => Varying::from_binding(module, ty, binding).into_iter().collect(),
        None => match &module.types[ty].inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|m| Varying::from_binding(module, m.ty, m.binding.as_ref()?))
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn entry_inputs(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<Varying> {
    entry
        .function
        .arguments
        .iter()
        .flat_map(|arg| locations(module, arg.ty, arg.binding.as_ref()))
        .collect()
}

fn entry_outputs(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<Varying> {
    entry
        .function
        .result
        .as_ref()
        .map(|result| locations(module, result.ty, result.binding.as_ref()))
        .unwrap_or_default()
}

fn scalar_kind(inner: &TypeInner) -> Option<ScalarKind> {
    match inner {
        TypeInner::Scalar(scalar) | TypeInner::Vector { scalar, .. } => Some(scalar.kind),
        _ => None,
    }
}

/// Shader scalar kind each vertex attribute location feeds.
fn attribute_kinds(layouts: &[wgpu::VertexBufferLayout]) -> HashMap<u32, ScalarKind> {
    use wgpu::VertexFormat as F;
    layouts
        .iter()
        .flat_map(|layout| layout.attributes.iter())
        .filter_map(|attr| {
            let kind = match attr.format {
                F::Float32 | F::Float32x2 | F::Float32x3 | F::Float32x4 => ScalarKind::Float,
                F::Sint32 | F::Sint32x2 | F::Sint32x3 | F::Sint32x4 => ScalarKind::Sint,
                F::Uint32 | F::Uint32x2 | F::Uint32x3 | F::Uint32x4 => ScalarKind::Uint,
                _ => return None,
            };
            Some((attr.shader_location, kind))
        })
        .collect()
}

/// Resource bindings the module declares that the renderer does not provide
/// to `stage`. The texture group is only visible to the fragment stage.
fn unknown_bindings(stage: Stage, module: &naga::Module) -> Vec<String> {
    module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let rb = var.binding.as_ref()?;
            let inner = &module.types[var.ty].inner;
            let provided = match (rb.group, rb.binding) {
                (UNIFORM_GROUP, UNIFORM_BINDING) => var.space == AddressSpace::Uniform,
                (TEXTURE_GROUP, _) if stage != Stage::Fragment => false,
                (TEXTURE_GROUP, b) if b < TEXTURE_SLOTS => matches!(
                    inner,
                    TypeInner::Image {
                        dim: naga::ImageDimension::D2,
                        arrayed: false,
                        class: naga::ImageClass::Sampled {
                            kind: ScalarKind::Float,
                            multi: false
                        },
                    }
                ),
                (TEXTURE_GROUP, b) if b == TEXTURE_SLOTS => {
                    matches!(inner, TypeInner::Sampler { comparison: false })
                }
                _ => false,
            };
            (!provided).then(|| {
                format!(
                    "@group({}) @binding({}) is not provided by the renderer",
                    rb.group, rb.binding
                )
            })
        })
        .collect()
}

async fn read_stage(
    assets_dir: &Path,
    stage: Stage,
    path: &Path,
    errors: &mut Vec<Diagnostic>,
) -> String {
    match load_string(assets_dir, path).await {
        Ok(source) => source,
        Err(e) => {
            errors.push(Diagnostic::error(
                Some(stage),
                format!("could not read {}: {:#}", path.display(), e),
            ));
            String::new()
        }
    }
}

/// Reads and compiles the program at `paths` (relative to `assets_dir`).
///
/// Unreadable files become diagnostics of their stage; this never fails.
pub async fn load_program(
    assets_dir: &Path,
    label: &str,
    paths: &ShaderPaths,
    vertex_layouts: &[wgpu::VertexBufferLayout<'_>],
) -> ProgramBuild {
    let mut read_errors = Vec::new();
    let vertex = read_stage(assets_dir, Stage::Vertex, &paths.vertex, &mut read_errors).await;
    let fragment = read_stage(assets_dir, Stage::Fragment, &paths.fragment, &mut read_errors).await;
    let geometry = match &paths.geometry {
        Some(path) => Some(read_stage(assets_dir, Stage::Geometry, path, &mut read_errors).await),
        None => None,
    };

    let mut build = ProgramBuild::from_sources(
        label,
        &vertex,
        &fragment,
        geometry.as_deref(),
        vertex_layouts,
    );
    if !read_errors.is_empty() {
        for diagnostic in &read_errors {
            log::error!("shader '{}' {}", label, diagnostic);
        }
        // a missing file also produced an "empty source" diagnostic; keep the clearer one
        build.diagnostics.retain(|d| {
            !(d.message == "source is empty" && read_errors.iter().any(|r| r.stage == d.stage))
        });
        build.diagnostics.splice(0..0, read_errors);
    }
    build
}

/// A linked program: pipeline (if valid), its uniform block and the
/// diagnostics it was built with.
#[derive(Debug)]
pub struct ShaderProgram {
    pub label: String,
    pipeline: Option<GpuHandle<wgpu::RenderPipeline>>,
    pub uniforms: UniformBlock,
    diagnostics: Vec<Diagnostic>,
}

impl ShaderProgram {
    /// A program with no pipeline.
    pub fn invalid(label: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            label: label.to_string(),
            pipeline: None,
            uniforms: UniformBlock::new(UniformLayout::default()),
            diagnostics,
        }
    }

    /// Creates the render pipeline for `build`, unless it has errors.
    ///
    /// Pipeline creation runs inside a validation error scope: anything wgpu
    /// still rejects becomes a link diagnostic and leaves the program without
    /// a pipeline. The wgpu shader modules only live for the duration of this
    /// call.
    pub async fn link(
        device: &wgpu::Device,
        ledger: &ResourceLedger,
        build: ProgramBuild,
        layout: &wgpu::PipelineLayout,
        color_format: wgpu::TextureFormat,
        vertex_layouts: &[wgpu::VertexBufferLayout<'_>],
    ) -> Self {
        let has_errors = build.has_errors();
        let ProgramBuild {
            label,
            vertex,
            fragment,
            uniforms,
            mut diagnostics,
        } = build;

        let pipeline = match (vertex, fragment) {
            (Some(vertex), Some(fragment)) if !has_errors => {
                let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
                let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&format!("{} vertex", label)),
                    source: wgpu::ShaderSource::Wgsl(vertex.source.into()),
                });
                let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&format!("{} fragment", label)),
                    source: wgpu::ShaderSource::Wgsl(fragment.source.into()),
                });
                let pipeline = mk_render_pipeline(
                    device,
                    layout,
                    color_format,
                    Some(wgpu::BlendState::ALPHA_BLENDING),
                    Some(crate::data_structures::texture::Texture::DEPTH_FORMAT),
                    vertex_layouts,
                    &vs,
                    &fs,
                );
                match scope.pop().await {
                    None => {
                        log::info!("shader program '{}' linked", label);
                        Some(ledger.track(pipeline))
                    }
                    Some(error) => {
                        let diagnostic = Diagnostic::error(None, error.to_string());
                        log::error!("shader '{}' {}", label, diagnostic);
                        diagnostics.push(diagnostic);
                        None
                    }
                }
            }
            _ => None,
        };
        if pipeline.is_none() {
            log::error!("shader program '{}' is invalid; nothing will be drawn with it", label);
        }

        Self {
            label,
            pipeline,
            uniforms: UniformBlock::new(uniforms),
            diagnostics,
        }
    }

    /// Applies `policy`: a strict policy turns an invalid program into an error.
    pub fn checked(self, policy: FailurePolicy) -> Result<Self> {
        match policy {
            FailurePolicy::Strict if !self.is_valid() => Err(CubeError::Shader {
                label: self.label.clone(),
                diagnostics: self
                    .diagnostics
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            }),
            _ => Ok(self),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Sets the pipeline on `pass`. Returns `false` (and does nothing) for an
    /// invalid program.
    pub fn use_program(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        match &self.pipeline {
            Some(pipeline) => {
                pass.set_pipeline(pipeline);
                true
            }
            None => false,
        }
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> bool {
        self.uniforms.set_int(name, value)
    }

    pub fn set_uint(&mut self, name: &str, value: u32) -> bool {
        self.uniforms.set_uint(name, value)
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> bool {
        self.uniforms.set_float(name, value)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> bool {
        self.uniforms.set_bool(name, value)
    }

    pub fn set_vec3(&mut self, name: &str, value: [f32; 3]) -> bool {
        self.uniforms.set_vec3(name, value)
    }

    pub fn set_vec4(&mut self, name: &str, value: [f32; 4]) -> bool {
        self.uniforms.set_vec4(name, value)
    }

    pub fn set_mat4(&mut self, name: &str, value: [[f32; 4]; 4]) -> bool {
        self.uniforms.set_mat4(name, value)
    }
}
