//! Render pipelines over two backends.
//!
//! A pipeline bundles one compiled shader program, one [`VertexLayout`],
//! one primitive [`Topology`], and at most one bound vertex buffer. The two
//! implementations satisfy the same [`Pipeline`] contract:
//! - [`raster::RasterPipeline`] — GL immediate-mode state binding (glow)
//! - [`device::DevicePipeline`] — command-buffer recording (wgpu)
//!
//! Callers construct a pipeline for whichever context they own and never
//! distinguish the variants afterwards.

mod error;

pub mod device;
pub mod raster;

pub use error::{PipelineError, ShaderError};

use crate::vertex::VertexLayout;

/// How consecutive vertices are grouped into drawable primitives.
///
/// The raster backend supports all variants. The device backend rejects
/// `LineLoop` and `TriangleFan` at construction; WebGPU-class APIs have no
/// such primitives.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Programmable shader stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// Construction parameters shared by both pipeline variants.
///
/// Shader source is opaque text in the backend's shading language: GLSL for
/// the raster backend, WGSL for the device backend. Entry points are expected
/// to be named `main` in each stage.
#[derive(Debug, Clone)]
pub struct PipelineDescriptor<'a> {
    /// Debug label used for backend objects and log lines.
    pub label: Option<&'a str>,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub layout: VertexLayout,
    pub topology: Topology,
}

/// Common contract of both pipeline variants.
///
/// Lifecycle: construct (fails fast on bad shaders or layout), then
/// [`set_vertex_buffer`](Pipeline::set_vertex_buffer) zero or more times,
/// then [`draw`](Pipeline::draw) once per frame.
pub trait Pipeline {
    /// Replaces the bound vertex buffer wholesale with `data` and recomputes
    /// the vertex count from the layout stride. There is no partial update.
    ///
    /// Safe to call before any `draw`.
    fn set_vertex_buffer(&mut self, data: &[f32]);

    /// Issues one draw covering the full vertex count with the configured
    /// topology. A defined no-op (not an error) until a vertex buffer has
    /// been set.
    fn draw(&mut self);
}
