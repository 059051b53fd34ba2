//! Command-buffer pipeline backend (wgpu).
//!
//! Each draw records a single render pass into a fresh encoder and submits
//! it to the queue. The pass loads the existing target contents
//! (`LoadOp::Load`), so pipelines drawn later in a frame paint over earlier
//! ones; clearing belongs to whoever owns the target.
//!
//! Shader source is WGSL. Both stages are expected to expose an entry point
//! named `main`.

use std::rc::Rc;

use wgpu::util::DeviceExt;

use crate::vertex::{AttributeFormat, VertexLayout};

use super::{Pipeline, PipelineDescriptor, PipelineError, ShaderError, ShaderStage, Topology};

/// Source of the per-frame color view a pipeline records against.
///
/// Window glue implements this over its surface (acquire the current
/// swapchain texture and hand out a view); [`TextureTarget`] covers
/// offscreen/headless rendering. Returning `None` skips the frame.
pub trait DrawTarget {
    fn color_view(&self) -> Option<wgpu::TextureView>;
}

/// Offscreen render target backed by a plain texture.
pub struct TextureTarget {
    texture: wgpu::Texture,
}

impl TextureTarget {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("prism offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        Self { texture }
    }

    /// Backing texture, e.g. for readback in tests.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

impl DrawTarget for TextureTarget {
    fn color_view(&self) -> Option<wgpu::TextureView> {
        Some(
            self.texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
        )
    }
}

/// Pipeline-facing device context: core wgpu objects plus the draw target.
///
/// Shared read-only by every pipeline constructed against it (wgpu device
/// and queue handles are cheap clones of the same underlying objects).
#[derive(Clone)]
pub struct DeviceContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    target: Rc<dyn DrawTarget>,
}

impl DeviceContext {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        target: Rc<dyn DrawTarget>,
    ) -> Self {
        Self {
            device,
            queue,
            color_format,
            target,
        }
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Color format pipelines render into.
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }
}

/// Command-buffer pipeline: WGSL program + render pipeline + one vertex
/// buffer.
pub struct DevicePipeline {
    ctx: DeviceContext,
    pipeline: wgpu::RenderPipeline,
    layout: VertexLayout,
    buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    label: String,
}

impl std::fmt::Debug for DevicePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevicePipeline")
            .field("label", &self.label)
            .field("vertex_count", &self.vertex_count)
            .finish_non_exhaustive()
    }
}

impl DevicePipeline {
    /// Builds shader modules and the render pipeline.
    ///
    /// wgpu reports shader and pipeline validation failures through error
    /// scopes rather than per-stage results; a scope error around module
    /// creation is surfaced as a compile error for that stage, one around
    /// pipeline creation as a link error. Nothing is retained on failure.
    pub fn new(ctx: DeviceContext, desc: &PipelineDescriptor<'_>) -> Result<Self, PipelineError> {
        let label = desc.label.unwrap_or("device pipeline").to_owned();

        let topology = device_topology(desc.topology)
            .ok_or(PipelineError::UnsupportedTopology { topology: desc.topology })?;

        let vertex_module =
            create_shader_module(&ctx.device, &label, ShaderStage::Vertex, desc.vertex_source)?;
        let fragment_module = create_shader_module(
            &ctx.device,
            &label,
            ShaderStage::Fragment,
            desc.fragment_source,
        )?;

        let attributes: Vec<wgpu::VertexAttribute> = desc
            .layout
            .attributes()
            .iter()
            .map(|attr| wgpu::VertexAttribute {
                format: device_format(attr.format),
                offset: attr.offset as u64,
                shader_location: attr.slot,
            })
            .collect();

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&label),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

        let error_scope = ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&label),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: desc.layout.stride() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.color_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(ShaderError::Link {
                log: err.to_string(),
            }
            .into());
        }

        log::debug!("{label}: pipeline ready ({:?})", desc.topology);

        Ok(Self {
            ctx,
            pipeline,
            layout: desc.layout.clone(),
            buffer: None,
            vertex_count: 0,
            label,
        })
    }

    /// Vertices covered by the current buffer (0 until one is set).
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

impl Pipeline for DevicePipeline {
    fn set_vertex_buffer(&mut self, data: &[f32]) {
        // Full replace: the previous buffer is dropped (and freed by wgpu)
        // once no submitted work references it.
        let buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&self.label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });

        self.buffer = Some(buffer);
        self.vertex_count = self.layout.vertex_count(std::mem::size_of_val(data));
    }

    fn draw(&mut self) {
        let Some(buffer) = self.buffer.as_ref() else {
            return;
        };
        if self.vertex_count == 0 {
            return;
        }

        let Some(view) = self.ctx.target.color_view() else {
            log::debug!("{}: no draw target this frame; skipping", self.label);
            return;
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&self.label),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&self.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_vertex_buffer(0, buffer.slice(..));
            rpass.draw(0..self.vertex_count, 0..1);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }
}

// ── helpers ───────────────────────────────────────────────────────────────

fn create_shader_module(
    device: &wgpu::Device,
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    if let Some(err) = pollster::block_on(error_scope.pop()) {
        return Err(ShaderError::Compile {
            stage,
            log: err.to_string(),
        });
    }

    Ok(module)
}

/// WebGPU-class APIs have no LineLoop/TriangleFan primitive.
fn device_topology(topology: Topology) -> Option<wgpu::PrimitiveTopology> {
    match topology {
        Topology::Points => Some(wgpu::PrimitiveTopology::PointList),
        Topology::Lines => Some(wgpu::PrimitiveTopology::LineList),
        Topology::LineStrip => Some(wgpu::PrimitiveTopology::LineStrip),
        Topology::Triangles => Some(wgpu::PrimitiveTopology::TriangleList),
        Topology::TriangleStrip => Some(wgpu::PrimitiveTopology::TriangleStrip),
        Topology::LineLoop | Topology::TriangleFan => None,
    }
}

fn device_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32 => wgpu::VertexFormat::Float32,
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}
