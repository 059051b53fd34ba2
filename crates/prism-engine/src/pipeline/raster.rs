//! GL immediate-mode pipeline backend (glow).
//!
//! State binding happens directly against the GL context: the program and a
//! vertex array object are bound, then a single `draw_arrays` call covers the
//! whole buffer. Attribute pointers are (re)captured into the VAO whenever
//! the vertex buffer is replaced.
//!
//! Shader source is GLSL. Attribute slots map to `layout(location = N)`
//! qualifiers in the vertex shader.

use std::rc::Rc;

use glow::HasContext;

use crate::vertex::VertexLayout;

use super::{Pipeline, PipelineDescriptor, PipelineError, ShaderError, ShaderStage, Topology};

/// Shared handle to a live GL context.
///
/// The context is created by the embedding application (window + GL loader)
/// and shared read-only by every pipeline constructed against it. GL is
/// single-threaded; `Rc` matches that model.
#[derive(Clone)]
pub struct RasterContext {
    gl: Rc<glow::Context>,
}

impl RasterContext {
    pub fn new(gl: Rc<glow::Context>) -> Self {
        Self { gl }
    }

    /// Wraps a freshly loaded context.
    pub fn from_context(gl: glow::Context) -> Self {
        Self { gl: Rc::new(gl) }
    }

    #[inline]
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

/// Immediate-mode pipeline: GLSL program + VAO + one vertex buffer.
pub struct RasterPipeline {
    ctx: RasterContext,
    program: glow::NativeProgram,
    vao: glow::NativeVertexArray,
    layout: VertexLayout,
    mode: u32,
    buffer: Option<glow::NativeBuffer>,
    vertex_count: u32,
    label: String,
}

impl RasterPipeline {
    /// Compiles and links the shader pair and prepares attribute state.
    ///
    /// Fails fast on compile/link errors; any partially created GL object is
    /// deleted before returning.
    pub fn new(ctx: RasterContext, desc: &PipelineDescriptor<'_>) -> Result<Self, PipelineError> {
        let gl = Rc::clone(&ctx.gl);
        let label = desc.label.unwrap_or("raster pipeline").to_owned();

        let program = compile_program(&gl, desc.vertex_source, desc.fragment_source)?;

        let vao = match unsafe { gl.create_vertex_array() } {
            Ok(vao) => vao,
            Err(reason) => {
                unsafe { gl.delete_program(program) };
                return Err(PipelineError::Backend { reason });
            }
        };

        log::debug!("{label}: pipeline ready ({:?})", desc.topology);

        Ok(Self {
            ctx,
            program,
            vao,
            layout: desc.layout.clone(),
            mode: gl_mode(desc.topology),
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

impl Pipeline for RasterPipeline {
    fn set_vertex_buffer(&mut self, data: &[f32]) {
        let gl = Rc::clone(&self.ctx.gl);

        unsafe {
            if let Some(old) = self.buffer.take() {
                gl.delete_buffer(old);
            }

            let buffer = match gl.create_buffer() {
                Ok(buffer) => buffer,
                Err(reason) => {
                    // Runtime uploads must not fail the caller; leave the
                    // pipeline bufferless so draw() stays a no-op.
                    log::warn!("{}: vertex buffer creation failed: {reason}", self.label);
                    self.vertex_count = 0;
                    return;
                }
            };

            gl.bind_vertex_array(Some(self.vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(data), glow::STATIC_DRAW);

            // Attribute pointers capture the currently bound ARRAY_BUFFER
            // into the VAO, so they are re-applied per upload.
            let stride = self.layout.stride() as i32;
            for attr in self.layout.attributes() {
                gl.enable_vertex_attrib_array(attr.slot);
                gl.vertex_attrib_pointer_f32(
                    attr.slot,
                    attr.format.components() as i32,
                    glow::FLOAT,
                    false,
                    stride,
                    attr.offset as i32,
                );
            }

            gl.bind_vertex_array(None);

            self.buffer = Some(buffer);
            self.vertex_count = self.layout.vertex_count(std::mem::size_of_val(data));
        }
    }

    fn draw(&mut self) {
        if self.buffer.is_none() || self.vertex_count == 0 {
            return;
        }

        let gl = Rc::clone(&self.ctx.gl);
        unsafe {
            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(self.mode, 0, self.vertex_count as i32);
            gl.bind_vertex_array(None);
        }
    }
}

impl Drop for RasterPipeline {
    fn drop(&mut self) {
        let gl = Rc::clone(&self.ctx.gl);
        unsafe {
            if let Some(buffer) = self.buffer.take() {
                gl.delete_buffer(buffer);
            }
            gl.delete_vertex_array(self.vao);
            gl.delete_program(self.program);
        }
    }
}

// ── shader compilation ────────────────────────────────────────────────────

fn compile_shader(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::NativeShader, PipelineError> {
    let kind = match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    };

    unsafe {
        let shader = gl
            .create_shader(kind)
            .map_err(|reason| PipelineError::Backend { reason })?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(ShaderError::Compile { stage, log }.into());
        }

        Ok(shader)
    }
}

fn compile_program(
    gl: &glow::Context,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<glow::NativeProgram, PipelineError> {
    let vs = compile_shader(gl, ShaderStage::Vertex, vertex_source)?;
    let fs = match compile_shader(gl, ShaderStage::Fragment, fragment_source) {
        Ok(fs) => fs,
        Err(err) => {
            unsafe { gl.delete_shader(vs) };
            return Err(err);
        }
    };

    unsafe {
        let program = match gl.create_program() {
            Ok(program) => program,
            Err(reason) => {
                gl.delete_shader(vs);
                gl.delete_shader(fs);
                return Err(PipelineError::Backend { reason });
            }
        };

        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);

        let linked = gl.get_program_link_status(program);
        let log = if linked {
            String::new()
        } else {
            gl.get_program_info_log(program)
        };

        // Shaders are owned by the program once linked; detach + delete
        // either way so the program is the only live object.
        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);

        if !linked {
            gl.delete_program(program);
            return Err(ShaderError::Link { log }.into());
        }

        Ok(program)
    }
}

fn gl_mode(topology: Topology) -> u32 {
    match topology {
        Topology::Points => glow::POINTS,
        Topology::Lines => glow::LINES,
        Topology::LineLoop => glow::LINE_LOOP,
        Topology::LineStrip => glow::LINE_STRIP,
        Topology::Triangles => glow::TRIANGLES,
        Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        Topology::TriangleFan => glow::TRIANGLE_FAN,
    }
}
