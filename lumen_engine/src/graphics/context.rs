/// GraphicsContext trait - the capability set every backend implements
///
/// The context owns all GPU-side objects and the "current binding" state
/// (program, framebuffer, vertex array). Objects are referred to by slotmap
/// keys; the wrapper types in this crate (ShaderProgram, Framebuffer,
/// VertexArray, ...) own those keys and release them on drop.

use std::sync::{Arc, Mutex, MutexGuard};
use glam::{Mat4, Vec4};
use slotmap::new_key_type;
use bitflags::bitflags;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::engine_err;
use crate::graphics::{BufferLayout, TextureDesc, HeadlessContext};
use crate::shader::ShaderStage;

// ===== HANDLES =====

new_key_type! {
    /// Compiled (or loading) shader stage object
    pub struct StageHandle;

    /// Program object (linked or not)
    pub struct ProgramHandle;

    /// Texture (attachment) object
    pub struct TextureHandle;

    /// Framebuffer object (a set of attachment textures)
    pub struct FramebufferHandle;

    /// Vertex or index buffer object
    pub struct BufferHandle;

    /// Vertex array object (vertex buffers + index buffer + layouts)
    pub struct VertexArrayHandle;
}

// ===== BACKEND SELECTION =====

/// Graphics backend, selected at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum Backend {
    /// Software context with no GPU (tests, tools, cache warm-up)
    #[default]
    Headless,
}

/// Shared handle on a graphics context
pub type SharedContext = Arc<Mutex<dyn GraphicsContext>>;

/// Build the context selected by `config.backend`
pub fn create_context(config: &EngineConfig) -> SharedContext {
    match config.backend {
        Backend::Headless => {
            crate::engine_info!("lumen::GraphicsContext", "Creating headless graphics context");
            Arc::new(Mutex::new(HeadlessContext::new()))
        }
    }
}

/// Lock a shared context, turning lock poisoning into an engine error
pub fn lock_context(context: &SharedContext) -> Result<MutexGuard<'_, dyn GraphicsContext + 'static>> {
    context
        .lock()
        .map_err(|_| engine_err!("lumen::GraphicsContext", "Graphics context lock poisoned"))
}

// ===== VALUE TYPES =====

/// Resolved uniform location inside one program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// Value written by a uniform upload
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec4(Vec4),
    Int(i32),
    Float(f32),
    IntArray(Vec<i32>),
}

bitflags! {
    /// Buffers affected by `GraphicsContext::clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Filter used by framebuffer blits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitFilter {
    Nearest,
    Linear,
}

/// Kind of a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Update frequency hint of a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once at creation
    Static,
    /// Rewritten with `update_buffer`
    Dynamic,
}

/// Context statistics since the last `reset_stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Number of indexed draw calls
    pub draw_calls: u32,
    /// Number of indices submitted by those draws
    pub indices_drawn: u64,
    /// Number of attachment blits
    pub blits: u32,
    /// Number of clear operations (full clears and attachment clears)
    pub clears: u32,
    /// Number of uniform writes that reached a program
    pub uniform_writes: u32,
    /// Number of presented frames
    pub presents: u32,
}

/// Number of live objects of each kind (leak counters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub stages: usize,
    pub programs: usize,
    pub textures: usize,
    pub framebuffers: usize,
    pub buffers: usize,
    pub vertex_arrays: usize,
}

impl ResourceCounts {
    /// Total number of live objects
    pub fn total(&self) -> usize {
        self.stages + self.programs + self.textures + self.framebuffers + self.buffers + self.vertex_arrays
    }
}

// ============================================================================
// GraphicsContext trait
// ============================================================================

/// Graphics context trait
///
/// Implemented once per backend. Every operation on an unknown handle fails
/// with an error rather than being silently ignored; compile and link
/// failures are NOT errors at this level, they are reported through the
/// status/info-log queries so the caller can release its objects first.
pub trait GraphicsContext: Send + Sync {
    /// Backend implemented by this context
    fn backend(&self) -> Backend;

    // ===== STAGE OBJECTS =====

    /// Create an empty stage object
    fn create_stage(&mut self, stage: ShaderStage) -> Result<StageHandle>;

    /// Compile raw source text into a stage object
    fn compile_stage_source(&mut self, stage: StageHandle, source: &str) -> Result<()>;

    /// Load a binary into a stage object and specialize `entry_point`
    fn load_stage_binary(&mut self, stage: StageHandle, binary: &[u32], entry_point: &str) -> Result<()>;

    /// Whether the last compile/load of the stage succeeded
    fn stage_compiled(&self, stage: StageHandle) -> Result<bool>;

    /// Diagnostic log of the last compile/load
    fn stage_info_log(&self, stage: StageHandle) -> Result<String>;

    /// Destroy a stage object (detaching it from any program)
    fn delete_stage(&mut self, stage: StageHandle) -> Result<()>;

    // ===== PROGRAMS =====

    /// Create an empty program object
    fn create_program(&mut self) -> Result<ProgramHandle>;

    /// Attach a stage object to a program
    fn attach_stage(&mut self, program: ProgramHandle, stage: StageHandle) -> Result<()>;

    /// Detach a stage object from a program (the linked code is kept)
    fn detach_stage(&mut self, program: ProgramHandle, stage: StageHandle) -> Result<()>;

    /// Link the attached stages
    fn link_program(&mut self, program: ProgramHandle) -> Result<()>;

    /// Whether the last link succeeded
    fn program_linked(&self, program: ProgramHandle) -> Result<bool>;

    /// Diagnostic log of the last link
    fn program_info_log(&self, program: ProgramHandle) -> Result<String>;

    /// Destroy a program (unbinding it if current)
    fn delete_program(&mut self, program: ProgramHandle) -> Result<()>;

    /// Make a program current (`None` = no program)
    fn use_program(&mut self, program: Option<ProgramHandle>) -> Result<()>;

    /// Currently bound program
    fn current_program(&self) -> Option<ProgramHandle>;

    // ===== UNIFORMS =====

    /// Resolve a uniform name, `None` when the program has no such uniform
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Result<Option<UniformLocation>>;

    /// Write a uniform of a linked program
    fn set_uniform(&mut self, program: ProgramHandle, location: UniformLocation, value: UniformValue) -> Result<()>;

    // ===== TEXTURES =====

    /// Create an attachment texture
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle>;

    /// Destroy a texture
    fn delete_texture(&mut self, texture: TextureHandle) -> Result<()>;

    /// Properties of a live texture
    fn texture_desc(&self, texture: TextureHandle) -> Result<TextureDesc>;

    // ===== FRAMEBUFFERS =====

    /// Create a framebuffer over existing textures (all of the same size and sample count)
    fn create_framebuffer(&mut self, color: &[TextureHandle], depth: Option<TextureHandle>) -> Result<FramebufferHandle>;

    /// Destroy a framebuffer (its textures are not destroyed)
    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) -> Result<()>;

    /// Bind a framebuffer as render target (`None` = default surface)
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> Result<()>;

    /// Currently bound framebuffer
    fn bound_framebuffer(&self) -> Option<FramebufferHandle>;

    // ===== CLEARING =====

    /// Color used by the next `clear(ClearFlags::COLOR)`
    fn set_clear_color(&mut self, color: Vec4);

    /// Clear the bound target
    fn clear(&mut self, flags: ClearFlags) -> Result<()>;

    /// Fill one integer color attachment with `value`
    fn clear_color_attachment_int(&mut self, framebuffer: FramebufferHandle, attachment: usize, value: i32) -> Result<()>;

    // ===== BLIT & READ-BACK =====

    /// Copy one color attachment of `source` into the same attachment of `destination`
    fn blit_color_attachment(
        &mut self,
        source: FramebufferHandle,
        destination: FramebufferHandle,
        attachment: usize,
        filter: BlitFilter,
    ) -> Result<()>;

    /// Read one texel of an integer color attachment
    fn read_pixel_int(&self, framebuffer: FramebufferHandle, attachment: usize, x: u32, y: u32) -> Result<i32>;

    /// Read one texel of a normalized color attachment
    fn read_pixel_rgba(&self, framebuffer: FramebufferHandle, attachment: usize, x: u32, y: u32) -> Result<[u8; 4]>;

    // ===== BUFFERS =====

    /// Create a buffer initialized with `data`
    fn create_buffer(&mut self, kind: BufferKind, usage: BufferUsage, data: &[u8]) -> Result<BufferHandle>;

    /// Overwrite part of a buffer
    fn update_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()>;

    /// Destroy a buffer
    fn delete_buffer(&mut self, buffer: BufferHandle) -> Result<()>;

    // ===== VERTEX ARRAYS =====

    /// Create an empty vertex array
    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle>;

    /// Add a vertex buffer with its layout
    fn add_vertex_buffer(&mut self, vertex_array: VertexArrayHandle, buffer: BufferHandle, layout: &BufferLayout) -> Result<()>;

    /// Set the index buffer and its element count
    fn set_index_buffer(&mut self, vertex_array: VertexArrayHandle, buffer: BufferHandle, count: u32) -> Result<()>;

    /// Destroy a vertex array (its buffers are not destroyed)
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) -> Result<()>;

    /// Bind a vertex array (`None` = no vertex array)
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) -> Result<()>;

    // ===== DRAW & PRESENT =====

    /// Indexed draw with the current program and vertex array
    fn draw_indexed(&mut self, index_count: u32) -> Result<()>;

    /// Present the default surface
    fn present(&mut self) -> Result<()>;

    // ===== DIAGNOSTICS =====

    /// Statistics since the last reset
    fn stats(&self) -> ContextStats;

    /// Reset statistics
    fn reset_stats(&mut self);

    /// Live object counts
    fn live_resources(&self) -> ResourceCounts;
}
