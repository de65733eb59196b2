/// Headless graphics context (software backend, no GPU required)
///
/// Keeps every object in a slot map and models the behaviour the engine relies
/// on: compile/link status and info logs, uniform lookup, per-texel attachment
/// storage for clears, blits and integer read-back, and draw statistics.
/// Nothing is rasterized.

use glam::Vec4;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::{engine_bail, engine_trace};
use crate::graphics::{
    Backend, BlitFilter, BufferHandle, BufferKind, BufferLayout, BufferUsage, ClearFlags,
    ContextStats, FramebufferHandle, GraphicsContext, ProgramHandle, ResourceCounts,
    StageHandle, TextureDesc, TextureHandle, MAX_TEXTURE_SIZE, UniformLocation, UniformValue, VertexArrayHandle,
};
use crate::shader::{Reflector, ShaderStage};

// ===== OBJECTS =====

struct StageObject {
    kind: ShaderStage,
    compiled: bool,
    info_log: String,
    uniforms: Vec<String>,
}

struct ProgramObject {
    attached: Vec<StageHandle>,
    linked: bool,
    info_log: String,
    /// Active uniforms, indexed by location
    uniforms: Vec<String>,
    values: FxHashMap<i32, UniformValue>,
}

struct TextureObject {
    desc: TextureDesc,
    /// One u32 per texel: packed RGBA8, i32 bits or f32 depth bits
    texels: Vec<u32>,
}

struct FramebufferObject {
    color: Vec<TextureHandle>,
    depth: Option<TextureHandle>,
}

struct BufferObject {
    kind: BufferKind,
    data: Vec<u8>,
}

#[derive(Default)]
struct VertexArrayObject {
    vertex_buffers: Vec<(BufferHandle, BufferLayout)>,
    index_buffer: Option<(BufferHandle, u32)>,
}

// ===== HELPERS =====

fn pack_rgba(color: Vec4) -> u32 {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    u32::from_le_bytes([c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, c.w.round() as u8])
}

/// Names declared by plain `uniform <type> <name>;` lines (blocks are skipped)
fn scan_uniforms(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line
                .strip_prefix("uniform ")
                .or_else(|| line.split_once(" uniform ").map(|(_, rest)| rest))?;
            let declaration = rest.split(';').next()?;
            if declaration.contains('{') {
                return None;
            }
            let name = declaration.split_whitespace().last()?;
            name.split('[').next().map(str::to_string)
        })
        .collect()
}

fn unknown(kind: &str, handle: impl std::fmt::Debug) -> Error {
    Error::InvalidResource(format!("Unknown {} {:?}", kind, handle))
}

// ============================================================================
// HeadlessContext
// ============================================================================

/// Software graphics context
pub struct HeadlessContext {
    stages: SlotMap<StageHandle, StageObject>,
    programs: SlotMap<ProgramHandle, ProgramObject>,
    textures: SlotMap<TextureHandle, TextureObject>,
    framebuffers: SlotMap<FramebufferHandle, FramebufferObject>,
    buffers: SlotMap<BufferHandle, BufferObject>,
    vertex_arrays: SlotMap<VertexArrayHandle, VertexArrayObject>,
    current_program: Option<ProgramHandle>,
    bound_framebuffer: Option<FramebufferHandle>,
    bound_vertex_array: Option<VertexArrayHandle>,
    clear_color: Vec4,
    stats: ContextStats,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self {
            stages: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            vertex_arrays: SlotMap::with_key(),
            current_program: None,
            bound_framebuffer: None,
            bound_vertex_array: None,
            clear_color: Vec4::ZERO,
            stats: ContextStats::default(),
        }
    }

    /// Last value written to a uniform of a program (inspection helper)
    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<&UniformValue> {
        let object = self.programs.get(program)?;
        let location = object.uniforms.iter().position(|uniform| uniform == name)?;
        object.values.get(&(location as i32))
    }

    /// Stages currently attached to a program (inspection helper)
    pub fn attached_stages(&self, program: ProgramHandle) -> Vec<StageHandle> {
        self.programs
            .get(program)
            .map(|object| object.attached.clone())
            .unwrap_or_default()
    }

    /// Layouts of the vertex buffers attached to a vertex array (inspection helper)
    pub fn vertex_buffer_layouts(&self, vertex_array: VertexArrayHandle) -> Vec<BufferLayout> {
        self.vertex_arrays
            .get(vertex_array)
            .map(|object| object.vertex_buffers.iter().map(|(_, layout)| layout.clone()).collect())
            .unwrap_or_default()
    }

    /// Current clear color (inspection helper)
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    fn stage(&self, handle: StageHandle) -> Result<&StageObject> {
        self.stages.get(handle).ok_or_else(|| unknown("stage", handle))
    }

    fn stage_mut(&mut self, handle: StageHandle) -> Result<&mut StageObject> {
        self.stages.get_mut(handle).ok_or_else(|| unknown("stage", handle))
    }

    fn program(&self, handle: ProgramHandle) -> Result<&ProgramObject> {
        self.programs.get(handle).ok_or_else(|| unknown("program", handle))
    }

    fn program_mut(&mut self, handle: ProgramHandle) -> Result<&mut ProgramObject> {
        self.programs.get_mut(handle).ok_or_else(|| unknown("program", handle))
    }

    fn texture(&self, handle: TextureHandle) -> Result<&TextureObject> {
        self.textures.get(handle).ok_or_else(|| unknown("texture", handle))
    }

    fn framebuffer(&self, handle: FramebufferHandle) -> Result<&FramebufferObject> {
        self.framebuffers.get(handle).ok_or_else(|| unknown("framebuffer", handle))
    }

    fn color_texture(&self, framebuffer: FramebufferHandle, attachment: usize) -> Result<TextureHandle> {
        self.framebuffer(framebuffer)?
            .color
            .get(attachment)
            .copied()
            .ok_or_else(|| Error::InvalidResource(format!("Framebuffer has no color attachment {}", attachment)))
    }

    fn readable_texel(&self, framebuffer: FramebufferHandle, attachment: usize, x: u32, y: u32) -> Result<(TextureDesc, u32)> {
        let texture = self.texture(self.color_texture(framebuffer, attachment)?)?;
        let desc = texture.desc;
        if desc.is_multisampled() {
            engine_bail!("lumen::HeadlessContext", "Cannot read back a multisampled attachment, resolve it first");
        }
        if x >= desc.width || y >= desc.height {
            engine_bail!("lumen::HeadlessContext", "Read-back ({}, {}) outside {}x{}", x, y, desc.width, desc.height);
        }
        Ok((desc, texture.texels[desc.texel_index(x, y)]))
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for HeadlessContext {
    fn backend(&self) -> Backend {
        Backend::Headless
    }

    // ===== STAGE OBJECTS =====

    fn create_stage(&mut self, stage: ShaderStage) -> Result<StageHandle> {
        Ok(self.stages.insert(StageObject {
            kind: stage,
            compiled: false,
            info_log: String::new(),
            uniforms: Vec::new(),
        }))
    }

    fn compile_stage_source(&mut self, stage: StageHandle, source: &str) -> Result<()> {
        let object = self.stage_mut(stage)?;
        object.info_log.clear();
        if source.trim().is_empty() {
            object.info_log = format!("0:0: error: {} shader source is empty", object.kind);
        } else if !source.contains("main") {
            object.info_log = "0:0: error: no function with name 'main'".to_string();
        }
        object.compiled = object.info_log.is_empty();
        object.uniforms = if object.compiled { scan_uniforms(source) } else { Vec::new() };
        Ok(())
    }

    fn load_stage_binary(&mut self, stage: StageHandle, binary: &[u32], entry_point: &str) -> Result<()> {
        let kind = self.stage(stage)?.kind;
        let uniforms: Vec<String> = Reflector::reflect(kind, binary)
            .map(|resources| {
                resources
                    .into_iter()
                    .flat_map(|resource| std::iter::once(resource.name).chain(resource.members))
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let object = self.stage_mut(stage)?;
        object.info_log.clear();
        if binary.is_empty() {
            object.info_log = format!("error: {} binary is empty", object.kind);
        } else if entry_point.is_empty() {
            object.info_log = "error: no entry point given for specialization".to_string();
        }
        object.compiled = object.info_log.is_empty();
        object.uniforms = if object.compiled { uniforms } else { Vec::new() };
        Ok(())
    }

    fn stage_compiled(&self, stage: StageHandle) -> Result<bool> {
        Ok(self.stage(stage)?.compiled)
    }

    fn stage_info_log(&self, stage: StageHandle) -> Result<String> {
        Ok(self.stage(stage)?.info_log.clone())
    }

    fn delete_stage(&mut self, stage: StageHandle) -> Result<()> {
        self.stages.remove(stage).ok_or_else(|| unknown("stage", stage))?;
        for (_, program) in self.programs.iter_mut() {
            program.attached.retain(|attached| *attached != stage);
        }
        Ok(())
    }

    // ===== PROGRAMS =====

    fn create_program(&mut self) -> Result<ProgramHandle> {
        Ok(self.programs.insert(ProgramObject {
            attached: Vec::new(),
            linked: false,
            info_log: String::new(),
            uniforms: Vec::new(),
            values: FxHashMap::default(),
        }))
    }

    fn attach_stage(&mut self, program: ProgramHandle, stage: StageHandle) -> Result<()> {
        self.stage(stage)?;
        let object = self.program_mut(program)?;
        if object.attached.contains(&stage) {
            engine_bail!("lumen::HeadlessContext", "Stage {:?} is already attached", stage);
        }
        object.attached.push(stage);
        Ok(())
    }

    fn detach_stage(&mut self, program: ProgramHandle, stage: StageHandle) -> Result<()> {
        let object = self.program_mut(program)?;
        let Some(index) = object.attached.iter().position(|attached| *attached == stage) else {
            engine_bail!("lumen::HeadlessContext", "Stage {:?} is not attached", stage);
        };
        object.attached.remove(index);
        Ok(())
    }

    fn link_program(&mut self, program: ProgramHandle) -> Result<()> {
        let attached = self.program(program)?.attached.clone();

        let mut log = Vec::new();
        let mut kinds = Vec::with_capacity(attached.len());
        let mut uniforms: Vec<String> = Vec::new();
        for handle in &attached {
            let stage = self.stage(*handle)?;
            if !stage.compiled {
                log.push(format!("error: linking with uncompiled {} shader", stage.kind));
            }
            if kinds.contains(&stage.kind) {
                log.push(format!("error: multiple {} shaders attached", stage.kind));
            }
            kinds.push(stage.kind);
            for name in &stage.uniforms {
                if !uniforms.contains(name) {
                    uniforms.push(name.clone());
                }
            }
        }

        if kinds.is_empty() {
            log.push("error: no shaders attached to program".to_string());
        } else if kinds.contains(&ShaderStage::Compute) {
            if kinds.len() > 1 {
                log.push("error: compute shader cannot be linked with other stages".to_string());
            }
        } else {
            if !kinds.contains(&ShaderStage::Vertex) {
                log.push("error: program lacks a vertex shader".to_string());
            }
            if !kinds.contains(&ShaderStage::Fragment) {
                log.push("error: program lacks a fragment shader".to_string());
            }
        }

        let object = self.program_mut(program)?;
        object.linked = log.is_empty();
        object.info_log = log.join("\n");
        object.uniforms = if object.linked { uniforms } else { Vec::new() };
        object.values.clear();
        engine_trace!("lumen::HeadlessContext", "Linked {:?}: {}", program, object.linked);
        Ok(())
    }

    fn program_linked(&self, program: ProgramHandle) -> Result<bool> {
        Ok(self.program(program)?.linked)
    }

    fn program_info_log(&self, program: ProgramHandle) -> Result<String> {
        Ok(self.program(program)?.info_log.clone())
    }

    fn delete_program(&mut self, program: ProgramHandle) -> Result<()> {
        self.programs.remove(program).ok_or_else(|| unknown("program", program))?;
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        Ok(())
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) -> Result<()> {
        if let Some(handle) = program {
            if !self.program(handle)?.linked {
                engine_bail!("lumen::HeadlessContext", "Cannot use unlinked program {:?}", handle);
            }
        }
        self.current_program = program;
        Ok(())
    }

    fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    // ===== UNIFORMS =====

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Result<Option<UniformLocation>> {
        let object = self.program(program)?;
        Ok(object
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| UniformLocation(index as i32)))
    }

    fn set_uniform(&mut self, program: ProgramHandle, location: UniformLocation, value: UniformValue) -> Result<()> {
        let object = self.program_mut(program)?;
        if !object.linked {
            engine_bail!("lumen::HeadlessContext", "Uniform write to unlinked program {:?}", program);
        }
        if location.0 < 0 || location.0 as usize >= object.uniforms.len() {
            engine_bail!("lumen::HeadlessContext", "Invalid uniform location {}", location.0);
        }
        object.values.insert(location.0, value);
        self.stats.uniform_writes += 1;
        Ok(())
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        if desc.width == 0 || desc.height == 0 || desc.samples == 0 {
            engine_bail!(
                "lumen::HeadlessContext",
                "Invalid texture {}x{} with {} samples",
                desc.width, desc.height, desc.samples
            );
        }
        let texel_count = match desc.texel_count() {
            Some(count) if desc.width <= MAX_TEXTURE_SIZE && desc.height <= MAX_TEXTURE_SIZE => count,
            _ => engine_bail!(
                "lumen::HeadlessContext",
                "Texture {}x{} exceeds the {} limit",
                desc.width, desc.height, MAX_TEXTURE_SIZE
            ),
        };
        let fill = if desc.format.is_depth() { 1.0f32.to_bits() } else { 0 };
        Ok(self.textures.insert(TextureObject {
            desc: *desc,
            texels: vec![fill; texel_count],
        }))
    }

    fn delete_texture(&mut self, texture: TextureHandle) -> Result<()> {
        self.textures.remove(texture).map(|_| ()).ok_or_else(|| unknown("texture", texture))
    }

    fn texture_desc(&self, texture: TextureHandle) -> Result<TextureDesc> {
        Ok(self.texture(texture)?.desc)
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self, color: &[TextureHandle], depth: Option<TextureHandle>) -> Result<FramebufferHandle> {
        let mut descs = Vec::with_capacity(color.len() + 1);
        for handle in color {
            let desc = self.texture(*handle)?.desc;
            if desc.format.is_depth() {
                engine_bail!("lumen::HeadlessContext", "Depth texture used as color attachment");
            }
            descs.push(desc);
        }
        if let Some(handle) = depth {
            let desc = self.texture(handle)?.desc;
            if !desc.format.is_depth() {
                engine_bail!("lumen::HeadlessContext", "Color texture used as depth attachment");
            }
            descs.push(desc);
        }
        let Some(first) = descs.first().copied() else {
            engine_bail!("lumen::HeadlessContext", "Framebuffer needs at least one attachment");
        };
        if descs.iter().any(|desc| {
            desc.width != first.width || desc.height != first.height || desc.samples != first.samples
        }) {
            engine_bail!("lumen::HeadlessContext", "Framebuffer attachments differ in size or sample count");
        }
        Ok(self.framebuffers.insert(FramebufferObject { color: color.to_vec(), depth }))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) -> Result<()> {
        self.framebuffers.remove(framebuffer).ok_or_else(|| unknown("framebuffer", framebuffer))?;
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
        Ok(())
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> Result<()> {
        if let Some(handle) = framebuffer {
            self.framebuffer(handle)?;
        }
        self.bound_framebuffer = framebuffer;
        Ok(())
    }

    fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.bound_framebuffer
    }

    // ===== CLEARING =====

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    fn clear(&mut self, flags: ClearFlags) -> Result<()> {
        self.stats.clears += 1;
        let Some(handle) = self.bound_framebuffer else {
            // Default surface is not modelled
            return Ok(());
        };
        let (color, depth) = {
            let framebuffer = self.framebuffer(handle)?;
            (framebuffer.color.clone(), framebuffer.depth)
        };
        if flags.contains(ClearFlags::COLOR) {
            let packed = pack_rgba(self.clear_color);
            for texture in color {
                if let Some(object) = self.textures.get_mut(texture) {
                    // Integer attachments are cleared explicitly
                    if !object.desc.format.is_integer() {
                        object.texels.fill(packed);
                    }
                }
            }
        }
        if flags.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
            if let Some(object) = depth.and_then(|texture| self.textures.get_mut(texture)) {
                object.texels.fill(1.0f32.to_bits());
            }
        }
        Ok(())
    }

    fn clear_color_attachment_int(&mut self, framebuffer: FramebufferHandle, attachment: usize, value: i32) -> Result<()> {
        let texture = self.color_texture(framebuffer, attachment)?;
        let object = self.textures.get_mut(texture).ok_or_else(|| unknown("texture", texture))?;
        if !object.desc.format.is_integer() {
            engine_bail!("lumen::HeadlessContext", "Attachment {} is not an integer attachment", attachment);
        }
        object.texels.fill(value as u32);
        self.stats.clears += 1;
        Ok(())
    }

    // ===== BLIT & READ-BACK =====

    fn blit_color_attachment(
        &mut self,
        source: FramebufferHandle,
        destination: FramebufferHandle,
        attachment: usize,
        filter: BlitFilter,
    ) -> Result<()> {
        let src = self.color_texture(source, attachment)?;
        let dst = self.color_texture(destination, attachment)?;
        let src_desc = self.texture(src)?.desc;
        let dst_desc = self.texture(dst)?.desc;

        if src_desc.format != dst_desc.format {
            engine_bail!("lumen::HeadlessContext", "Blit between different formats ({:?} -> {:?})", src_desc.format, dst_desc.format);
        }
        if src_desc.format.is_integer() && filter == BlitFilter::Linear {
            engine_bail!("lumen::HeadlessContext", "Linear filter is invalid for integer attachment {}", attachment);
        }
        if dst_desc.is_multisampled() {
            engine_bail!("lumen::HeadlessContext", "Blit destination must be single-sampled");
        }
        if src_desc.width != dst_desc.width || src_desc.height != dst_desc.height {
            engine_bail!(
                "lumen::HeadlessContext",
                "Blit size mismatch {}x{} -> {}x{}",
                src_desc.width, src_desc.height, dst_desc.width, dst_desc.height
            );
        }

        let texels = self.texture(src)?.texels.clone();
        if let Some(object) = self.textures.get_mut(dst) {
            object.texels = texels;
        }
        self.stats.blits += 1;
        Ok(())
    }

    fn read_pixel_int(&self, framebuffer: FramebufferHandle, attachment: usize, x: u32, y: u32) -> Result<i32> {
        let (desc, texel) = self.readable_texel(framebuffer, attachment, x, y)?;
        if !desc.format.is_integer() {
            engine_bail!("lumen::HeadlessContext", "Attachment {} is not an integer attachment", attachment);
        }
        Ok(texel as i32)
    }

    fn read_pixel_rgba(&self, framebuffer: FramebufferHandle, attachment: usize, x: u32, y: u32) -> Result<[u8; 4]> {
        let (desc, texel) = self.readable_texel(framebuffer, attachment, x, y)?;
        if desc.format.is_integer() {
            engine_bail!("lumen::HeadlessContext", "Attachment {} is an integer attachment", attachment);
        }
        Ok(texel.to_le_bytes())
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, kind: BufferKind, _usage: BufferUsage, data: &[u8]) -> Result<BufferHandle> {
        Ok(self.buffers.insert(BufferObject { kind, data: data.to_vec() }))
    }

    fn update_buffer(&mut self, buffer: BufferHandle, offset: usize, data: &[u8]) -> Result<()> {
        let object = self.buffers.get_mut(buffer).ok_or_else(|| unknown("buffer", buffer))?;
        let end = offset + data.len();
        if end > object.data.len() {
            engine_bail!("lumen::HeadlessContext", "Buffer update {}..{} exceeds size {}", offset, end, object.data.len());
        }
        object.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> Result<()> {
        self.buffers.remove(buffer).map(|_| ()).ok_or_else(|| unknown("buffer", buffer))
    }

    // ===== VERTEX ARRAYS =====

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle> {
        Ok(self.vertex_arrays.insert(VertexArrayObject::default()))
    }

    fn add_vertex_buffer(&mut self, vertex_array: VertexArrayHandle, buffer: BufferHandle, layout: &BufferLayout) -> Result<()> {
        let kind = self.buffers.get(buffer).ok_or_else(|| unknown("buffer", buffer))?.kind;
        if kind != BufferKind::Vertex {
            engine_bail!("lumen::HeadlessContext", "Buffer {:?} is not a vertex buffer", buffer);
        }
        let object = self.vertex_arrays.get_mut(vertex_array).ok_or_else(|| unknown("vertex array", vertex_array))?;
        object.vertex_buffers.push((buffer, layout.clone()));
        Ok(())
    }

    fn set_index_buffer(&mut self, vertex_array: VertexArrayHandle, buffer: BufferHandle, count: u32) -> Result<()> {
        let object = self.buffers.get(buffer).ok_or_else(|| unknown("buffer", buffer))?;
        if object.kind != BufferKind::Index {
            engine_bail!("lumen::HeadlessContext", "Buffer {:?} is not an index buffer", buffer);
        }
        if count as usize * std::mem::size_of::<u32>() > object.data.len() {
            engine_bail!("lumen::HeadlessContext", "Index count {} exceeds buffer size {}", count, object.data.len());
        }
        let vao = self.vertex_arrays.get_mut(vertex_array).ok_or_else(|| unknown("vertex array", vertex_array))?;
        vao.index_buffer = Some((buffer, count));
        Ok(())
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) -> Result<()> {
        self.vertex_arrays.remove(vertex_array).ok_or_else(|| unknown("vertex array", vertex_array))?;
        if self.bound_vertex_array == Some(vertex_array) {
            self.bound_vertex_array = None;
        }
        Ok(())
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) -> Result<()> {
        if let Some(handle) = vertex_array {
            if !self.vertex_arrays.contains_key(handle) {
                return Err(unknown("vertex array", handle));
            }
        }
        self.bound_vertex_array = vertex_array;
        Ok(())
    }

    // ===== DRAW & PRESENT =====

    fn draw_indexed(&mut self, index_count: u32) -> Result<()> {
        if self.current_program.is_none() {
            engine_bail!("lumen::HeadlessContext", "draw_indexed without a bound program");
        }
        let Some(vertex_array) = self.bound_vertex_array.and_then(|handle| self.vertex_arrays.get(handle)) else {
            engine_bail!("lumen::HeadlessContext", "draw_indexed without a bound vertex array");
        };
        let Some((_, available)) = vertex_array.index_buffer else {
            engine_bail!("lumen::HeadlessContext", "draw_indexed on a vertex array without index buffer");
        };
        if index_count > available {
            engine_bail!("lumen::HeadlessContext", "draw_indexed of {} indices, only {} available", index_count, available);
        }
        self.stats.draw_calls += 1;
        self.stats.indices_drawn += index_count as u64;
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.stats.presents += 1;
        Ok(())
    }

    // ===== DIAGNOSTICS =====

    fn stats(&self) -> ContextStats {
        self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = ContextStats::default();
    }

    fn live_resources(&self) -> ResourceCounts {
        ResourceCounts {
            stages: self.stages.len(),
            programs: self.programs.len(),
            textures: self.textures.len(),
            framebuffers: self.framebuffers.len(),
            buffers: self.buffers.len(),
            vertex_arrays: self.vertex_arrays.len(),
        }
    }
}

#[cfg(test)]
#[path = "headless_context_tests.rs"]
mod tests;
