/// Vertex/index buffers, vertex layouts and vertex arrays
///
/// The wrappers own their context handle and release it when dropped.

use crate::error::Result;
use crate::engine_bail;
use crate::graphics::{
    lock_context, SharedContext, BufferHandle, BufferKind, BufferUsage, VertexArrayHandle,
};

// ===== SHADER DATA TYPE =====

/// Type of one vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
}

impl ShaderDataType {
    /// Size in bytes
    pub fn size(&self) -> u32 {
        match self {
            ShaderDataType::Float => 4,
            ShaderDataType::Float2 => 4 * 2,
            ShaderDataType::Float3 => 4 * 3,
            ShaderDataType::Float4 => 4 * 4,
            ShaderDataType::Int => 4,
        }
    }

    /// Number of scalar components
    pub fn component_count(&self) -> u32 {
        match self {
            ShaderDataType::Float | ShaderDataType::Int => 1,
            ShaderDataType::Float2 => 2,
            ShaderDataType::Float3 => 3,
            ShaderDataType::Float4 => 4,
        }
    }

    /// Integer attributes are fed without conversion
    pub fn is_integer(&self) -> bool {
        matches!(self, ShaderDataType::Int)
    }
}

// ===== LAYOUT =====

/// One attribute of a vertex layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferElement {
    pub name: String,
    pub data_type: ShaderDataType,
    /// Byte offset inside the vertex, computed by `BufferLayout::new`
    pub offset: u32,
    pub normalized: bool,
}

impl BufferElement {
    pub fn new(data_type: ShaderDataType, name: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            offset: 0,
            normalized: false,
        }
    }
}

/// Interleaved vertex layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    /// Build a layout, assigning offsets in declaration order
    pub fn new(mut elements: Vec<BufferElement>) -> Self {
        let mut offset = 0;
        for element in &mut elements {
            element.offset = offset;
            offset += element.data_type.size();
        }
        Self { elements, stride: offset }
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    /// Size in bytes of one vertex
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

// ===== VERTEX BUFFER =====

/// Vertex buffer with an optional layout
pub struct VertexBuffer {
    context: SharedContext,
    handle: BufferHandle,
    size: usize,
    layout: BufferLayout,
}

impl VertexBuffer {
    /// Static buffer initialized with `data`
    pub fn new(context: SharedContext, data: &[u8]) -> Result<Self> {
        let handle = lock_context(&context)?.create_buffer(BufferKind::Vertex, BufferUsage::Static, data)?;
        Ok(Self { context, handle, size: data.len(), layout: BufferLayout::default() })
    }

    /// Dynamic zero-filled buffer of `size` bytes, filled later with `set_data`
    pub fn with_capacity(context: SharedContext, size: usize) -> Result<Self> {
        let zeros = vec![0u8; size];
        let handle = lock_context(&context)?.create_buffer(BufferKind::Vertex, BufferUsage::Dynamic, &zeros)?;
        Ok(Self { context, handle, size, layout: BufferLayout::default() })
    }

    /// Overwrite the start of the buffer
    pub fn set_data(&self, data: &[u8]) -> Result<()> {
        if data.len() > self.size {
            engine_bail!("lumen::VertexBuffer", "set_data: {} bytes exceed buffer size {}", data.len(), self.size);
        }
        lock_context(&self.context)?.update_buffer(self.handle, 0, data)
    }

    pub fn set_layout(&mut self, layout: BufferLayout) {
        self.layout = layout;
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        if let Ok(mut context) = self.context.lock() {
            let _ = context.delete_buffer(self.handle);
        }
    }
}

// ===== INDEX BUFFER =====

/// 32-bit index buffer
pub struct IndexBuffer {
    context: SharedContext,
    handle: BufferHandle,
    count: u32,
}

impl IndexBuffer {
    pub fn new(context: SharedContext, indices: &[u32]) -> Result<Self> {
        let handle = lock_context(&context)?.create_buffer(
            BufferKind::Index,
            BufferUsage::Static,
            bytemuck::cast_slice(indices),
        )?;
        Ok(Self { context, handle, count: indices.len() as u32 })
    }

    /// Number of indices
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        if let Ok(mut context) = self.context.lock() {
            let _ = context.delete_buffer(self.handle);
        }
    }
}

// ===== VERTEX ARRAY =====

/// Vertex array owning its vertex buffers and index buffer
pub struct VertexArray {
    context: SharedContext,
    handle: VertexArrayHandle,
    vertex_buffers: Vec<VertexBuffer>,
    index_buffer: Option<IndexBuffer>,
}

impl VertexArray {
    pub fn new(context: SharedContext) -> Result<Self> {
        let handle = lock_context(&context)?.create_vertex_array()?;
        Ok(Self { context, handle, vertex_buffers: Vec::new(), index_buffer: None })
    }

    /// Attach a vertex buffer; its layout must have been set
    pub fn add_vertex_buffer(&mut self, buffer: VertexBuffer) -> Result<()> {
        if buffer.layout().is_empty() {
            engine_bail!("lumen::VertexArray", "Vertex buffer has no layout");
        }
        lock_context(&self.context)?.add_vertex_buffer(self.handle, buffer.handle(), buffer.layout())?;
        self.vertex_buffers.push(buffer);
        Ok(())
    }

    /// Attach the index buffer, replacing any previous one
    pub fn set_index_buffer(&mut self, buffer: IndexBuffer) -> Result<()> {
        lock_context(&self.context)?.set_index_buffer(self.handle, buffer.handle(), buffer.count())?;
        self.index_buffer = Some(buffer);
        Ok(())
    }

    pub fn vertex_buffers(&self) -> &[VertexBuffer] {
        &self.vertex_buffers
    }

    pub fn index_buffer(&self) -> Option<&IndexBuffer> {
        self.index_buffer.as_ref()
    }

    /// Element count of the index buffer (0 without one)
    pub fn index_count(&self) -> u32 {
        self.index_buffer.as_ref().map_or(0, |buffer| buffer.count())
    }

    pub fn handle(&self) -> VertexArrayHandle {
        self.handle
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        if let Ok(mut context) = self.context.lock() {
            let _ = context.delete_vertex_array(self.handle);
        }
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
