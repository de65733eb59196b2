/// Texture formats and texture descriptors

/// Largest width or height a context accepts for a texture
pub const MAX_TEXTURE_SIZE: u32 = 16384;

/// Attachment texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    /// Normalized color, sampled by the editor viewport
    R8G8B8A8_UNORM,
    /// Signed integer, used for the picking (instance id) attachment
    R32_SINT,
    /// Depth/stencil
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// Returns true for integer formats (must never be blitted with a linear filter)
    pub fn is_integer(&self) -> bool {
        matches!(self, TextureFormat::R32_SINT)
    }

    /// Returns true for depth/stencil formats
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT)
    }
}

/// Descriptor for creating a texture
///
/// Also returned by `GraphicsContext::texture_desc` to query a live texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Sample count (1 = single-sampled)
    pub samples: u32,
}

impl TextureDesc {
    /// Single-sampled texture
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self { width, height, format, samples: 1 }
    }

    /// Returns true if this texture is multisampled (samples > 1)
    pub fn is_multisampled(&self) -> bool {
        self.samples > 1
    }

    /// `width * height`, `None` on overflow
    pub fn texel_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    /// Row-major index of an in-bounds texel
    pub fn texel_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
