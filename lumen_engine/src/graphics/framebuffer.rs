/// Framebuffer - render target with optional MSAA resolve target
///
/// Attachment 0 is the RGBA8 color attachment; further color attachments are
/// R32 signed integer (instance id for picking). With MSAA enabled, rendering
/// goes to a multisampled framebuffer and `resolve_msaa` copies each color
/// attachment into a single-sampled resolve framebuffer, which is the one
/// exposed for display and read-back.

use crate::error::{Error, Result};
use crate::{engine_bail, engine_debug, engine_warn};
use crate::graphics::{
    lock_context, GraphicsContext, SharedContext, BlitFilter, FramebufferHandle,
    TextureDesc, TextureFormat, TextureHandle,
};

/// Largest accepted framebuffer dimension
pub const MAX_FRAMEBUFFER_SIZE: u32 = 8192;

/// Value returned by `read_pixel` when nothing can be read
pub const PICK_SENTINEL: i32 = -1;

/// Framebuffer specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferSpec {
    pub width: u32,
    pub height: u32,
    /// Number of color attachments (first is RGBA8, the others R32 integer)
    pub color_attachment_count: u32,
    /// Number of depth attachments (0 or 1)
    pub depth_attachment_count: u32,
    pub enable_msaa: bool,
    /// Sample count used when `enable_msaa` is set
    pub samples: u32,
}

impl Default for FramebufferSpec {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            color_attachment_count: 1,
            depth_attachment_count: 1,
            enable_msaa: false,
            samples: 4,
        }
    }
}

impl FramebufferSpec {
    /// Format of a color attachment
    pub fn color_format(index: usize) -> TextureFormat {
        if index == 0 {
            TextureFormat::R8G8B8A8_UNORM
        } else {
            TextureFormat::R32_SINT
        }
    }
}

/// Framebuffer object plus the textures it owns
struct Attachments {
    framebuffer: FramebufferHandle,
    color: Vec<TextureHandle>,
    depth: Option<TextureHandle>,
}

impl Attachments {
    /// Create the textures and the framebuffer object
    ///
    /// On failure every texture created so far is deleted again.
    fn create(
        context: &mut dyn GraphicsContext,
        spec: &FramebufferSpec,
        samples: u32,
        with_depth: bool,
    ) -> Result<Self> {
        let mut created = Vec::new();
        let result = Self::create_tracked(context, spec, samples, with_depth, &mut created);
        if result.is_err() {
            for texture in created {
                let _ = context.delete_texture(texture);
            }
        }
        result
    }

    fn create_tracked(
        context: &mut dyn GraphicsContext,
        spec: &FramebufferSpec,
        samples: u32,
        with_depth: bool,
        created: &mut Vec<TextureHandle>,
    ) -> Result<Self> {
        let color_count = spec.color_attachment_count as usize;
        for index in 0..color_count {
            let desc = TextureDesc {
                width: spec.width,
                height: spec.height,
                format: FramebufferSpec::color_format(index),
                samples,
            };
            created.push(context.create_texture(&desc)?);
        }
        let depth = if with_depth {
            let texture = context.create_texture(&TextureDesc {
                width: spec.width,
                height: spec.height,
                format: TextureFormat::D24_UNORM_S8_UINT,
                samples,
            })?;
            created.push(texture);
            Some(texture)
        } else {
            None
        };
        let color = created[..color_count].to_vec();
        let framebuffer = context.create_framebuffer(&color, depth)?;
        Ok(Self { framebuffer, color, depth })
    }

    /// Delete everything, reporting the first failure
    fn release(&self, context: &mut dyn GraphicsContext) -> Result<()> {
        let mut outcome = context.delete_framebuffer(self.framebuffer);
        for texture in self.color.iter().copied().chain(self.depth) {
            let deleted = context.delete_texture(texture);
            if outcome.is_ok() {
                outcome = deleted;
            }
        }
        outcome
    }
}

/// Render target owned by the engine
pub struct Framebuffer {
    context: SharedContext,
    spec: FramebufferSpec,
    target: Attachments,
    resolve: Option<Attachments>,
    destroyed: bool,
}

impl Framebuffer {
    /// Create the framebuffer and all its attachments
    pub fn new(context: SharedContext, spec: FramebufferSpec) -> Result<Self> {
        if spec.depth_attachment_count > 1 {
            engine_bail!("lumen::Framebuffer", "At most one depth attachment is supported, got {}", spec.depth_attachment_count);
        }
        if !Self::valid_size(spec.width, spec.height) {
            engine_bail!("lumen::Framebuffer", "Invalid framebuffer size {}x{}", spec.width, spec.height);
        }
        let (target, resolve) = {
            let mut ctx = lock_context(&context)?;
            Self::create_attachments(&mut *ctx, &spec)?
        };
        Ok(Self { context, spec, target, resolve, destroyed: false })
    }

    fn create_attachments(
        context: &mut dyn GraphicsContext,
        spec: &FramebufferSpec,
    ) -> Result<(Attachments, Option<Attachments>)> {
        if spec.enable_msaa && spec.samples > 1 {
            let target = Attachments::create(context, spec, spec.samples, spec.depth_attachment_count > 0)?;
            match Attachments::create(context, spec, 1, false) {
                Ok(resolve) => Ok((target, Some(resolve))),
                Err(e) => {
                    let _ = target.release(context);
                    Err(e)
                }
            }
        } else {
            Ok((Attachments::create(context, spec, 1, spec.depth_attachment_count > 0)?, None))
        }
    }

    fn valid_size(width: u32, height: u32) -> bool {
        width > 0 && height > 0 && width <= MAX_FRAMEBUFFER_SIZE && height <= MAX_FRAMEBUFFER_SIZE
    }

    pub fn spec(&self) -> &FramebufferSpec {
        &self.spec
    }

    pub fn width(&self) -> u32 {
        self.spec.width
    }

    pub fn height(&self) -> u32 {
        self.spec.height
    }

    /// Framebuffer that draws go to (multisampled when MSAA is on)
    pub fn target_handle(&self) -> FramebufferHandle {
        self.target.framebuffer
    }

    /// Single-sampled framebuffer exposed for display and read-back
    pub fn display_handle(&self) -> FramebufferHandle {
        self.resolve.as_ref().map_or(self.target.framebuffer, |resolve| resolve.framebuffer)
    }

    pub fn is_multisampled(&self) -> bool {
        self.resolve.is_some()
    }

    /// Bind as current render target
    pub fn bind(&self) -> Result<()> {
        lock_context(&self.context)?.bind_framebuffer(Some(self.target.framebuffer))
    }

    /// Bind the default surface
    pub fn unbind(&self) -> Result<()> {
        lock_context(&self.context)?.bind_framebuffer(None)
    }

    /// Recreate every attachment at the new size
    ///
    /// A zero or oversized request is ignored with a warning, as is a request
    /// for the current size. The new attachments are created before the old
    /// ones are released, so a failed resize leaves the framebuffer unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if !Self::valid_size(width, height) {
            engine_warn!("lumen::Framebuffer", "Attempted to resize framebuffer to {}x{}", width, height);
            return Ok(());
        }
        if width == self.spec.width && height == self.spec.height {
            return Ok(());
        }

        let spec = FramebufferSpec { width, height, ..self.spec };
        let mut ctx = lock_context(&self.context)?;
        let (target, resolve) = Self::create_attachments(&mut *ctx, &spec)?;

        let was_bound = ctx.bound_framebuffer() == Some(self.target.framebuffer);
        let old_target = std::mem::replace(&mut self.target, target);
        let old_resolve = std::mem::replace(&mut self.resolve, resolve);
        self.spec = spec;
        if was_bound {
            ctx.bind_framebuffer(Some(self.target.framebuffer))?;
        }
        old_target.release(&mut *ctx)?;
        if let Some(old_resolve) = old_resolve {
            old_resolve.release(&mut *ctx)?;
        }
        engine_debug!("lumen::Framebuffer", "Resized framebuffer to {}x{}", width, height);
        Ok(())
    }

    /// Displayable texture of a color attachment (the resolved one with MSAA)
    pub fn color_attachment(&self, index: usize) -> Option<TextureHandle> {
        self.resolve
            .as_ref()
            .unwrap_or(&self.target)
            .color
            .get(index)
            .copied()
    }

    pub fn depth_attachment(&self) -> Option<TextureHandle> {
        self.target.depth
    }

    pub fn color_attachment_count(&self) -> usize {
        self.target.color.len()
    }

    /// Read one integer texel, failing outside the framebuffer bounds
    pub fn try_read_pixel(&self, attachment: usize, x: i32, y: i32) -> Result<i32> {
        if x < 0 || y < 0 || x as u32 >= self.spec.width || y as u32 >= self.spec.height {
            return Err(Error::Pick { x, y, width: self.spec.width, height: self.spec.height });
        }
        if attachment >= self.target.color.len() {
            return Err(Error::InvalidResource(format!(
                "Framebuffer has no color attachment {}",
                attachment
            )));
        }
        lock_context(&self.context)?.read_pixel_int(self.display_handle(), attachment, x as u32, y as u32)
    }

    /// Read one integer texel for picking, `PICK_SENTINEL` when nothing can be read
    pub fn read_pixel(&self, attachment: usize, x: i32, y: i32) -> i32 {
        self.try_read_pixel(attachment, x, y).unwrap_or(PICK_SENTINEL)
    }

    /// Fill an integer color attachment (and its resolved copy) with `value`
    pub fn clear_attachment(&self, attachment: usize, value: i32) -> Result<()> {
        let mut ctx = lock_context(&self.context)?;
        ctx.clear_color_attachment_int(self.target.framebuffer, attachment, value)?;
        if let Some(resolve) = &self.resolve {
            ctx.clear_color_attachment_int(resolve.framebuffer, attachment, value)?;
        }
        Ok(())
    }

    /// Blit every color attachment into the resolve target, one at a time
    ///
    /// Integer attachments use a nearest filter, color attachments a linear one.
    /// Returns the number of attachments resolved (0 when MSAA is off).
    pub fn resolve_msaa(&self) -> Result<u32> {
        let Some(resolve) = &self.resolve else {
            return Ok(0);
        };
        let mut ctx = lock_context(&self.context)?;
        for index in 0..self.target.color.len() {
            let filter = if FramebufferSpec::color_format(index).is_integer() {
                BlitFilter::Nearest
            } else {
                BlitFilter::Linear
            };
            ctx.blit_color_attachment(self.target.framebuffer, resolve.framebuffer, index, filter)?;
        }
        Ok(self.target.color.len() as u32)
    }

    /// Release the framebuffer and its attachments
    pub fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        let mut ctx = lock_context(&self.context)?;
        if ctx.bound_framebuffer() == Some(self.target.framebuffer) {
            ctx.bind_framebuffer(None)?;
        }
        self.target.release(&mut *ctx)?;
        if let Some(resolve) = &self.resolve {
            resolve.release(&mut *ctx)?;
        }
        self.destroyed = true;
        Ok(())
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        let _ = self.destroy();
    }
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
