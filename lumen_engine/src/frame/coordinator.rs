/// FrameCoordinator - begin / draw / resolve / end state machine
///
/// Idle -> FrameBegun -> Drawing* -> FrameResolved -> Idle. `end_frame`
/// presents and returns straight to Idle. Any call made out of order fails
/// with `Error::InvalidFrameState` and leaves the state untouched.

use glam::Vec4;

use crate::error::{Error, Result};
use crate::{engine_error, engine_trace};
use crate::graphics::{
    lock_context, ClearFlags, Framebuffer, FramebufferHandle, SharedContext, VertexArray,
    PICK_SENTINEL,
};
use crate::shader::ShaderProgram;

/// Position inside the frame lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    FrameBegun,
    Drawing,
    FrameResolved,
}

/// Work submitted during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub indices: u64,
}

/// Drives one frame at a time against a shared context
pub struct FrameCoordinator {
    context: SharedContext,
    state: FrameState,
    stats: FrameStats,
    /// Target framebuffer of the frame in progress
    active: Option<FramebufferHandle>,
}

impl FrameCoordinator {
    pub fn new(context: SharedContext) -> Self {
        Self {
            context,
            state: FrameState::Idle,
            stats: FrameStats::default(),
            active: None,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Statistics of the frame in progress (or of the last one, once ended)
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    fn require(&self, operation: &str, allowed: &[FrameState]) -> Result<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        let message = format!("{} is not allowed in state {:?}", operation, self.state);
        engine_error!("lumen::FrameCoordinator", "{}", message);
        Err(Error::InvalidFrameState(message))
    }

    /// Bind the target and clear it
    ///
    /// Color and depth are cleared with `clear_color`; every integer
    /// attachment (index 1 and up) is filled with `PICK_SENTINEL`.
    pub fn begin_frame(&mut self, framebuffer: &Framebuffer, clear_color: Vec4) -> Result<()> {
        self.require("begin_frame", &[FrameState::Idle])?;

        framebuffer.bind()?;
        if let Err(err) = self.clear_target(framebuffer, clear_color) {
            // The frame never started, so the target must not stay bound
            let _ = framebuffer.unbind();
            return Err(err);
        }

        self.active = Some(framebuffer.target_handle());
        self.stats = FrameStats::default();
        self.state = FrameState::FrameBegun;
        engine_trace!("lumen::FrameCoordinator", "Frame begun on {:?}", framebuffer.target_handle());
        Ok(())
    }

    fn clear_target(&self, framebuffer: &Framebuffer, clear_color: Vec4) -> Result<()> {
        {
            let mut ctx = lock_context(&self.context)?;
            ctx.set_clear_color(clear_color);
            ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH)?;
        }
        for attachment in 1..framebuffer.color_attachment_count() {
            framebuffer.clear_attachment(attachment, PICK_SENTINEL)?;
        }
        Ok(())
    }

    /// Bind program and vertex array, then draw the vertex array's indices
    ///
    /// The vertex layout is not checked against the program.
    pub fn draw(&mut self, program: &mut ShaderProgram, vertex_array: &VertexArray) -> Result<()> {
        self.require("draw", &[FrameState::FrameBegun, FrameState::Drawing])?;

        program.bind()?;
        let count = vertex_array.index_count();
        {
            let mut ctx = lock_context(&self.context)?;
            ctx.bind_vertex_array(Some(vertex_array.handle()))?;
            ctx.draw_indexed(count)?;
        }

        self.stats.draw_calls += 1;
        self.stats.indices += u64::from(count);
        self.state = FrameState::Drawing;
        Ok(())
    }

    /// Resolve the multisampled attachments of the frame's target
    ///
    /// Returns the number of attachments blitted; 0 (and nothing touched)
    /// when the framebuffer has MSAA disabled.
    pub fn resolve(&mut self, framebuffer: &Framebuffer) -> Result<u32> {
        self.require("resolve", &[FrameState::FrameBegun, FrameState::Drawing])?;
        if self.active != Some(framebuffer.target_handle()) {
            let message = "resolve called with a framebuffer other than the frame's target".to_string();
            engine_error!("lumen::FrameCoordinator", "{}", message);
            return Err(Error::InvalidFrameState(message));
        }

        let resolved = framebuffer.resolve_msaa()?;
        self.state = FrameState::FrameResolved;
        Ok(resolved)
    }

    /// Unbind the target, present and return to Idle
    pub fn end_frame(&mut self) -> Result<FrameStats> {
        self.require("end_frame", &[FrameState::FrameResolved])?;
        {
            let mut ctx = lock_context(&self.context)?;
            ctx.bind_framebuffer(None)?;
            ctx.bind_vertex_array(None)?;
            ctx.present()?;
        }

        self.active = None;
        self.state = FrameState::Idle;
        engine_trace!(
            "lumen::FrameCoordinator",
            "Frame ended: {} draw calls, {} indices",
            self.stats.draw_calls, self.stats.indices
        );
        Ok(self.stats)
    }

    /// Resize a framebuffer between frames
    pub fn resize_target(&self, framebuffer: &mut Framebuffer, width: u32, height: u32) -> Result<()> {
        self.require("resize_target", &[FrameState::Idle])?;
        framebuffer.resize(width, height)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
