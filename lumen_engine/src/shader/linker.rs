/// ProgramLinker - stage objects, program link and the linked program wrapper
///
/// A link runs Created -> StagesAttached -> Linked | LinkFailed. Whatever the
/// failure, every stage object and the program object created by that link are
/// deleted before the error is returned. On success the stages are detached but
/// kept alive until the program is destroyed.

use glam::{Mat4, Vec4};

use crate::config::{LinkerConfig, UniformPolicy};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_warn};
use crate::graphics::{
    lock_context, GraphicsContext, ProgramHandle, SharedContext, StageHandle, UniformValue,
};
use crate::shader::{ShaderStage, StageBinaries, ENTRY_POINT};

/// Progress of the last link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Created,
    StagesAttached,
    Linked,
    LinkFailed,
}

/// What a stage object is built from
#[derive(Clone, Copy)]
enum StageInput<'a> {
    Binary(&'a [u32]),
    Source(&'a str),
}

/// Cut a diagnostic log to at most `max_len` bytes, on a char boundary
fn truncate_log(log: &str, max_len: usize) -> String {
    if log.len() <= max_len {
        return log.to_string();
    }
    let mut end = max_len;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_string()
}

/// Builds linked programs on a shared context
pub struct ProgramLinker {
    context: SharedContext,
    config: LinkerConfig,
    last_state: Option<LinkState>,
}

impl ProgramLinker {
    pub fn new(context: SharedContext, config: LinkerConfig) -> Self {
        Self { context, config, last_state: None }
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// State reached by the most recent link (`None` before the first one)
    pub fn last_state(&self) -> Option<LinkState> {
        self.last_state
    }

    /// Link a program from compiled stage binaries
    ///
    /// # Errors
    ///
    /// `Error::ShaderCompile` if a binary is rejected by the context,
    /// `Error::Link` with the truncated linker log if the program does not link.
    pub fn link_binaries(&mut self, name: &str, binaries: &StageBinaries) -> Result<ShaderProgram> {
        let inputs: Vec<(ShaderStage, StageInput<'_>)> = binaries
            .iter()
            .map(|(stage, binary)| (stage, StageInput::Binary(binary)))
            .collect();
        self.link(name, &inputs)
    }

    /// Link a program straight from vertex and fragment source, bypassing the cache
    pub fn link_sources(&mut self, name: &str, vertex: &str, fragment: &str) -> Result<ShaderProgram> {
        let inputs = [
            (ShaderStage::Vertex, StageInput::Source(vertex)),
            (ShaderStage::Fragment, StageInput::Source(fragment)),
        ];
        self.link(name, &inputs)
    }

    fn link(&mut self, name: &str, inputs: &[(ShaderStage, StageInput<'_>)]) -> Result<ShaderProgram> {
        let mut ctx = lock_context(&self.context)?;
        let program = ctx.create_program()?;
        let mut state = LinkState::Created;
        let mut stages: Vec<(ShaderStage, StageHandle)> = Vec::with_capacity(inputs.len());

        let result = Self::attach_and_link(
            &mut *ctx,
            name,
            program,
            inputs,
            self.config.max_log_len,
            &mut stages,
            &mut state,
        );
        if let Err(e) = result {
            for (_, stage) in &stages {
                let _ = ctx.delete_stage(*stage);
            }
            let _ = ctx.delete_program(program);
            self.last_state = Some(LinkState::LinkFailed);
            return Err(e);
        }

        self.last_state = Some(state);
        engine_debug!("lumen::ProgramLinker", "Linked program '{}' ({} stages)", name, stages.len());
        Ok(ShaderProgram {
            context: self.context.clone(),
            name: name.to_string(),
            handle: program,
            stages,
            uniform_policy: self.config.uniform_policy,
            previous: None,
            destroyed: false,
        })
    }

    fn attach_and_link(
        ctx: &mut dyn GraphicsContext,
        name: &str,
        program: ProgramHandle,
        inputs: &[(ShaderStage, StageInput<'_>)],
        max_log_len: usize,
        stages: &mut Vec<(ShaderStage, StageHandle)>,
        state: &mut LinkState,
    ) -> Result<()> {
        for (stage, input) in inputs {
            let handle = ctx.create_stage(*stage)?;
            stages.push((*stage, handle));
            match input {
                StageInput::Binary(binary) => ctx.load_stage_binary(handle, binary, ENTRY_POINT)?,
                StageInput::Source(source) => ctx.compile_stage_source(handle, source)?,
            }
            if !ctx.stage_compiled(handle)? {
                let diagnostic = truncate_log(&ctx.stage_info_log(handle)?, max_log_len);
                engine_error!("lumen::ProgramLinker", "{} stage of '{}' failed to compile:\n{}", stage, name, diagnostic);
                return Err(Error::ShaderCompile { document: name.to_string(), stage: *stage, diagnostic });
            }
            ctx.attach_stage(program, handle)?;
        }
        *state = LinkState::StagesAttached;

        ctx.link_program(program)?;
        if !ctx.program_linked(program)? {
            let log = truncate_log(&ctx.program_info_log(program)?, max_log_len);
            engine_error!("lumen::ProgramLinker", "Program '{}' failed to link:\n{}", name, log);
            return Err(Error::Link { program: name.to_string(), log });
        }

        for (_, handle) in stages.iter() {
            ctx.detach_stage(program, *handle)?;
        }
        *state = LinkState::Linked;
        Ok(())
    }
}

// ============================================================================
// ShaderProgram
// ============================================================================

/// Linked program, exclusively owned; destroyed explicitly or on drop
pub struct ShaderProgram {
    context: SharedContext,
    name: String,
    handle: ProgramHandle,
    stages: Vec<(ShaderStage, StageHandle)>,
    uniform_policy: UniformPolicy,
    /// Program that was current before the last `bind` (single slot)
    previous: Option<ProgramHandle>,
    destroyed: bool,
}

impl ShaderProgram {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn stages(&self) -> impl Iterator<Item = ShaderStage> + '_ {
        self.stages.iter().map(|(stage, _)| *stage)
    }

    /// Stage object kept alive for this program
    pub fn stage_handle(&self, stage: ShaderStage) -> Option<StageHandle> {
        self.stages
            .iter()
            .find(|(kind, _)| *kind == stage)
            .map(|(_, handle)| *handle)
    }

    pub fn uniform_policy(&self) -> UniformPolicy {
        self.uniform_policy
    }

    pub fn set_uniform_policy(&mut self, policy: UniformPolicy) {
        self.uniform_policy = policy;
    }

    pub fn is_bound(&self) -> bool {
        lock_context(&self.context)
            .map(|ctx| ctx.current_program() == Some(self.handle))
            .unwrap_or(false)
    }

    /// Make this program current, remembering the one it replaces
    ///
    /// Binding an already current program changes nothing.
    pub fn bind(&mut self) -> Result<()> {
        let mut ctx = lock_context(&self.context)?;
        let current = ctx.current_program();
        if current == Some(self.handle) {
            return Ok(());
        }
        ctx.use_program(Some(self.handle))?;
        self.previous = current;
        Ok(())
    }

    /// Restore the program that was current before `bind`
    ///
    /// No-op when this program is not current. If the remembered program no
    /// longer exists, no program is left current.
    pub fn unbind(&mut self) -> Result<()> {
        let mut ctx = lock_context(&self.context)?;
        if ctx.current_program() != Some(self.handle) {
            return Ok(());
        }
        let previous = self.previous.take();
        if ctx.use_program(previous).is_err() {
            ctx.use_program(None)?;
        }
        Ok(())
    }

    /// Bind for the lifetime of the returned guard
    ///
    /// Each guard keeps its own previous program, so nested scopes restore in
    /// reverse order.
    pub fn bind_scoped(&self) -> Result<ProgramScope<'_>> {
        let mut ctx = lock_context(&self.context)?;
        let current = ctx.current_program();
        let restore = if current == Some(self.handle) {
            None
        } else {
            ctx.use_program(Some(self.handle))?;
            Some(current)
        };
        Ok(ProgramScope { program: self, restore })
    }

    pub fn set_mat4(&self, name: &str, value: Mat4) -> Result<()> {
        self.upload(name, UniformValue::Mat4(value))
    }

    pub fn set_vec4(&self, name: &str, value: Vec4) -> Result<()> {
        self.upload(name, UniformValue::Vec4(value))
    }

    pub fn set_int(&self, name: &str, value: i32) -> Result<()> {
        self.upload(name, UniformValue::Int(value))
    }

    pub fn set_float(&self, name: &str, value: f32) -> Result<()> {
        self.upload(name, UniformValue::Float(value))
    }

    pub fn set_int_array(&self, name: &str, values: &[i32]) -> Result<()> {
        self.upload(name, UniformValue::IntArray(values.to_vec()))
    }

    fn upload(&self, name: &str, value: UniformValue) -> Result<()> {
        let mut ctx = lock_context(&self.context)?;
        match ctx.uniform_location(self.handle, name)? {
            Some(location) => ctx.set_uniform(self.handle, location, value),
            None => {
                if self.uniform_policy == UniformPolicy::Warn {
                    engine_warn!("lumen::ShaderProgram", "Uniform '{}' not found in program '{}'", name, self.name);
                }
                Ok(())
            }
        }
    }

    /// Delete the program and its stage objects
    pub fn destroy(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        let mut ctx = lock_context(&self.context)?;
        if ctx.current_program() == Some(self.handle) {
            let previous = self.previous.take();
            if ctx.use_program(previous).is_err() {
                ctx.use_program(None)?;
            }
        }
        ctx.delete_program(self.handle)?;
        for (_, stage) in self.stages.drain(..) {
            ctx.delete_stage(stage)?;
        }
        self.destroyed = true;
        Ok(())
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        let _ = self.destroy();
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("stages", &self.stages)
            .finish()
    }
}

/// Guard returned by `ShaderProgram::bind_scoped`
pub struct ProgramScope<'a> {
    program: &'a ShaderProgram,
    /// `None` when the program was already current on entry
    restore: Option<Option<ProgramHandle>>,
}

impl ProgramScope<'_> {
    pub fn program(&self) -> &ShaderProgram {
        self.program
    }
}

impl Drop for ProgramScope<'_> {
    fn drop(&mut self) {
        let Some(previous) = self.restore else {
            return;
        };
        if let Ok(mut ctx) = lock_context(&self.program.context) {
            if ctx.current_program() == Some(self.program.handle) && ctx.use_program(previous).is_err() {
                let _ = ctx.use_program(None);
            }
        }
    }
}

#[cfg(test)]
#[path = "linker_tests.rs"]
mod tests;
