/// ShaderPipeline - document to linked program, and the resulting Shader
///
/// `build` runs the whole chain: split stages, compile (or fetch) portable
/// binaries, reflect them for diagnostics, retarget to the native environment
/// and link the native binaries into a program.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::engine_info;
use crate::graphics::SharedContext;
use crate::shader::{
    split_stages, CrossCompiler, IntermediateCompiler, NagaCompiler, ProgramLinker, Reflector,
    ResourceDescriptor, RetargetedShader, ShaderCache, ShaderCompiler, ShaderDocument,
    ShaderProgram, ShaderStage, StageBinaries, TargetEnvironment,
};

/// Compiler, cache and linker wired together
pub struct ShaderPipeline {
    intermediate: IntermediateCompiler,
    linker: ProgramLinker,
}

impl ShaderPipeline {
    pub fn new(context: SharedContext, compiler: Arc<dyn ShaderCompiler>, config: &EngineConfig) -> Self {
        let cache = ShaderCache::new(config.shader.cache_root.clone(), config.shader.validation);
        Self {
            intermediate: IntermediateCompiler::new(compiler, cache),
            linker: ProgramLinker::new(context, config.linker),
        }
    }

    /// Pipeline using the naga GLSL compiler
    pub fn with_naga(context: SharedContext, config: &EngineConfig) -> Self {
        Self::new(context, Arc::new(NagaCompiler::new()), config)
    }

    pub fn intermediate(&self) -> &IntermediateCompiler {
        &self.intermediate
    }

    pub fn linker(&self) -> &ProgramLinker {
        &self.linker
    }

    /// Read a document from disk and build it
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Shader> {
        let document = ShaderDocument::load(path)?;
        self.build(&document)
    }

    /// Build a linked shader from a multi-stage document
    ///
    /// # Errors
    ///
    /// `Error::Parse`, `Error::ShaderCompile` or `Error::Link`; no partial
    /// program survives a failure. Reflection failures are only logged.
    pub fn build(&mut self, document: &ShaderDocument) -> Result<Shader> {
        let start = Instant::now();
        let sources = split_stages(document)?;
        let portable = self
            .intermediate
            .compile_all(document, &sources, TargetEnvironment::PortableCompute)?;

        let mut resources = Vec::with_capacity(portable.len());
        for (stage, binary) in portable.iter() {
            let listing = Reflector::reflect_or_empty(stage, binary);
            Reflector::log_resources(stage, &listing);
            resources.push((stage, listing));
        }

        let native = CrossCompiler::new(&self.intermediate).retarget(document, &portable)?;
        let name = document.base_name();
        let program = self.linker.link_binaries(&name, native.binaries())?;

        engine_info!(
            "lumen::ShaderPipeline",
            "Shader '{}' ready in {:.2} ms",
            name,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(Shader {
            name,
            program,
            portable: Some(portable),
            native: Some(native),
            resources,
        })
    }

    /// Build a shader straight from vertex and fragment source (no cache, no reflection)
    pub fn build_from_sources(&mut self, name: &str, vertex: &str, fragment: &str) -> Result<Shader> {
        let program = self.linker.link_sources(name, vertex, fragment)?;
        Ok(Shader {
            name: name.to_string(),
            program,
            portable: None,
            native: None,
            resources: Vec::new(),
        })
    }
}

/// Linked shader plus the artifacts it was built from
#[derive(Debug)]
pub struct Shader {
    name: String,
    program: ShaderProgram,
    portable: Option<StageBinaries>,
    native: Option<RetargetedShader>,
    resources: Vec<(ShaderStage, Vec<ResourceDescriptor>)>,
}

impl Shader {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut ShaderProgram {
        &mut self.program
    }

    /// Portable binaries (absent for shaders built from raw source)
    pub fn portable_binaries(&self) -> Option<&StageBinaries> {
        self.portable.as_ref()
    }

    /// Native binaries and recovered sources (absent for shaders built from raw source)
    pub fn native(&self) -> Option<&RetargetedShader> {
        self.native.as_ref()
    }

    /// Reflected resources of one stage's portable binary
    pub fn resources(&self, stage: ShaderStage) -> &[ResourceDescriptor] {
        self.resources
            .iter()
            .find(|(resource_stage, _)| *resource_stage == stage)
            .map(|(_, listing)| listing.as_slice())
            .unwrap_or(&[])
    }

    pub fn bind(&mut self) -> Result<()> {
        self.program.bind()
    }

    pub fn unbind(&mut self) -> Result<()> {
        self.program.unbind()
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
