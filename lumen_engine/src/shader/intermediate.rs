/// IntermediateCompiler - compile-or-fetch of stage binaries
///
/// Each (document, stage, target environment) triple maps to one cache entry.
/// A valid entry is returned verbatim; otherwise the stage is compiled and the
/// result persisted. A failed cache write never fails the compilation.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_warn};
use crate::shader::{
    CompileRequest, Fingerprint, ShaderCache, ShaderCompiler, ShaderDocument, ShaderStage,
    StageSources, TargetEnvironment,
};

/// Word sequence of one compiled stage
pub type CompiledBinary = Vec<u32>;

/// Compiled binaries of one document for one environment, in stage order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageBinaries {
    entries: Vec<(ShaderStage, CompiledBinary)>,
}

impl StageBinaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage binary; returns false (and keeps the first) if already present
    pub fn insert(&mut self, stage: ShaderStage, binary: CompiledBinary) -> bool {
        if self.contains(stage) {
            return false;
        }
        self.entries.push((stage, binary));
        true
    }

    pub fn get(&self, stage: ShaderStage) -> Option<&[u32]> {
        self.entries
            .iter()
            .find(|(entry_stage, _)| *entry_stage == stage)
            .map(|(_, binary)| binary.as_slice())
    }

    pub fn contains(&self, stage: ShaderStage) -> bool {
        self.entries.iter().any(|(entry_stage, _)| *entry_stage == stage)
    }

    pub fn stages(&self) -> impl Iterator<Item = ShaderStage> + '_ {
        self.entries.iter().map(|(stage, _)| *stage)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShaderStage, &[u32])> {
        self.entries.iter().map(|(stage, binary)| (*stage, binary.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cached stage compiler
pub struct IntermediateCompiler {
    compiler: Arc<dyn ShaderCompiler>,
    cache: ShaderCache,
}

impl IntermediateCompiler {
    pub fn new(compiler: Arc<dyn ShaderCompiler>, cache: ShaderCache) -> Self {
        Self { compiler, cache }
    }

    pub fn compiler(&self) -> &Arc<dyn ShaderCompiler> {
        &self.compiler
    }

    pub fn cache(&self) -> &ShaderCache {
        &self.cache
    }

    /// Return the cached binary for this stage, compiling and caching it on a miss
    ///
    /// # Errors
    ///
    /// `Error::ShaderCompile` with the compiler diagnostic when compilation fails.
    pub fn compile_or_fetch(
        &self,
        document: &ShaderDocument,
        stage: ShaderStage,
        source: &str,
        environment: TargetEnvironment,
    ) -> Result<CompiledBinary> {
        let fingerprint = Fingerprint::of_source(source, self.compiler.version(), environment, environment.optimize());
        if let Some(binary) = self.fetch_cached(document, stage, environment, fingerprint) {
            return Ok(binary);
        }
        self.compile_and_store(document, stage, source, environment, fingerprint)
    }

    /// Compile every stage of a document, stopping at the first failure
    pub fn compile_all(
        &self,
        document: &ShaderDocument,
        sources: &StageSources,
        environment: TargetEnvironment,
    ) -> Result<StageBinaries> {
        let start = Instant::now();
        let mut binaries = StageBinaries::new();
        for (stage, source) in sources.iter() {
            let binary = self.compile_or_fetch(document, stage, source, environment)?;
            binaries.insert(stage, binary);
        }
        engine_debug!(
            "lumen::IntermediateCompiler",
            "{} binaries for '{}' ready in {:.2} ms",
            environment.cache_tag(),
            document.identity(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(binaries)
    }

    pub(crate) fn fetch_cached(
        &self,
        document: &ShaderDocument,
        stage: ShaderStage,
        environment: TargetEnvironment,
        fingerprint: Fingerprint,
    ) -> Option<CompiledBinary> {
        self.cache.load(&document.base_name(), stage, environment, fingerprint)
    }

    pub(crate) fn compile_and_store(
        &self,
        document: &ShaderDocument,
        stage: ShaderStage,
        source: &str,
        environment: TargetEnvironment,
        fingerprint: Fingerprint,
    ) -> Result<CompiledBinary> {
        let request = CompileRequest {
            document: document.identity(),
            stage,
            source,
            environment,
            optimize: environment.optimize(),
        };
        let binary = self.compiler.compile(&request).map_err(|diagnostic| {
            engine_error!(
                "lumen::IntermediateCompiler",
                "Failed to compile {} stage of '{}' for {}:\n{}",
                stage, document.identity(), environment, diagnostic
            );
            Error::ShaderCompile {
                document: document.identity().to_string(),
                stage,
                diagnostic,
            }
        })?;

        if let Err(e) = self.cache.store(&document.base_name(), stage, environment, fingerprint, &binary) {
            engine_warn!("lumen::IntermediateCompiler", "{}", e);
        }
        Ok(binary)
    }
}

#[cfg(test)]
#[path = "intermediate_tests.rs"]
mod tests;
