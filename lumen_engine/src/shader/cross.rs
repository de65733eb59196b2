/// CrossCompiler - retargets portable binaries to the native display target
///
/// Each portable binary is decompiled back to source and that recovered source
/// (not the hand-authored one) is compiled for the native target, so the
/// native binary follows what the portable compiler actually produced.

use crate::error::{Error, Result};
use crate::{engine_debug, engine_error};
use crate::shader::{
    Fingerprint, IntermediateCompiler, ShaderDocument, ShaderStage, StageBinaries, TargetEnvironment,
};

/// Native binaries plus the sources they were recompiled from
#[derive(Debug, Clone, Default)]
pub struct RetargetedShader {
    binaries: StageBinaries,
    recovered: Vec<(ShaderStage, String)>,
}

impl RetargetedShader {
    pub fn binaries(&self) -> &StageBinaries {
        &self.binaries
    }

    pub fn into_binaries(self) -> StageBinaries {
        self.binaries
    }

    /// Decompiled source of a stage; absent when its native binary came from the cache
    pub fn recovered_source(&self, stage: ShaderStage) -> Option<&str> {
        self.recovered
            .iter()
            .find(|(recovered_stage, _)| *recovered_stage == stage)
            .map(|(_, source)| source.as_str())
    }
}

/// Retargets through an intermediate compiler (same compiler, same cache)
pub struct CrossCompiler<'a> {
    intermediate: &'a IntermediateCompiler,
}

impl<'a> CrossCompiler<'a> {
    pub fn new(intermediate: &'a IntermediateCompiler) -> Self {
        Self { intermediate }
    }

    /// Build the native binaries of every portable stage
    ///
    /// A cached native entry is reused without decompiling; in fingerprint
    /// mode the entry is keyed on the portable binary it came from.
    ///
    /// # Errors
    ///
    /// `Error::ShaderCompile` when decompilation or recompilation fails.
    pub fn retarget(&self, document: &ShaderDocument, portable: &StageBinaries) -> Result<RetargetedShader> {
        let target = TargetEnvironment::NativeDisplay;
        let compiler = self.intermediate.compiler();
        let mut retargeted = RetargetedShader::default();

        for (stage, binary) in portable.iter() {
            let fingerprint = Fingerprint::of_binary(binary, compiler.version(), target, target.optimize());
            if let Some(cached) = self.intermediate.fetch_cached(document, stage, target, fingerprint) {
                retargeted.binaries.insert(stage, cached);
                continue;
            }

            let recovered = compiler.decompile(stage, binary, target).map_err(|diagnostic| {
                engine_error!(
                    "lumen::CrossCompiler",
                    "Failed to decompile {} stage of '{}': {}",
                    stage, document.identity(), diagnostic
                );
                Error::ShaderCompile {
                    document: document.identity().to_string(),
                    stage,
                    diagnostic: format!("decompile: {}", diagnostic),
                }
            })?;
            engine_debug!("lumen::CrossCompiler", "Recovered {} bytes of {} source for '{}'", recovered.len(), stage, document.identity());

            let native = self.intermediate.compile_and_store(document, stage, &recovered, target, fingerprint)?;
            retargeted.binaries.insert(stage, native);
            retargeted.recovered.push((stage, recovered));
        }
        Ok(retargeted)
    }
}

#[cfg(test)]
#[path = "cross_tests.rs"]
mod tests;
