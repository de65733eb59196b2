//! Stub compiler for unit tests (no naga required)
//!
//! `compile` echoes the source length as a one-word binary and fails on
//! sources containing `SYNTAX_ERROR`; `decompile` prints the words back.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::shader::{CompileRequest, ShaderCompiler, ShaderStage, TargetEnvironment};

#[derive(Debug, Default)]
pub struct EchoLengthCompiler {
    pub compiles: AtomicUsize,
    pub decompiles: AtomicUsize,
}

impl EchoLengthCompiler {
    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }

    pub fn decompile_count(&self) -> usize {
        self.decompiles.load(Ordering::SeqCst)
    }
}

impl ShaderCompiler for EchoLengthCompiler {
    fn version(&self) -> &str {
        "echo-length-1"
    }

    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u32>, String> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if request.source.contains("SYNTAX_ERROR") {
            return Err(format!("0:1: error: syntax error in {} stage", request.stage));
        }
        Ok(vec![request.source.len() as u32])
    }

    fn decompile(&self, _stage: ShaderStage, binary: &[u32], _target: TargetEnvironment) -> Result<String, String> {
        self.decompiles.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{:?}", binary))
    }
}
