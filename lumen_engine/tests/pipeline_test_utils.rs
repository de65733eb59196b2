#![allow(dead_code)]
//! Pipeline test utilities - stub compiler and scratch directories
//!
//! The stub lets the shader pipeline run end to end without naga: a stage
//! binary is the source length as a single word.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lumen_engine::lumen::graphics::{HeadlessContext, SharedContext};
use lumen_engine::lumen::shader::{CompileRequest, ShaderCompiler, ShaderStage, TargetEnvironment};
use lumen_engine::lumen::EngineConfig;

/// Compiles a stage to `[source.len()]`, fails on `SYNTAX_ERROR`
#[derive(Debug, Default)]
pub struct EchoLengthCompiler {
    compiles: AtomicUsize,
}

impl EchoLengthCompiler {
    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
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
        Ok(format!("{:?}", binary))
    }
}

/// Fresh, empty scratch directory unique to one test
pub fn temp_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lumen_it_{}_{}", test, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Engine config whose shader cache lives in `cache_root`
pub fn config_with_cache(cache_root: PathBuf) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.shader.cache_root = cache_root;
    config
}

/// Headless context, both as its concrete type (for inspection) and shared
pub fn headless_context() -> (Arc<Mutex<HeadlessContext>>, SharedContext) {
    let headless = Arc::new(Mutex::new(HeadlessContext::new()));
    let shared: SharedContext = headless.clone();
    (headless, shared)
}
