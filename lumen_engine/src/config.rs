/// Engine configuration
///
/// Plain data structs with `Default` impls. Nothing here is global: a config is
/// handed to `create_context` and to the pipeline constructors that need it.

use std::path::PathBuf;

use crate::graphics::Backend;
use crate::shader::CacheValidation;

/// Behaviour of uniform uploads whose name does not resolve to a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniformPolicy {
    /// Skip the write without any diagnostic
    #[default]
    Silent,
    /// Skip the write and log a warning naming the uniform and program
    Warn,
}

/// Shader compilation and cache settings
#[derive(Debug, Clone)]
pub struct ShaderPipelineConfig {
    /// Root directory of the on-disk binary cache
    pub cache_root: PathBuf,
    /// How cached binaries are validated before reuse
    pub validation: CacheValidation,
}

impl Default for ShaderPipelineConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("assets/cache/shader"),
            validation: CacheValidation::default(),
        }
    }
}

/// Program linker settings
#[derive(Debug, Clone, Copy)]
pub struct LinkerConfig {
    /// Maximum number of bytes of a compile/link log kept in an error
    pub max_log_len: usize,
    /// What to do when a uniform name is not found
    pub uniform_policy: UniformPolicy,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            max_log_len: 1024,
            uniform_policy: UniformPolicy::default(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Graphics backend created by `create_context`
    pub backend: Backend,
    /// Shader pipeline settings
    pub shader: ShaderPipelineConfig,
    /// Linker settings
    pub linker: LinkerConfig,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
