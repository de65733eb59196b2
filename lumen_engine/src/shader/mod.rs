/// Shader module - source splitting, compilation, caching, retargeting,
/// reflection and program linking

// Module declarations
pub mod stage;
pub mod source;
pub mod compiler;
pub mod cache;
pub mod intermediate;
pub mod cross;
pub mod reflect;
pub mod linker;
pub mod shader;
pub mod library;

// Re-export from submodules
pub use stage::*;
pub use source::*;
pub use compiler::*;
pub use cache::*;
pub use intermediate::*;
pub use cross::*;
pub use reflect::*;
pub use linker::*;
pub use shader::*;
pub use library::*;

// Stub compiler for tests (no naga round-trip required)
#[cfg(test)]
pub mod stub_compiler;
