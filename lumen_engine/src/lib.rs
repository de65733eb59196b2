/*!
# Lumen Engine

Core of the Lumen rendering engine: a shader compilation and binary-caching
pipeline, and the frame lifecycle that pipeline operates within.

## Architecture

- **GraphicsContext**: capability-set trait implemented once per backend
  (`HeadlessContext` is the software backend)
- **Shader pipeline**: stage splitting, portable compilation with an on-disk
  cache, retargeting to the native environment, reflection and program linking
- **Framebuffer**: attachments, MSAA resolve target and integer read-back for picking
- **FrameCoordinator**: begin / draw / resolve / end state machine

There is no process-wide graphics state: every component receives the shared
context it works on explicitly.
*/

// Internal modules
mod error;
mod engine;
pub mod config;
pub mod log;
pub mod graphics;
pub mod shader;
pub mod frame;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result, ParseErrorKind};

    // Logging hub
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{EngineConfig, ShaderPipelineConfig, LinkerConfig, UniformPolicy};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Graphics context, resources and buffers
    pub mod graphics {
        pub use crate::graphics::*;
    }

    // Shader pipeline
    pub mod shader {
        pub use crate::shader::*;
    }

    // Frame lifecycle
    pub mod frame {
        pub use crate::frame::*;
    }
}

// Re-export math library at crate root
pub use glam;
