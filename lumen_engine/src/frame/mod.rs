/// Frame module - per-frame lifecycle around the render target

// Module declarations
pub mod coordinator;

// Re-export from submodules
pub use coordinator::*;
