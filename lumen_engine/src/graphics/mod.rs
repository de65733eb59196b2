/// Graphics module - context trait, backends and GPU-side resources

// Module declarations
pub mod context;
pub mod texture;
pub mod buffer;
pub mod framebuffer;
pub mod headless_context;

// Re-export everything from context.rs
pub use context::*;

// Re-export from other modules
pub use texture::*;
pub use buffer::*;
pub use framebuffer::*;
pub use headless_context::HeadlessContext;
