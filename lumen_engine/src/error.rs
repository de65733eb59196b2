//! Error types for the Lumen engine
//!
//! This module defines the single error enum used throughout the engine:
//! backend failures, shader parsing/compilation/linking, reflection, shader
//! cache I/O, pixel read-back and frame-state misuse.

use std::fmt;
use std::path::PathBuf;

use crate::shader::ShaderStage;

/// Result type for Lumen engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reason a multi-stage shader document could not be split
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The document contains no `#type` marker at all
    MissingStageMarkers,

    /// A `#type` marker names a stage outside {vertex, fragment, geometry, compute}
    InvalidStageName(String),

    /// The same stage is declared twice in one document
    DuplicateStage(ShaderStage),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::MissingStageMarkers => write!(f, "no '#type' stage marker found"),
            ParseErrorKind::InvalidStageName(name) => write!(f, "unsupported shader type '{}'", name),
            ParseErrorKind::DuplicateStage(stage) => write!(f, "stage '{}' declared more than once", stage),
        }
    }
}

/// Lumen engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (headless, OpenGL, etc.)
    BackendError(String),

    /// Invalid resource (texture, buffer, program, framebuffer, etc.)
    InvalidResource(String),

    /// Malformed shader document or stage markers
    Parse {
        document: String,
        kind: ParseErrorKind,
    },

    /// A shader stage failed to compile
    ShaderCompile {
        document: String,
        stage: ShaderStage,
        diagnostic: String,
    },

    /// A program failed to link
    Link {
        program: String,
        log: String,
    },

    /// A compiled binary could not be introspected
    Reflection {
        stage: ShaderStage,
        message: String,
    },

    /// A shader cache directory or file could not be created or written
    CacheIo {
        path: PathBuf,
        message: String,
    },

    /// Pixel read-back outside the framebuffer bounds
    Pick {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    /// Frame lifecycle call made in the wrong state
    InvalidFrameState(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::Parse { document, kind } => {
                write!(f, "Shader parse error in '{}': {}", document, kind)
            }
            Error::ShaderCompile { document, stage, diagnostic } => {
                write!(f, "Shader compile error in '{}' ({} stage): {}", document, stage, diagnostic)
            }
            Error::Link { program, log } => write!(f, "Program link error in '{}': {}", program, log),
            Error::Reflection { stage, message } => {
                write!(f, "Reflection error ({} stage): {}", stage, message)
            }
            Error::CacheIo { path, message } => {
                write!(f, "Shader cache I/O error at '{}': {}", path.display(), message)
            }
            Error::Pick { x, y, width, height } => {
                write!(f, "Pick ({}, {}) outside framebuffer {}x{}", x, y, width, height)
            }
            Error::InvalidFrameState(msg) => write!(f, "Invalid frame state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` from it
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("lumen::headless", "Unknown program {:?}", handle);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::lumen::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Error::BackendError)` from the enclosing function
///
/// # Example
///
/// ```ignore
/// engine_bail!("lumen::Framebuffer", "Attachment {} out of range", index);
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
