/// Shader documents and the `#type` stage splitter
///
/// A document is one text file holding several stages, each introduced by a
/// `#type <stage>` line:
///
/// ```text
/// #type vertex
/// ...vertex source...
/// #type fragment
/// ...fragment source...
/// ```

use std::fs;
use std::path::Path;

use crate::error::{Error, ParseErrorKind, Result};
use crate::shader::ShaderStage;

/// Token that starts a stage marker line
pub const STAGE_MARKER: &str = "#type ";

// ===== DOCUMENT =====

/// Immutable multi-stage shader source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDocument {
    identity: String,
    source: String,
}

impl ShaderDocument {
    /// Build a document from an identity (path or name) and its text
    pub fn new(identity: impl Into<String>, source: impl Into<String>) -> Self {
        Self { identity: identity.into(), source: source.into() }
    }

    /// Read a document from disk, its path becoming its identity
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            Error::InvalidResource(format!("Could not open shader file '{}': {}", path.display(), e))
        })?;
        Ok(Self::new(path.to_string_lossy(), source))
    }

    /// Path or name the document was created with
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// File name without directories and extension (cache directory name)
    pub fn base_name(&self) -> String {
        Path::new(&self.identity)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.identity.clone())
    }
}

// ===== STAGE SOURCES =====

/// Per-stage sources of one document, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSources {
    entries: Vec<(ShaderStage, String)>,
}

impl StageSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage; returns false (and keeps the first source) if already present
    pub fn insert(&mut self, stage: ShaderStage, source: impl Into<String>) -> bool {
        if self.contains(stage) {
            return false;
        }
        self.entries.push((stage, source.into()));
        true
    }

    pub fn get(&self, stage: ShaderStage) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry_stage, _)| *entry_stage == stage)
            .map(|(_, source)| source.as_str())
    }

    pub fn contains(&self, stage: ShaderStage) -> bool {
        self.entries.iter().any(|(entry_stage, _)| *entry_stage == stage)
    }

    /// Stages in document order
    pub fn stages(&self) -> impl Iterator<Item = ShaderStage> + '_ {
        self.entries.iter().map(|(stage, _)| *stage)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        self.entries.iter().map(|(stage, source)| (*stage, source.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===== SPLITTER =====

/// Split a document into its stage sources
///
/// A marker is `#type ` at the start of a line followed by a stage name up to
/// the line break (LF or CRLF). Text before the first marker is ignored and
/// every stage body is trimmed.
///
/// # Errors
///
/// `Error::Parse` when the document has no marker, names an unknown stage, or
/// declares the same stage twice.
pub fn split_stages(document: &ShaderDocument) -> Result<StageSources> {
    let text = document.source();
    let parse_error = |kind| Error::Parse { document: document.identity().to_string(), kind };

    // (marker line start, stage, body start)
    let mut markers = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if let Some(rest) = line.strip_prefix(STAGE_MARKER) {
            let name = rest.trim();
            let stage = ShaderStage::from_name(name)
                .ok_or_else(|| parse_error(ParseErrorKind::InvalidStageName(name.to_string())))?;
            markers.push((offset, stage, offset + line.len()));
        }
        offset += line.len();
    }

    if markers.is_empty() {
        return Err(parse_error(ParseErrorKind::MissingStageMarkers));
    }

    let mut sources = StageSources::new();
    for (index, (_, stage, body_start)) in markers.iter().enumerate() {
        let body_end = markers.get(index + 1).map_or(text.len(), |(next_start, _, _)| *next_start);
        if !sources.insert(*stage, text[*body_start..body_end].trim()) {
            return Err(parse_error(ParseErrorKind::DuplicateStage(*stage)));
        }
    }
    Ok(sources)
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
