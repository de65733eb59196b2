/// On-disk shader binary cache
///
/// Layout: `<root>/<document base name>/<stage>.<env>_shadercache`, holding
/// the raw native-endian word image of the binary with no header. In
/// fingerprint mode a `<entry>.fingerprint` sidecar holds the hex fingerprint
/// of the inputs the entry was compiled from.

use std::fs;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rustc_hash::FxHasher;

use crate::error::{Error, Result};
use crate::{engine_debug, engine_trace, engine_warn};
use crate::shader::{ShaderStage, TargetEnvironment};

/// Extension suffix of the fingerprint sidecar
const FINGERPRINT_EXTENSION: &str = "fingerprint";

/// How a cache entry is validated before reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheValidation {
    /// A readable, non-empty file is trusted as is
    Existence,
    /// The entry is reused only if its sidecar fingerprint matches
    #[default]
    Fingerprint,
}

/// Hash of everything a compiled binary depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Fingerprint of a stage compilation input
    pub fn of_source(
        source: &str,
        compiler_version: &str,
        environment: TargetEnvironment,
        optimize: bool,
    ) -> Self {
        let mut hasher = FxHasher::default();
        source.hash(&mut hasher);
        compiler_version.hash(&mut hasher);
        environment.hash(&mut hasher);
        optimize.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Fingerprint of a retarget input (the portable binary it was decompiled from)
    pub fn of_binary(
        binary: &[u32],
        compiler_version: &str,
        environment: TargetEnvironment,
        optimize: bool,
    ) -> Self {
        let mut hasher = FxHasher::default();
        binary.hash(&mut hasher);
        compiler_version.hash(&mut hasher);
        environment.hash(&mut hasher);
        optimize.hash(&mut hasher);
        Self(hasher.finish())
    }

    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

/// Binary cache rooted at one directory
#[derive(Debug, Clone)]
pub struct ShaderCache {
    root: PathBuf,
    validation: CacheValidation,
}

impl ShaderCache {
    pub fn new(root: impl Into<PathBuf>, validation: CacheValidation) -> Self {
        Self { root: root.into(), validation }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn validation(&self) -> CacheValidation {
        self.validation
    }

    /// Directory holding every entry of one document
    pub fn document_dir(&self, base_name: &str) -> PathBuf {
        self.root.join(base_name)
    }

    /// Deterministic path of one entry
    pub fn entry_path(&self, base_name: &str, stage: ShaderStage, environment: TargetEnvironment) -> PathBuf {
        self.document_dir(base_name)
            .join(format!("{}.{}_shadercache", stage.name(), environment.cache_tag()))
    }

    fn fingerprint_path(entry: &Path) -> PathBuf {
        let mut path = entry.as_os_str().to_owned();
        path.push(".");
        path.push(FINGERPRINT_EXTENSION);
        PathBuf::from(path)
    }

    /// Load an entry, `None` on any miss
    ///
    /// A missing, unreadable, empty or truncated (size not a multiple of 4)
    /// file is a miss, as is a fingerprint mismatch in fingerprint mode.
    pub fn load(
        &self,
        base_name: &str,
        stage: ShaderStage,
        environment: TargetEnvironment,
        fingerprint: Fingerprint,
    ) -> Option<Vec<u32>> {
        let path = self.entry_path(base_name, stage, environment);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    engine_warn!("lumen::ShaderCache", "Could not read '{}': {}", path.display(), e);
                }
                return None;
            }
        };
        if bytes.is_empty() || bytes.len() % 4 != 0 {
            engine_warn!("lumen::ShaderCache", "Ignoring malformed cache entry '{}' ({} bytes)", path.display(), bytes.len());
            return None;
        }

        if self.validation == CacheValidation::Fingerprint {
            let stored = fs::read_to_string(Self::fingerprint_path(&path)).ok();
            if stored.as_deref().map(str::trim) != Some(fingerprint.to_hex().as_str()) {
                engine_debug!("lumen::ShaderCache", "Stale cache entry '{}'", path.display());
                return None;
            }
        }

        engine_trace!("lumen::ShaderCache", "Cache hit '{}'", path.display());
        Some(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Write an entry (and its fingerprint), creating directories as needed
    ///
    /// # Errors
    ///
    /// `Error::CacheIo` naming the path that could not be created or written.
    pub fn store(
        &self,
        base_name: &str,
        stage: ShaderStage,
        environment: TargetEnvironment,
        fingerprint: Fingerprint,
        binary: &[u32],
    ) -> Result<PathBuf> {
        let path = self.entry_path(base_name, stage, environment);
        let cache_io = |path: &Path, e: std::io::Error| Error::CacheIo {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let dir = self.document_dir(base_name);
        fs::create_dir_all(&dir).map_err(|e| cache_io(&dir, e))?;
        fs::write(&path, bytemuck::cast_slice::<u32, u8>(binary)).map_err(|e| cache_io(&path, e))?;

        let fingerprint_path = Self::fingerprint_path(&path);
        match self.validation {
            CacheValidation::Fingerprint => {
                fs::write(&fingerprint_path, fingerprint.to_hex()).map_err(|e| cache_io(&fingerprint_path, e))?;
            }
            CacheValidation::Existence => {
                // A sidecar left by fingerprint mode would no longer describe this entry
                let _ = fs::remove_file(&fingerprint_path);
            }
        }
        Ok(path)
    }

    /// Delete every entry of one document; returns whether anything was removed
    pub fn clear_document(&self, base_name: &str) -> Result<bool> {
        let dir = self.document_dir(base_name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                engine_debug!("lumen::ShaderCache", "Cleared cache directory '{}'", dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::CacheIo { path: dir, message: e.to_string() }),
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
