/// ShaderLibrary - name-keyed registry of built shaders

use std::collections::hash_map::Entry;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::{engine_bail, engine_debug};
use crate::shader::{Shader, ShaderPipeline};

/// Owns shaders by name; removing a shader hands ownership back to the caller
#[derive(Default)]
pub struct ShaderLibrary {
    shaders: FxHashMap<String, Shader>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shader under its own name
    pub fn add(&mut self, shader: Shader) -> Result<()> {
        let name = shader.name().to_string();
        self.add_named(name, shader)
    }

    /// Register a shader under an explicit name
    ///
    /// # Errors
    ///
    /// Fails if the name is already taken; the existing shader is kept.
    pub fn add_named(&mut self, name: impl Into<String>, shader: Shader) -> Result<()> {
        let name = name.into();
        if self.shaders.contains_key(&name) {
            engine_bail!("lumen::ShaderLibrary", "Shader '{}' already exists", name);
        }
        engine_debug!("lumen::ShaderLibrary", "Added shader '{}'", name);
        self.shaders.insert(name, shader);
        Ok(())
    }

    /// Build a shader from a file and register it under its file stem
    pub fn load(&mut self, pipeline: &mut ShaderPipeline, path: impl AsRef<Path>) -> Result<&mut Shader> {
        let shader = pipeline.load(path)?;
        match self.shaders.entry(shader.name().to_string()) {
            Entry::Occupied(entry) => {
                engine_bail!("lumen::ShaderLibrary", "Shader '{}' already exists", entry.key())
            }
            Entry::Vacant(entry) => {
                engine_debug!("lumen::ShaderLibrary", "Loaded shader '{}'", entry.key());
                Ok(entry.insert(shader))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Shader> {
        self.shaders.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Shader> {
        self.shaders.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Shader> {
        self.shaders.remove(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shaders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
