/// Shader stages and compilation target environments

use std::fmt;

/// Shader stage declared by a `#type` block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    Compute,
}

impl ShaderStage {
    /// Every stage, in pipeline order
    pub const ALL: [ShaderStage; 4] = [
        ShaderStage::Vertex,
        ShaderStage::Fragment,
        ShaderStage::Geometry,
        ShaderStage::Compute,
    ];

    /// Parse a `#type` stage name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(ShaderStage::Vertex),
            "fragment" => Some(ShaderStage::Fragment),
            "geometry" => Some(ShaderStage::Geometry),
            "compute" => Some(ShaderStage::Compute),
            _ => None,
        }
    }

    /// Name used in `#type` markers and cache file names
    pub fn name(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Compute => "compute",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compilation target profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetEnvironment {
    /// Portable intermediate form (Vulkan-style, 1.2)
    PortableCompute,
    /// Native display-driver form (OpenGL-style, 4.5)
    NativeDisplay,
}

impl TargetEnvironment {
    /// Tag used in cache file extensions (`<stage>.<tag>_shadercache`)
    pub fn cache_tag(&self) -> &'static str {
        match self {
            TargetEnvironment::PortableCompute => "vulkan",
            TargetEnvironment::NativeDisplay => "opengl",
        }
    }

    /// Target API version (major, minor)
    pub fn version(&self) -> (u32, u32) {
        match self {
            TargetEnvironment::PortableCompute => (1, 2),
            TargetEnvironment::NativeDisplay => (4, 5),
        }
    }

    /// Portable binaries are optimized; the native retarget favours fidelity
    pub fn optimize(&self) -> bool {
        matches!(self, TargetEnvironment::PortableCompute)
    }
}

impl fmt::Display for TargetEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = self.version();
        write!(f, "{} {}.{}", self.cache_tag(), major, minor)
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
