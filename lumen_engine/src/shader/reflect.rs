/// Reflector - resource-binding introspection of SPIR-V binaries (spirq)
///
/// Read-only: reflection never touches caches. A binary that cannot be parsed
/// is an `Error::Reflection`, which callers treat as non-fatal.

use crate::error::{Error, Result};
use crate::{engine_debug, engine_trace, engine_warn};
use crate::shader::ShaderStage;

/// Kind of a reflected resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    UniformBuffer,
    StorageBuffer,
    SampledImage,
    Sampler,
    PushConstant,
}

/// One resource declared by a binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub name: String,
    pub kind: ResourceKind,
    /// Byte size (0 when not statically known, e.g. images or runtime arrays)
    pub size: usize,
    /// Descriptor set (0 for push constants)
    pub set: u32,
    /// Binding slot (0 for push constants)
    pub binding: u32,
    /// Number of struct members
    pub member_count: usize,
    /// Struct member names, in declaration order
    pub members: Vec<String>,
}

/// Stateless reflection entry points
pub struct Reflector;

impl Reflector {
    /// List the resources declared by a binary
    pub fn reflect(stage: ShaderStage, binary: &[u32]) -> Result<Vec<ResourceDescriptor>> {
        if binary.is_empty() {
            return Err(Error::Reflection { stage, message: "empty binary".to_string() });
        }
        let entry_points = spirq::ReflectConfig::new()
            .spv(binary)
            .ref_all_rscs(true)
            .reflect()
            .map_err(|e| Error::Reflection { stage, message: format!("{:?}", e) })?;

        let mut resources: Vec<ResourceDescriptor> = Vec::new();
        for entry_point in &entry_points {
            for var in entry_point.vars.iter() {
                let descriptor = match var {
                    spirq::var::Variable::Descriptor { name, desc_bind, desc_ty, ty, .. } => {
                        let Some(kind) = Self::descriptor_kind(desc_ty) else {
                            engine_trace!("lumen::Reflector", "Skipping descriptor {:?} of type {:?}", name, desc_ty);
                            continue;
                        };
                        let members = Self::member_names(ty);
                        ResourceDescriptor {
                            name: Self::resource_name(name.as_deref(), ty),
                            kind,
                            size: ty.nbyte().unwrap_or(0),
                            set: desc_bind.set(),
                            binding: desc_bind.bind(),
                            member_count: members.len(),
                            members,
                        }
                    }
                    spirq::var::Variable::PushConstant { name, ty } => {
                        let members = Self::member_names(ty);
                        ResourceDescriptor {
                            name: Self::resource_name(name.as_deref(), ty),
                            kind: ResourceKind::PushConstant,
                            size: ty.nbyte().unwrap_or(0),
                            set: 0,
                            binding: 0,
                            member_count: members.len(),
                            members,
                        }
                    }
                    _ => continue,
                };
                // Several entry points may share a resource
                if !resources.contains(&descriptor) {
                    resources.push(descriptor);
                }
            }
        }
        Ok(resources)
    }

    /// Like `reflect`, but a failure is logged and yields an empty listing
    pub fn reflect_or_empty(stage: ShaderStage, binary: &[u32]) -> Vec<ResourceDescriptor> {
        Self::reflect(stage, binary).unwrap_or_else(|e| {
            engine_warn!("lumen::Reflector", "{}", e);
            Vec::new()
        })
    }

    /// Log the uniform buffers of one stage at debug level
    pub fn log_resources(stage: ShaderStage, resources: &[ResourceDescriptor]) {
        let uniform_buffers: Vec<&ResourceDescriptor> = resources
            .iter()
            .filter(|resource| resource.kind == ResourceKind::UniformBuffer)
            .collect();

        engine_debug!("lumen::Reflector", "Reflect {} stage: {} uniform buffers, {} resources", stage, uniform_buffers.len(), resources.len());
        for resource in uniform_buffers {
            engine_debug!(
                "lumen::Reflector",
                "  {}: size = {}, binding = {}, members = {}",
                resource.name, resource.size, resource.binding, resource.member_count
            );
        }
    }

    fn descriptor_kind(desc_ty: &spirq::ty::DescriptorType) -> Option<ResourceKind> {
        use spirq::ty::DescriptorType;
        match desc_ty {
            DescriptorType::UniformBuffer() => Some(ResourceKind::UniformBuffer),
            DescriptorType::StorageBuffer(..) => Some(ResourceKind::StorageBuffer),
            DescriptorType::CombinedImageSampler() | DescriptorType::SampledImage() => {
                Some(ResourceKind::SampledImage)
            }
            DescriptorType::Sampler() => Some(ResourceKind::Sampler),
            _ => None,
        }
    }

    /// Variable name, falling back to the block type name for anonymous blocks
    fn resource_name(name: Option<&str>, ty: &spirq::ty::Type) -> String {
        let block_name = match ty {
            spirq::ty::Type::Struct(st) => st.name.as_deref(),
            _ => None,
        };
        name.filter(|name| !name.is_empty())
            .or(block_name)
            .unwrap_or_default()
            .to_string()
    }

    fn member_names(ty: &spirq::ty::Type) -> Vec<String> {
        if let spirq::ty::Type::Struct(st) = ty {
            st.members
                .iter()
                .map(|member| member.name.clone().unwrap_or_default())
                .collect()
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "reflect_tests.rs"]
mod tests;
