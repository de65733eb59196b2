/// ShaderCompiler trait - source to intermediate binary and back
///
/// `NagaCompiler` is the production implementation: naga's GLSL front-end and
/// SPIR-V back-end for compilation, SPIR-V front-end and GLSL back-end for
/// decompilation.
///
/// Sources use the Vulkan GLSL dialect: every resource has an explicit
/// `layout(set = S, binding = B)` and textures are declared separately from
/// their samplers (`texture2D` + `sampler`, combined at the use site with
/// `sampler2D(tex, smp)`). Decompiled sources are written back in that same
/// dialect so they can be compiled again.

use naga::back::{glsl, spv};
use naga::front::glsl as glsl_in;
use naga::front::spv as spv_in;
use naga::proc::{BoundsCheckPolicies, BoundsCheckPolicy};
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use naga::{ImageClass, ImageDimension, ScalarKind, TypeInner};
use rustc_hash::FxHashMap;

use crate::shader::{ShaderStage, TargetEnvironment};

/// Entry point every stage is compiled with
pub const ENTRY_POINT: &str = "main";

/// Input of one stage compilation
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Identity of the document the stage comes from (for diagnostics)
    pub document: &'a str,
    pub stage: ShaderStage,
    pub source: &'a str,
    pub environment: TargetEnvironment,
    /// Performance optimization enabled
    pub optimize: bool,
}

/// Compiler seam used by the intermediate and cross compilers
///
/// Errors are the compiler's diagnostic text; callers wrap them with the
/// document and stage.
pub trait ShaderCompiler: Send + Sync {
    /// Identifier mixed into cache fingerprints
    fn version(&self) -> &str;

    /// Compile one stage to a word sequence
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u32>, String>;

    /// Recover source text from a binary, for recompilation under `target`
    fn decompile(&self, stage: ShaderStage, binary: &[u32], target: TargetEnvironment) -> Result<String, String>;
}

// ============================================================================
// NagaCompiler
// ============================================================================

/// GLSL <-> SPIR-V compiler backed by naga
#[derive(Debug, Default, Clone, Copy)]
pub struct NagaCompiler;

impl NagaCompiler {
    pub fn new() -> Self {
        Self
    }

    fn naga_stage(stage: ShaderStage) -> Result<naga::ShaderStage, String> {
        match stage {
            ShaderStage::Vertex => Ok(naga::ShaderStage::Vertex),
            ShaderStage::Fragment => Ok(naga::ShaderStage::Fragment),
            ShaderStage::Compute => Ok(naga::ShaderStage::Compute),
            ShaderStage::Geometry => Err("geometry shaders are not supported by the naga compiler".to_string()),
        }
    }

    fn validate(module: &naga::Module, source: &str) -> Result<ModuleInfo, String> {
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(module)
            .map_err(|e| e.emit_to_string(source))
    }
}

impl ShaderCompiler for NagaCompiler {
    fn version(&self) -> &str {
        "naga-24"
    }

    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u32>, String> {
        let stage = Self::naga_stage(request.stage)?;

        let module = glsl_in::Frontend::default()
            .parse(&glsl_in::Options::from(stage), request.source)
            .map_err(|e| e.emit_to_string(request.source))?;
        let info = Self::validate(&module, request.source)?;

        let mut options = spv::Options {
            lang_version: match request.environment {
                TargetEnvironment::PortableCompute => (1, 5),
                TargetEnvironment::NativeDisplay => (1, 0),
            },
            ..spv::Options::default()
        };
        // Names are kept so reflection can report them
        options.flags.insert(spv::WriterFlags::DEBUG);
        if request.optimize {
            options.bounds_check_policies = BoundsCheckPolicies {
                index: BoundsCheckPolicy::Unchecked,
                buffer: BoundsCheckPolicy::Unchecked,
                ..BoundsCheckPolicies::default()
            };
        }

        let pipeline = spv::PipelineOptions {
            shader_stage: stage,
            entry_point: ENTRY_POINT.to_string(),
        };
        spv::write_vec(&module, &info, &options, Some(&pipeline)).map_err(|e| e.to_string())
    }

    fn decompile(&self, stage: ShaderStage, binary: &[u32], _target: TargetEnvironment) -> Result<String, String> {
        let naga_stage = Self::naga_stage(stage)?;

        let options = spv_in::Options {
            adjust_coordinate_space: false,
            ..spv_in::Options::default()
        };
        let module = spv_in::parse_u8_slice(bytemuck::cast_slice(binary), &options).map_err(|e| e.to_string())?;
        let info = Self::validate(&module, "")?;

        let options = glsl::Options {
            version: glsl::Version::Desktop(450),
            writer_flags: glsl::WriterFlags::empty(),
            binding_map: binding_map(&module)?,
            ..glsl::Options::default()
        };
        let pipeline = glsl::PipelineOptions {
            shader_stage: naga_stage,
            entry_point: ENTRY_POINT.to_string(),
            multiview: None,
        };

        let mut source = String::new();
        let mut writer = glsl::Writer::new(
            &mut source,
            &module,
            &info,
            &options,
            &pipeline,
            BoundsCheckPolicies::default(),
        )
        .map_err(|e| e.to_string())?;
        let reflection = writer.write().map_err(|e| e.to_string())?;
        restore_vulkan_layout(&source, &module, &reflection)
    }
}

// ============================================================================
// Recovered source layout
// ============================================================================

/// GL binding of every bound global: the descriptor binding, set dropped
///
/// Sets are restored by `restore_vulkan_layout`.
fn binding_map(module: &naga::Module) -> Result<glsl::BindingMap, String> {
    let mut map = glsl::BindingMap::new();
    for (_, global) in module.global_variables.iter() {
        if let Some(binding) = &global.binding {
            let slot = u8::try_from(binding.binding)
                .map_err(|_| format!("binding {} does not fit a GL binding slot", binding.binding))?;
            map.insert(binding.clone(), slot);
        }
    }
    Ok(map)
}

/// GLSL type of a separate texture and the constructor combining it with a sampler
fn sampled_type_names(dim: ImageDimension, arrayed: bool, class: ImageClass) -> Option<(String, String)> {
    let (kind, multi, shadow) = match class {
        ImageClass::Sampled { kind, multi } => (kind, multi, false),
        ImageClass::Depth { multi } => (ScalarKind::Float, multi, !multi),
        ImageClass::Storage { .. } => return None,
    };
    let prefix = match kind {
        ScalarKind::Sint => "i",
        ScalarKind::Uint => "u",
        _ => "",
    };
    let dim = match dim {
        ImageDimension::D1 => "1D",
        ImageDimension::D2 => "2D",
        ImageDimension::D3 => "3D",
        ImageDimension::Cube => "Cube",
    };
    let suffix = format!("{}{}{}", dim, if multi { "MS" } else { "" }, if arrayed { "Array" } else { "" });
    Some((
        format!("{}texture{}", prefix, suffix),
        format!("{}sampler{}{}", prefix, suffix, if shadow { "Shadow" } else { "" }),
    ))
}

/// Rewrite naga's GL-flavoured output into compilable Vulkan GLSL
///
/// Combined `samplerXX` globals are split back into their texture and sampler
/// with the original set and binding, and uses become `samplerXX(tex, smp)`.
/// Blocks outside set 0 get their `set` qualifier back.
fn restore_vulkan_layout(
    source: &str,
    module: &naga::Module,
    reflection: &glsl::ReflectionInfo,
) -> Result<String, String> {
    let mut declarations: FxHashMap<&str, String> = FxHashMap::default();
    let mut uses: FxHashMap<String, String> = FxHashMap::default();

    for (name, mapping) in &reflection.texture_mapping {
        let texture = &module.global_variables[mapping.texture];
        let TypeInner::Image { dim, arrayed, class } = module.types[texture.ty].inner else {
            continue;
        };
        let Some((texture_type, combined_type)) = sampled_type_names(dim, arrayed, class) else {
            continue;
        };
        let binding = texture
            .binding
            .as_ref()
            .ok_or_else(|| format!("texture '{}' has no binding", name))?;

        let texture_name = format!("{}_texture", name);
        let mut declaration = format!(
            "layout(set = {}, binding = {}) uniform {} {};",
            binding.group, binding.binding, texture_type, texture_name
        );
        let expression = match mapping.sampler {
            Some(handle) => {
                let sampler = &module.global_variables[handle];
                let sampler_binding = sampler
                    .binding
                    .as_ref()
                    .ok_or_else(|| format!("sampler of '{}' has no binding", name))?;
                let sampler_type = match module.types[sampler.ty].inner {
                    TypeInner::Sampler { comparison: true } => "samplerShadow",
                    _ => "sampler",
                };
                let sampler_name = format!("{}_sampler", name);
                declaration.push_str(&format!(
                    "\nlayout(set = {}, binding = {}) uniform {} {};",
                    sampler_binding.group, sampler_binding.binding, sampler_type, sampler_name
                ));
                format!("{}({}, {})", combined_type, texture_name, sampler_name)
            }
            None => texture_name,
        };
        declarations.insert(name.as_str(), declaration);
        uses.insert(name.clone(), expression);
    }

    let mut block_sets: Vec<(&str, u32)> = Vec::new();
    for (handle, block_name) in &reflection.uniforms {
        if let Some(binding) = &module.global_variables[*handle].binding {
            if binding.group != 0 {
                block_sets.push((block_name.as_str(), binding.group));
            }
        }
    }

    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        let declared = declarations.iter().find(|(name, _)| {
            trimmed.contains("uniform ") && trimmed.ends_with(&format!(" {};", name))
        });
        if let Some((_, declaration)) = declared {
            out.push_str(declaration);
        } else if let Some((_, set)) = block_sets
            .iter()
            .find(|(block, _)| trimmed.starts_with("layout(") && contains_identifier(trimmed, block))
        {
            out.push_str(&line.replacen("layout(", &format!("layout(set = {}, ", set), 1));
        } else {
            out.push_str(&replace_identifiers(line, &uses));
        }
        out.push('\n');
    }
    Ok(out)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn contains_identifier(line: &str, identifier: &str) -> bool {
    line.split(|c: char| !is_identifier_char(c)).any(|word| word == identifier)
}

/// Replace whole identifiers found in `replacements`
fn replace_identifiers(line: &str, replacements: &FxHashMap<String, String>) -> String {
    if replacements.is_empty() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find(is_identifier_char) {
        out.push_str(&rest[..start]);
        let word_len = rest[start..].find(|c: char| !is_identifier_char(c)).unwrap_or(rest.len() - start);
        let word = &rest[start..start + word_len];
        out.push_str(replacements.get(word).map(String::as_str).unwrap_or(word));
        rest = &rest[start + word_len..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
