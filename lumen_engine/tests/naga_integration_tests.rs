//! Integration tests for the naga-backed pipeline
//!
//! Real GLSL -> SPIR-V compilation, SPIR-V -> GLSL retargeting and spirq
//! reflection. Runs on the HeadlessContext, no GPU required.
//!
//! Run with: cargo test --test naga_integration_tests

mod pipeline_test_utils;

use std::fs;
use std::sync::Arc;

use lumen_engine::lumen::graphics::GraphicsContext;
use lumen_engine::lumen::shader::{
    CacheValidation, CompileRequest, IntermediateCompiler, LinkState, NagaCompiler, Reflector,
    ResourceKind, ShaderCache, ShaderCompiler, ShaderDocument, ShaderPipeline, ShaderStage,
    TargetEnvironment,
};
use lumen_engine::lumen::Error;
use pipeline_test_utils::{config_with_cache, headless_context, temp_dir};

const PASS_THROUGH: &str = r#"#type vertex
#version 450
layout(location = 0) in vec3 a_Position;

void main() {
    gl_Position = vec4(a_Position, 1.0);
}

#type fragment
#version 450
layout(location = 0) out vec4 o_Color;

void main() {
    o_Color = vec4(1.0, 0.5, 0.25, 1.0);
}
"#;

const TEXTURED: &str = r#"#type vertex
#version 450
layout(location = 0) in vec3 a_Position;
layout(location = 1) in vec2 a_TexCoord;

layout(std140, set = 0, binding = 0) uniform Camera {
    mat4 u_ViewProjection;
} u_Camera;

layout(location = 0) out vec2 v_TexCoord;

void main() {
    v_TexCoord = a_TexCoord;
    gl_Position = u_Camera.u_ViewProjection * vec4(a_Position, 1.0);
}

#type fragment
#version 450
layout(location = 0) in vec2 v_TexCoord;
layout(location = 0) out vec4 o_Color;

layout(set = 1, binding = 0) uniform texture2D u_Texture;
layout(set = 1, binding = 1) uniform sampler u_Sampler;

void main() {
    o_Color = texture(sampler2D(u_Texture, u_Sampler), v_TexCoord);
}
"#;

const CAMERA_VERTEX: &str = r#"#version 450
layout(location = 0) in vec3 a_Position;

layout(std140, set = 0, binding = 0) uniform Camera {
    mat4 u_ViewProjection;
} u_Camera;

void main() {
    gl_Position = u_Camera.u_ViewProjection * vec4(a_Position, 1.0);
}
"#;

fn compile_camera(compiler: &NagaCompiler) -> Vec<u32> {
    let request = CompileRequest {
        document: "Camera.glsl",
        stage: ShaderStage::Vertex,
        source: CAMERA_VERTEX,
        environment: TargetEnvironment::PortableCompute,
        optimize: true,
    };
    compiler.compile(&request).unwrap()
}

// ============================================================================
// RETARGET + LINK
// ============================================================================

#[test]
fn test_pass_through_retargets_and_links() {
    let root = temp_dir("naga_pass_through");
    let (headless, shared) = headless_context();
    let mut pipeline = ShaderPipeline::with_naga(shared, &config_with_cache(root.clone()));

    let shader = pipeline.build(&ShaderDocument::new("PassThrough.glsl", PASS_THROUGH)).unwrap();

    assert_eq!(pipeline.linker().last_state(), Some(LinkState::Linked));
    let native = shader.native().unwrap();
    for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
        let recovered = native.recovered_source(stage).unwrap();
        assert!(recovered.contains("void main()"), "{} source:\n{}", stage, recovered);
        assert_eq!(native.binaries().get(stage).unwrap()[0], 0x0723_0203);
    }

    let ctx = headless.lock().unwrap();
    let program = shader.program().handle();
    assert!(ctx.program_linked(program).unwrap());
    assert!(ctx.program_info_log(program).unwrap().is_empty());
    drop(ctx);

    drop(shader);
    fs::remove_dir_all(&root).unwrap();
}

fn layout_of(stage: ShaderStage, binary: &[u32]) -> Vec<(ResourceKind, u32, u32)> {
    let mut layout: Vec<_> = Reflector::reflect(stage, binary)
        .unwrap()
        .into_iter()
        .map(|resource| (resource.kind, resource.set, resource.binding))
        .collect();
    layout.sort_by_key(|&(_, set, binding)| (set, binding));
    layout
}

#[test]
fn test_uniform_block_and_texture_retarget_and_link() {
    let root = temp_dir("naga_textured");
    let (headless, shared) = headless_context();
    let mut pipeline = ShaderPipeline::with_naga(shared, &config_with_cache(root.clone()));

    let shader = pipeline.build(&ShaderDocument::new("Textured.glsl", TEXTURED)).unwrap();

    let vertex: Vec<_> = shader.resources(ShaderStage::Vertex).iter().map(|r| r.kind).collect();
    assert_eq!(vertex, vec![ResourceKind::UniformBuffer]);
    let expected_fragment = vec![(ResourceKind::SampledImage, 1, 0), (ResourceKind::Sampler, 1, 1)];

    let portable = shader.portable_binaries().unwrap();
    let native = shader.native().unwrap();
    assert_eq!(layout_of(ShaderStage::Fragment, portable.get(ShaderStage::Fragment).unwrap()), expected_fragment);
    assert_eq!(
        layout_of(ShaderStage::Fragment, native.binaries().get(ShaderStage::Fragment).unwrap()),
        expected_fragment
    );
    assert_eq!(
        layout_of(ShaderStage::Vertex, native.binaries().get(ShaderStage::Vertex).unwrap()),
        vec![(ResourceKind::UniformBuffer, 0, 0)]
    );
    assert!(native.recovered_source(ShaderStage::Fragment).unwrap().contains("sampler2D("));

    assert!(headless.lock().unwrap().program_linked(shader.program().handle()).unwrap());

    // Served from the cache the second time
    let again = pipeline.build(&ShaderDocument::new("Textured.glsl", TEXTURED)).unwrap();
    assert_eq!(again.native().unwrap().binaries(), native.binaries());

    drop((shader, again));
    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_invalid_glsl_reports_diagnostic() {
    let root = temp_dir("naga_invalid");
    let (headless, shared) = headless_context();
    let mut pipeline = ShaderPipeline::with_naga(shared, &config_with_cache(root.clone()));
    let document = ShaderDocument::new(
        "Broken.glsl",
        "#type vertex\n#version 450\nvoid main() { gl_Position = undefined_symbol; }\n#type fragment\n#version 450\nvoid main() {}",
    );

    match pipeline.build(&document) {
        Err(Error::ShaderCompile { document, stage, diagnostic }) => {
            assert_eq!(document, "Broken.glsl");
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(!diagnostic.is_empty());
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(headless.lock().unwrap().live_resources().total(), 0);

    let _ = fs::remove_dir_all(&root);
}

// ============================================================================
// REFLECTION
// ============================================================================

#[test]
fn test_reflect_uniform_block() {
    let binary = compile_camera(&NagaCompiler::new());

    let resources = Reflector::reflect(ShaderStage::Vertex, &binary).unwrap();

    let uniform_buffers: Vec<_> = resources
        .iter()
        .filter(|resource| resource.kind == ResourceKind::UniformBuffer)
        .collect();
    assert_eq!(uniform_buffers.len(), 1);
    let camera = uniform_buffers[0];
    assert_eq!((camera.set, camera.binding), (0, 0));
    assert_eq!(camera.size, 64);
    assert_eq!(camera.member_count, 1);
}

#[test]
fn test_rebuilt_binary_reflects_identically() {
    let root = temp_dir("naga_rebuild");
    let intermediate = IntermediateCompiler::new(
        Arc::new(NagaCompiler::new()),
        ShaderCache::new(&root, CacheValidation::Fingerprint),
    );
    let document = ShaderDocument::new("Camera.glsl", CAMERA_VERTEX);
    let portable = TargetEnvironment::PortableCompute;

    let before = intermediate
        .compile_or_fetch(&document, ShaderStage::Vertex, CAMERA_VERTEX, portable)
        .unwrap();
    assert!(intermediate.cache().clear_document(&document.base_name()).unwrap());
    let after = intermediate
        .compile_or_fetch(&document, ShaderStage::Vertex, CAMERA_VERTEX, portable)
        .unwrap();

    assert_eq!(
        Reflector::reflect(ShaderStage::Vertex, &before).unwrap(),
        Reflector::reflect(ShaderStage::Vertex, &after).unwrap()
    );

    fs::remove_dir_all(&root).unwrap();
}
