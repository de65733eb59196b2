//! Unit tests for intermediate.rs
//!
//! Uses the EchoLengthCompiler stub: a binary is the source length as one word.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Error;
use crate::shader::stub_compiler::EchoLengthCompiler;
use crate::shader::{
    split_stages, CacheValidation, IntermediateCompiler, ShaderCache, ShaderDocument, ShaderStage,
    TargetEnvironment,
};

const PORTABLE: TargetEnvironment = TargetEnvironment::PortableCompute;
const NATIVE: TargetEnvironment = TargetEnvironment::NativeDisplay;

fn temp_root(test: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("lumen_intermediate_{}_{}", test, std::process::id()));
    let _ = fs::remove_dir_all(&root);
    root
}

fn setup(test: &str, validation: CacheValidation) -> (PathBuf, Arc<EchoLengthCompiler>, IntermediateCompiler) {
    let root = temp_root(test);
    let stub = Arc::new(EchoLengthCompiler::default());
    let compiler = IntermediateCompiler::new(stub.clone(), ShaderCache::new(&root, validation));
    (root, stub, compiler)
}

fn document() -> ShaderDocument {
    ShaderDocument::new("assets/shaders/Flat.glsl", "#type vertex\nVS\n#type fragment\nFS")
}

// ============================================================================
// COMPILE OR FETCH
// ============================================================================

#[test]
fn test_compile_or_fetch_compiles_once() {
    let (root, stub, compiler) = setup("once", CacheValidation::Fingerprint);
    let doc = document();

    let first = compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS", PORTABLE).unwrap();
    let second = compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS", PORTABLE).unwrap();

    assert_eq!(first, vec![2]);
    assert_eq!(first, second);
    assert_eq!(stub.compile_count(), 1);
    assert!(root.join("Flat/vertex.vulkan_shadercache").exists());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_environments_have_separate_entries() {
    let (root, stub, compiler) = setup("environments", CacheValidation::Fingerprint);
    let doc = document();

    compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS", PORTABLE).unwrap();
    compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS", NATIVE).unwrap();

    assert_eq!(stub.compile_count(), 2);
    assert!(root.join("Flat/vertex.vulkan_shadercache").exists());
    assert!(root.join("Flat/vertex.opengl_shadercache").exists());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_compile_failure_carries_document_and_stage() {
    let (root, _stub, compiler) = setup("failure", CacheValidation::Fingerprint);

    let result = compiler.compile_or_fetch(&document(), ShaderStage::Fragment, "SYNTAX_ERROR", PORTABLE);
    match result {
        Err(Error::ShaderCompile { document, stage, diagnostic }) => {
            assert_eq!(document, "assets/shaders/Flat.glsl");
            assert_eq!(stage, ShaderStage::Fragment);
            assert!(diagnostic.contains("syntax error"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!root.join("Flat/fragment.vulkan_shadercache").exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn test_cache_write_failure_still_returns_binary() {
    let (root, _stub, compiler) = setup("write_failure", CacheValidation::Fingerprint);
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("Flat"), b"blocks the document directory").unwrap();

    let binary = compiler.compile_or_fetch(&document(), ShaderStage::Vertex, "VS", PORTABLE).unwrap();
    assert_eq!(binary, vec![2]);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_changed_source_recompiles_with_fingerprints() {
    let (root, stub, compiler) = setup("changed_fingerprint", CacheValidation::Fingerprint);
    let doc = document();

    compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS", PORTABLE).unwrap();
    let updated = compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS v2", PORTABLE).unwrap();

    assert_eq!(updated, vec![5]);
    assert_eq!(stub.compile_count(), 2);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_changed_source_served_stale_in_existence_mode() {
    let (root, stub, compiler) = setup("changed_existence", CacheValidation::Existence);
    let doc = document();

    compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS", PORTABLE).unwrap();
    let stale = compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS v2", PORTABLE).unwrap();

    assert_eq!(stale, vec![2]);
    assert_eq!(stub.compile_count(), 1);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_deleted_entry_is_rebuilt_identically() {
    let (root, stub, compiler) = setup("rebuild", CacheValidation::Fingerprint);
    let doc = document();

    let before = compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS", PORTABLE).unwrap();
    assert!(compiler.cache().clear_document(&doc.base_name()).unwrap());
    let after = compiler.compile_or_fetch(&doc, ShaderStage::Vertex, "VS", PORTABLE).unwrap();

    assert_eq!(before, after);
    assert_eq!(stub.compile_count(), 2);

    fs::remove_dir_all(&root).unwrap();
}

// ============================================================================
// COMPILE ALL
// ============================================================================

#[test]
fn test_compile_all_echoes_lengths() {
    let (root, _stub, compiler) = setup("all", CacheValidation::Fingerprint);
    let doc = document();
    let sources = split_stages(&doc).unwrap();

    let binaries = compiler.compile_all(&doc, &sources, PORTABLE).unwrap();

    assert_eq!(binaries.len(), 2);
    assert_eq!(binaries.get(ShaderStage::Vertex), Some(&[2u32][..]));
    assert_eq!(binaries.get(ShaderStage::Fragment), Some(&[2u32][..]));
    assert_eq!(binaries.stages().collect::<Vec<_>>(), vec![ShaderStage::Vertex, ShaderStage::Fragment]);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_compile_all_stops_at_first_failure() {
    let (root, stub, compiler) = setup("all_failure", CacheValidation::Fingerprint);
    let doc = ShaderDocument::new("Broken.glsl", "#type vertex\nSYNTAX_ERROR\n#type fragment\nFS");
    let sources = split_stages(&doc).unwrap();

    let result = compiler.compile_all(&doc, &sources, PORTABLE);

    assert!(matches!(result, Err(Error::ShaderCompile { stage: ShaderStage::Vertex, .. })));
    assert_eq!(stub.compile_count(), 1);

    let _ = fs::remove_dir_all(&root);
}
