//! Unit tests for reflect.rs
//!
//! Reflection of real SPIR-V produced by naga is covered by
//! tests/naga_integration_tests.rs.

use crate::error::Error;
use crate::shader::{Reflector, ResourceDescriptor, ResourceKind, ShaderStage};

#[test]
fn test_reflect_empty_binary_fails() {
    match Reflector::reflect(ShaderStage::Vertex, &[]) {
        Err(Error::Reflection { stage, message }) => {
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(message.contains("empty"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_reflect_malformed_binary_fails() {
    let result = Reflector::reflect(ShaderStage::Fragment, &[2]);
    assert!(matches!(result, Err(Error::Reflection { stage: ShaderStage::Fragment, .. })));
}

#[test]
fn test_reflect_or_empty_degrades_to_empty_listing() {
    assert!(Reflector::reflect_or_empty(ShaderStage::Vertex, &[2]).is_empty());
    assert!(Reflector::reflect_or_empty(ShaderStage::Vertex, &[0xdead_beef, 1, 2, 3, 4, 5]).is_empty());
}

#[test]
fn test_log_resources_accepts_any_listing() {
    let camera = ResourceDescriptor {
        name: "Camera".to_string(),
        kind: ResourceKind::UniformBuffer,
        size: 64,
        set: 0,
        binding: 0,
        member_count: 1,
        members: vec!["u_ViewProjection".to_string()],
    };
    let texture = ResourceDescriptor {
        name: "u_Texture".to_string(),
        kind: ResourceKind::SampledImage,
        size: 0,
        set: 0,
        binding: 1,
        member_count: 0,
        members: Vec::new(),
    };

    Reflector::log_resources(ShaderStage::Fragment, &[camera, texture]);
    Reflector::log_resources(ShaderStage::Vertex, &[]);
}
