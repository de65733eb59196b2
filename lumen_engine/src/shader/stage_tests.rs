//! Unit tests for stage.rs

use crate::shader::{ShaderStage, TargetEnvironment};

#[test]
fn test_stage_names_round_trip() {
    for stage in ShaderStage::ALL {
        assert_eq!(ShaderStage::from_name(stage.name()), Some(stage));
    }
}

#[test]
fn test_unknown_stage_name() {
    assert_eq!(ShaderStage::from_name("pixel"), None);
    assert_eq!(ShaderStage::from_name("Vertex"), None);
    assert_eq!(ShaderStage::from_name(""), None);
}

#[test]
fn test_stage_display() {
    assert_eq!(format!("{}", ShaderStage::Fragment), "fragment");
}

#[test]
fn test_environment_tags_and_versions() {
    assert_eq!(TargetEnvironment::PortableCompute.cache_tag(), "vulkan");
    assert_eq!(TargetEnvironment::NativeDisplay.cache_tag(), "opengl");
    assert_eq!(TargetEnvironment::PortableCompute.version(), (1, 2));
    assert_eq!(TargetEnvironment::NativeDisplay.version(), (4, 5));
    assert_eq!(format!("{}", TargetEnvironment::NativeDisplay), "opengl 4.5");
}

#[test]
fn test_only_portable_target_is_optimized() {
    assert!(TargetEnvironment::PortableCompute.optimize());
    assert!(!TargetEnvironment::NativeDisplay.optimize());
}
