//! Integration tests for the logging hub
//!
//! Checks that pipeline components report through the installed logger, with
//! their component source and the documented severities. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

mod pipeline_test_utils;

use std::fs;
use std::sync::{Arc, Mutex};

use lumen_engine::lumen::log::{LogEntry, LogSeverity, Logger};
use lumen_engine::lumen::shader::{ShaderDocument, ShaderPipeline};
use lumen_engine::lumen::{Engine, UniformPolicy};
use pipeline_test_utils::{config_with_cache, headless_context, temp_dir, EchoLengthCompiler};
use serial_test::serial;

// ============================================================================
// CAPTURING LOGGER
// ============================================================================

/// Logger that keeps every entry for inspection
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    fn install() -> Arc<Mutex<Vec<LogEntry>>> {
        let entries = Arc::new(Mutex::new(Vec::new()));
        Engine::set_logger(Self { entries: entries.clone() });
        entries
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn from_source(entries: &Arc<Mutex<Vec<LogEntry>>>, source: &str) -> Vec<LogEntry> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|entry| entry.source == source)
        .cloned()
        .collect()
}

// ============================================================================
// PIPELINE DIAGNOSTICS
// ============================================================================

#[test]
#[serial]
fn test_build_reports_ready_shader_at_info() {
    let root = temp_dir("log_ready");
    let entries = CaptureLogger::install();
    let (_headless, shared) = headless_context();
    let mut pipeline = ShaderPipeline::new(shared, Arc::new(EchoLengthCompiler::default()), &config_with_cache(root.clone()));

    let shader = pipeline.build(&ShaderDocument::new("Flat.glsl", "#type vertex\nVS\n#type fragment\nFS")).unwrap();

    let ready = from_source(&entries, "lumen::ShaderPipeline");
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].severity, LogSeverity::Info);
    assert!(ready[0].message.starts_with("Shader 'Flat' ready"));
    // The stub binaries cannot be reflected: reported, not fatal
    let reflector = from_source(&entries, "lumen::Reflector");
    assert!(reflector.iter().any(|entry| entry.severity == LogSeverity::Warn));

    drop(shader);
    Engine::reset_logger();
    fs::remove_dir_all(&root).unwrap();
}

#[test]
#[serial]
fn test_compile_failure_logged_with_location() {
    let root = temp_dir("log_compile_failure");
    let entries = CaptureLogger::install();
    let (_headless, shared) = headless_context();
    let mut pipeline = ShaderPipeline::new(shared, Arc::new(EchoLengthCompiler::default()), &config_with_cache(root.clone()));

    let result = pipeline.build(&ShaderDocument::new("Broken.glsl", "#type vertex\nSYNTAX_ERROR\n#type fragment\nFS"));
    assert!(result.is_err());

    let errors = from_source(&entries, "lumen::IntermediateCompiler");
    let error = errors
        .iter()
        .find(|entry| entry.severity == LogSeverity::Error)
        .expect("compile failure should be logged");
    assert!(error.message.contains("Broken.glsl"));
    assert!(error.message.contains("syntax error"));
    assert!(error.file.is_some());
    assert!(error.line.is_some());

    Engine::reset_logger();
    let _ = fs::remove_dir_all(&root);
}

#[test]
#[serial]
fn test_link_failure_logged_at_error() {
    let root = temp_dir("log_link_failure");
    let entries = CaptureLogger::install();
    let (_headless, shared) = headless_context();
    let mut pipeline = ShaderPipeline::new(shared, Arc::new(EchoLengthCompiler::default()), &config_with_cache(root.clone()));

    assert!(pipeline.build(&ShaderDocument::new("VertexOnly.glsl", "#type vertex\nVS")).is_err());

    let linker = from_source(&entries, "lumen::ProgramLinker");
    assert_eq!(linker.len(), 1);
    assert_eq!(linker[0].severity, LogSeverity::Error);
    assert!(linker[0].message.contains("'VertexOnly' failed to link"));

    Engine::reset_logger();
    fs::remove_dir_all(&root).unwrap();
}

// ============================================================================
// UNIFORM POLICY
// ============================================================================

#[test]
#[serial]
fn test_uniform_policy_controls_warning() {
    let entries = CaptureLogger::install();
    let (_headless, shared) = headless_context();
    let mut pipeline = ShaderPipeline::new(
        shared,
        Arc::new(EchoLengthCompiler::default()),
        &config_with_cache(temp_dir("log_uniform_unused")),
    );
    let mut shader = pipeline.build_from_sources("Flat", "void main() {}", "void main() {}").unwrap();

    shader.program().set_float("u_Missing", 1.0).unwrap();
    assert!(from_source(&entries, "lumen::ShaderProgram").is_empty());

    shader.program_mut().set_uniform_policy(UniformPolicy::Warn);
    shader.program().set_float("u_Missing", 1.0).unwrap();

    let warnings = from_source(&entries, "lumen::ShaderProgram");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, LogSeverity::Warn);
    assert!(warnings[0].message.contains("u_Missing"));
    assert!(warnings[0].message.contains("Flat"));

    drop(shader);
    Engine::reset_logger();
}

// ============================================================================
// THRESHOLD
// ============================================================================

#[test]
#[serial]
fn test_min_severity_hides_debug_output() {
    let root = temp_dir("log_threshold");
    let entries = CaptureLogger::install();
    Engine::set_min_severity(LogSeverity::Info);
    let (_headless, shared) = headless_context();
    let mut pipeline = ShaderPipeline::new(shared, Arc::new(EchoLengthCompiler::default()), &config_with_cache(root.clone()));

    let shader = pipeline.build(&ShaderDocument::new("Flat.glsl", "#type vertex\nVS\n#type fragment\nFS")).unwrap();

    let captured = entries.lock().unwrap().clone();
    assert!(!captured.is_empty());
    assert!(captured.iter().all(|entry| entry.severity >= LogSeverity::Info));

    drop(shader);
    Engine::reset_logger();
    assert_eq!(Engine::min_severity(), LogSeverity::Trace);
    fs::remove_dir_all(&root).unwrap();
}

#[test]
#[serial]
fn test_reset_logger_detaches_capture() {
    let entries = CaptureLogger::install();
    Engine::log(LogSeverity::Info, "lumen::Test", "captured".to_string());

    Engine::reset_logger();
    Engine::log(LogSeverity::Info, "lumen::Test", "not captured".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "captured");
}
