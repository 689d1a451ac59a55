//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Path to a file under `tests/fixtures/`.
#[allow(dead_code)]
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Write `content` to `<temp_dir>/<name>` and return the path.
#[allow(dead_code)]
pub fn write_record(temp_dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// A function record with `width` arguments, hooks and used functions, each used function
/// carrying its own usage `depth` levels down.
#[allow(dead_code)]
pub fn wide_function(name: &str, width: usize, depth: usize) -> serde_json::Value {
    let arguments: Vec<_> = (0..width)
        .map(|i| serde_json::json!({"name": format!("arg{i}"), "type": "int", "default": i}))
        .collect();
    let hooks: Vec<_> = (0..width)
        .map(|i| serde_json::json!({"name": format!("hook{i}"), "type": "filter", "line": i}))
        .collect();
    let mut record = serde_json::json!({
        "name": name,
        "namespace": "Bench",
        "line": 1,
        "end_line": 100,
        "arguments": arguments,
        "hooks": hooks,
        "doc": {"description": "generated", "tags": [{"name": "since", "content": "1.0"}]}
    });
    if depth > 0 {
        let functions: Vec<_> = (0..width)
            .map(|i| wide_function(&format!("{name}_{i}"), width, depth - 1))
            .collect();
        record["uses"] = serde_json::json!({"functions": functions});
    }
    record
}
