//! typednil IR - intermediate representation for Go code analysis.
//!
//! The IR is built by a Go SSA front-end and deserialized here from JSON.
//! This crate provides:
//! - High-level IR wrappers matching the front-end output
//! - Type system helpers
//! - Static call graph representation

pub mod call_graph; // Static call graph queries
pub mod ir; // High-level IR wrappers
pub mod types; // Type system helpers

/// Errors raised while loading IR.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid IR JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a JSON IR file and convert it to the owned IR.
pub fn load_json_file(path: &std::path::Path) -> Result<ir::AnalysisInput, IrError> {
    let data = std::fs::read_to_string(path)?;
    ir::AnalysisInput::from_json(&data)
}

/// Load a bridge fixture file from `tests/bridge_fixtures/` by name.
/// The fixture file should have a `.json` extension.
///
/// This is available in test builds and when the `test-fixtures` feature is enabled.
#[cfg(any(test, feature = "test-fixtures"))]
pub fn load_bridge_fixture(name: &str) -> ir::AnalysisInput {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let fixture_path = manifest_dir
        .join("../../tests/bridge_fixtures")
        .join(format!("{name}.json"));
    load_json_file(&fixture_path)
        .unwrap_or_else(|e| panic!("failed to load fixture {name}: {e}"))
}
