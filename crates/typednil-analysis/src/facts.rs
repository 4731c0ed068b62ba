//! Per-function facts and the write-once store that holds them.
//!
//! A `FunctionSummary` is exported exactly once, by the pass over the
//! package that defines the function, and only read afterwards: by the
//! classifier within the same pass, or by passes over dependent
//! packages after the driver reloads persisted facts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use typednil_ir::ir::{Package, Span};

use crate::kind::NilableKind;

/// Errors raised by fact stores and fact files.
#[derive(Debug, thiserror::Error)]
pub enum FactError {
    #[error("fact for `{0}` already exported")]
    AlreadyExported(String),
    #[error("fact file I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid fact file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where and how a return slot was observed nilable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSlotResult {
    /// Position of the return statement that produced the nilable value.
    pub position: Span,
    pub kind: NilableKind,
}

/// Exported fact for one function.
///
/// A slot missing from `results` was never observed nilable at any
/// static return site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSummary {
    /// Qualified function name, the store key.
    pub function: String,
    /// Readable signature, e.g. `func a/b.CE1() (int, *a/b.MyError)`.
    pub display_name: String,
    /// Type of a call to the function, e.g. `error` or
    /// `(int, *a/b.MyError)`. A call of any other type does not match.
    #[serde(default)]
    pub result_type: String,
    /// Zero-based return slot → observation.
    pub results: BTreeMap<u32, ReturnSlotResult>,
}

impl FunctionSummary {
    pub fn slot(&self, index: u32) -> Option<&ReturnSlotResult> {
        self.results.get(&index)
    }

    /// True if a call typed `call_type` can be a call to this function
    /// as summarized.
    pub fn matches_call_type(&self, call_type: &str) -> bool {
        self.result_type == call_type
    }
}

impl std::fmt::Display for FunctionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rets: Vec<String> = self
            .results
            .iter()
            .map(|(index, r)| format!("{index}:{}", r.kind))
            .collect();
        write!(f, "nilable results [{}]", rets.join(","))
    }
}

/// Read access to exported facts.
pub trait FactLookup {
    fn import_summary(&self, function: &str) -> Option<&FunctionSummary>;
}

/// Append-only fact store: each key is written once, then read many times.
pub trait FactStore: FactLookup {
    fn export(&mut self, function: &str, summary: FunctionSummary) -> Result<(), FactError>;
}

/// In-memory fact store shared by every package of one run.
#[derive(Debug, Clone, Default)]
pub struct MemoryFactStore {
    facts: BTreeMap<String, FunctionSummary>,
}

impl MemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// All facts, ordered by function name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FunctionSummary)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FactLookup for MemoryFactStore {
    fn import_summary(&self, function: &str) -> Option<&FunctionSummary> {
        self.facts.get(function)
    }
}

impl FactStore for MemoryFactStore {
    fn export(&mut self, function: &str, summary: FunctionSummary) -> Result<(), FactError> {
        if self.facts.contains_key(function) {
            return Err(FactError::AlreadyExported(function.to_string()));
        }
        self.facts.insert(function.to_string(), summary);
        Ok(())
    }
}

/// Serialized facts of one package, as persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactFile {
    /// Import path of the package that exported these facts.
    pub package: String,
    /// Direct imports of that package, followed when loading the facts
    /// of a dependent run.
    #[serde(default)]
    pub imports: Vec<String>,
    pub facts: Vec<FunctionSummary>,
}

impl FactFile {
    /// Collect the facts `store` holds for `functions` of `package`.
    pub fn collect(package: &Package, functions: &[String], store: &dyn FactLookup) -> Self {
        let facts = functions
            .iter()
            .filter_map(|f| store.import_summary(f).cloned())
            .collect();
        Self {
            package: package.import_path.clone(),
            imports: package.imports.clone(),
            facts,
        }
    }

    pub fn to_json(&self) -> Result<String, FactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, FactError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Export every fact into `store`. Returns the number of facts
    /// imported; keys already present are left untouched.
    pub fn load_into<S: FactStore>(self, store: &mut S) -> usize {
        let mut loaded = 0;
        for summary in self.facts {
            let key = summary.function.clone();
            match store.export(&key, summary) {
                Ok(()) => loaded += 1,
                Err(e) => tracing::warn!(package = %self.package, error = %e, "skipping persisted fact"),
            }
        }
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::make_package;

    fn summary(function: &str, slots: &[(u32, NilableKind, u32)]) -> FunctionSummary {
        FunctionSummary {
            function: function.into(),
            display_name: format!("func {function}()"),
            result_type: "error".into(),
            results: slots
                .iter()
                .map(|&(i, kind, line)| {
                    (
                        i,
                        ReturnSlotResult {
                            position: Span::new("b.go", line, 2),
                            kind,
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_display_orders_slots() {
        let s = summary(
            "b.F",
            &[
                (2, NilableKind::ConcreteNilable, 9),
                (0, NilableKind::InterfaceNilable, 7),
            ],
        );
        assert_eq!(s.to_string(), "nilable results [0:I,2:C]");
        assert_eq!(s.slot(2).map(|r| r.kind), Some(NilableKind::ConcreteNilable));
        assert!(s.slot(1).is_none());
        assert!(s.matches_call_type("error"));
        assert!(!s.matches_call_type("(int, error)"));
    }

    #[test]
    fn test_store_is_write_once() {
        let mut store = MemoryFactStore::new();
        let first = summary("b.E", &[(0, NilableKind::InterfaceNilable, 7)]);
        store.export("b.E", first.clone()).unwrap();

        let second = summary("b.E", &[(0, NilableKind::ConcreteNilable, 8)]);
        let err = store.export("b.E", second).unwrap_err();
        assert!(matches!(err, FactError::AlreadyExported(ref k) if k == "b.E"));

        assert_eq!(store.import_summary("b.E"), Some(&first));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_summary_is_none() {
        let store = MemoryFactStore::new();
        assert!(store.import_summary("b.Unknown").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_fact_file_roundtrip_into_new_store() {
        let mut producer = MemoryFactStore::new();
        producer
            .export("b.E", summary("b.E", &[(0, NilableKind::InterfaceNilable, 7)]))
            .unwrap();
        producer
            .export("b.CE1", summary("b.CE1", &[(1, NilableKind::ConcreteNilable, 15)]))
            .unwrap();

        let mut pkg = make_package("b", vec![]);
        pkg.imports = vec!["c".into()];
        let file = FactFile::collect(
            &pkg,
            &["b.E".to_string(), "b.CE1".to_string(), "b.NE".to_string()],
            &producer,
        );
        assert_eq!(file.facts.len(), 2);
        assert_eq!(file.imports, vec!["c".to_string()]);
        let json = file.to_json().unwrap();

        let mut consumer = MemoryFactStore::new();
        let loaded = FactFile::from_json(&json).unwrap().load_into(&mut consumer);
        assert_eq!(loaded, 2);

        let ce1 = consumer.import_summary("b.CE1").unwrap();
        let slot = ce1.slot(1).unwrap();
        assert_eq!(slot.kind, NilableKind::ConcreteNilable);
        assert_eq!(slot.position, Span::new("b.go", 15, 2));
        assert_eq!(ce1, producer.import_summary("b.CE1").unwrap());
    }

    #[test]
    fn test_load_skips_existing_keys() {
        let mut store = MemoryFactStore::new();
        let local = summary("b.E", &[(0, NilableKind::InterfaceNilable, 7)]);
        store.export("b.E", local.clone()).unwrap();

        let file = FactFile {
            package: "b".into(),
            imports: vec![],
            facts: vec![summary("b.E", &[(0, NilableKind::ConcreteNilable, 1)])],
        };
        assert_eq!(file.load_into(&mut store), 0);
        assert_eq!(store.import_summary("b.E"), Some(&local));
    }

    #[test]
    fn test_fact_file_without_imports_or_result_type() {
        let json = r#"{"package": "b", "facts": [{"function": "b.E", "display_name": "func b.E() error", "results": {}}]}"#;
        let file = FactFile::from_json(json).unwrap();
        assert!(file.imports.is_empty());
        assert_eq!(file.facts[0].result_type, "");
    }

    #[test]
    fn test_malformed_fact_file() {
        assert!(matches!(
            FactFile::from_json("{\"package\": 1}"),
            Err(FactError::Json(_))
        ));
    }
}
