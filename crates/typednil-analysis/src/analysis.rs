//! Typed-nil analysis engine.
//!
//! Per package: summarize every function and export the facts, then
//! scan every `==` / `!=` for an operand classified as a typed nil
//! compared against a nil constant.

use typednil_diagnostics::diagnostic::Diagnostic;
use typednil_ir::ir::{AnalysisInput, Function, Package};
use typednil_ir::types::TypeMap;

use crate::classify::Classifier;
use crate::facts::{FactLookup, FactStore};
use crate::rules;
use crate::summary::summarize_package;

/// Outcome of analyzing one package.
#[derive(Debug, Clone, Default)]
pub struct PackageResult {
    /// Functions of the package that exported a fact.
    pub exported: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Typed-nil comparison analyzer.
pub struct TypedNilAnalyzer;

impl TypedNilAnalyzer {
    /// Analyze packages in the given order over one shared store.
    ///
    /// Callers are responsible for ordering packages after their imports;
    /// see the driver in `typednil-core`.
    pub fn analyze<S: FactStore>(input: &AnalysisInput, store: &mut S) -> Vec<Diagnostic> {
        input
            .packages
            .iter()
            .flat_map(|pkg| Self::analyze_package(pkg, store).diagnostics)
            .collect()
    }

    /// Summarize, then scan, a single package.
    pub fn analyze_package<S: FactStore>(pkg: &Package, store: &mut S) -> PackageResult {
        let exported = summarize_package(pkg, store);
        let diagnostics = Self::scan_package(pkg, &*store);
        tracing::debug!(
            pkg = %pkg.import_path,
            facts = exported.len(),
            findings = diagnostics.len(),
            "package analyzed"
        );
        PackageResult {
            exported,
            diagnostics,
        }
    }

    /// Scan every function of `pkg` against already-exported facts.
    pub fn scan_package(pkg: &Package, facts: &dyn FactLookup) -> Vec<Diagnostic> {
        let types = TypeMap::from_package(pkg);
        pkg.functions
            .iter()
            .flat_map(|func| Self::scan_function(func, &types, facts))
            .collect()
    }

    /// Report each equality comparison between a typed nil and a nil
    /// constant. At most one diagnostic per instruction.
    pub fn scan_function(
        func: &Function,
        types: &TypeMap,
        facts: &dyn FactLookup,
    ) -> Vec<Diagnostic> {
        let classifier = Classifier::new(func, types, facts);
        let mut diags = Vec::new();

        for instr in func.instructions().filter(|i| i.is_equality()) {
            let [x, y] = instr.operands[..] else {
                continue;
            };
            let reason = classifier
                .classify(x)
                .filter(|_| classifier.is_literal_nil(y))
                .or_else(|| {
                    classifier
                        .classify(y)
                        .filter(|_| classifier.is_literal_nil(x))
                });

            if let Some(reason) = reason {
                tracing::debug!(func = %func.name, id = instr.id, %reason, "typed nil comparison");
                diags.push(rules::build_tnil001(instr, &func.short_name, &reason));
            }
        }

        diags
    }
}
