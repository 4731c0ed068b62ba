//! Analysis driver: orders packages, shares one fact store across them,
//! persists facts between runs, and post-processes the findings.

use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use typednil_analysis::analysis::TypedNilAnalyzer;
use typednil_analysis::facts::{FactError, FactFile, FactLookup, FunctionSummary, MemoryFactStore};
use typednil_diagnostics::diagnostic::{AnalysisSummary, Diagnostic, Severity};
use typednil_ir::ir::{AnalysisInput, Package};
use typednil_ir::IrError;

use crate::config::{self, ConfigError, TypednilConfig};
use crate::{flags, persist};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Ir(#[from] IrError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("facts of package {package}: {source}")]
    Facts { package: String, source: FactError },
    #[error("import cycle among packages: {}", .0.join(", "))]
    ImportCycle(Vec<String>),
}

/// Settings of one driver run.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub severity_threshold: Severity,
    /// 0 = unlimited.
    pub max_diagnostics: usize,
    /// `None` disables fact persistence.
    pub facts_dir: Option<PathBuf>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            severity_threshold: Severity::Warning,
            max_diagnostics: 0,
            facts_dir: None,
        }
    }
}

impl DriverOptions {
    /// Validate `config` (severity, flag string) and resolve the facts dir.
    pub fn from_config(config: &TypednilConfig) -> Result<Self, ConfigError> {
        flags::parse_flag_string(&config.flags)?;
        Ok(Self {
            severity_threshold: config.severity()?,
            max_diagnostics: config.max_diagnostics,
            facts_dir: config::resolve_facts_dir(config),
        })
    }
}

/// Complete output from an analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub diagnostics: Vec<Diagnostic>,
    /// Facts exported by the analyzed packages, in analysis order.
    pub facts: Vec<FunctionSummary>,
    pub summary: RunSummary,
}

/// Summary statistics for the analysis.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub total: usize,
    #[serde(flatten)]
    pub counts: AnalysisSummary,
    pub packages_analyzed: usize,
    pub functions_analyzed: usize,
    pub facts_exported: usize,
}

/// Load an IR file and analyze it.
pub fn analyze_file(path: &Path, options: &DriverOptions) -> Result<AnalysisOutput, DriverError> {
    let ir = typednil_ir::load_json_file(path)?;
    analyze_ir(&ir, options)
}

/// Run the analysis over every package of `ir`, dependencies first.
pub fn analyze_ir(ir: &AnalysisInput, options: &DriverOptions) -> Result<AnalysisOutput, DriverError> {
    let order = package_order(ir)?;
    let mut store = MemoryFactStore::new();
    if let Some(dir) = &options.facts_dir {
        load_imported_facts(ir, dir, &mut store)?;
    }

    let mut diagnostics = Vec::new();
    let mut facts = Vec::new();
    for pkg in order {
        let result = TypedNilAnalyzer::analyze_package(pkg, &mut store);
        tracing::info!(
            pkg = %pkg.import_path,
            functions = pkg.functions.len(),
            facts = result.exported.len(),
            findings = result.diagnostics.len(),
            "analyzed package"
        );

        if let Some(dir) = &options.facts_dir {
            let file = FactFile::collect(pkg, &result.exported, &store);
            persist::write_fact_file(dir, &file).map_err(|source| DriverError::Facts {
                package: pkg.import_path.clone(),
                source,
            })?;
        }

        facts.extend(
            result
                .exported
                .iter()
                .filter_map(|f| store.import_summary(f).cloned()),
        );
        diagnostics.extend(result.diagnostics);
    }

    Ok(postprocess_diagnostics(diagnostics, facts, options, ir))
}

/// Order packages so each follows every package of the input it imports.
/// Among ready packages, input order wins.
pub fn package_order(ir: &AnalysisInput) -> Result<Vec<&Package>, DriverError> {
    let mut done = vec![false; ir.packages.len()];
    let mut order = Vec::with_capacity(ir.packages.len());

    let index_of = |path: &str| ir.packages.iter().position(|p| p.import_path == path);

    while order.len() < ir.packages.len() {
        let next = ir.packages.iter().enumerate().position(|(i, pkg)| {
            !done[i]
                && pkg
                    .imports
                    .iter()
                    .filter_map(|imp| index_of(imp))
                    .all(|dep| done[dep])
        });
        match next {
            Some(i) => {
                done[i] = true;
                order.push(&ir.packages[i]);
            }
            None => {
                let stuck = ir
                    .packages
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !done[*i])
                    .map(|(_, p)| p.import_path.clone())
                    .collect();
                return Err(DriverError::ImportCycle(stuck));
            }
        }
    }
    Ok(order)
}

/// Import persisted facts for every package outside `ir` that the input
/// depends on, directly or through the imports recorded in fact files.
fn load_imported_facts(
    ir: &AnalysisInput,
    dir: &Path,
    store: &mut MemoryFactStore,
) -> Result<(), DriverError> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut enqueue = |imports: &[String], queue: &mut VecDeque<String>| {
        for imp in imports {
            if ir.package(imp).is_none() && seen.insert(imp.clone()) {
                queue.push_back(imp.clone());
            }
        }
    };
    for pkg in &ir.packages {
        enqueue(&pkg.imports, &mut queue);
    }

    while let Some(import_path) = queue.pop_front() {
        let file = persist::read_fact_file(dir, &import_path).map_err(|source| {
            DriverError::Facts {
                package: import_path.clone(),
                source,
            }
        })?;
        match file {
            Some(file) => {
                enqueue(&file.imports, &mut queue);
                let loaded = file.load_into(store);
                tracing::debug!(pkg = %import_path, loaded, "imported persisted facts");
            }
            None => tracing::debug!(pkg = %import_path, "no persisted facts"),
        }
    }
    Ok(())
}

/// Severity filter, sort, truncate, build summary.
fn postprocess_diagnostics(
    mut diags: Vec<Diagnostic>,
    facts: Vec<FunctionSummary>,
    options: &DriverOptions,
    ir: &AnalysisInput,
) -> AnalysisOutput {
    diags.retain(|d| d.severity.is_at_least(options.severity_threshold));

    diags.sort_by(|a, b| {
        a.location
            .file
            .cmp(&b.location.file)
            .then(a.location.line.cmp(&b.location.line))
            .then(a.location.column.cmp(&b.location.column))
    });

    if options.max_diagnostics > 0 && diags.len() > options.max_diagnostics {
        diags.truncate(options.max_diagnostics);
    }

    let counts = AnalysisSummary::from_diagnostics(&diags);
    let summary = RunSummary {
        total: counts.total(),
        counts,
        packages_analyzed: ir.packages.len(),
        functions_analyzed: ir.packages.iter().map(|p| p.functions.len()).sum(),
        facts_exported: facts.len(),
    };

    AnalysisOutput {
        diagnostics: diags,
        facts,
        summary,
    }
}
