//! Core diagnostic types for typednil.
//!
//! The comparison scanner produces `Diagnostic` values, and the
//! formatters (human, JSON) consume them.

use serde::{Deserialize, Serialize};

/// A diagnostic produced by an analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique ID: RULE_CODE-file:line (e.g., "TNIL001-a.go:12").
    pub id: String,
    /// Rule code (e.g., "TNIL001").
    pub rule: String,
    /// Severity level.
    pub severity: Severity,
    /// One-line summary.
    pub title: String,
    /// Why the comparison is suspicious.
    pub explanation: String,
    /// Where the issue manifests.
    pub location: Location,
    /// Where the typed nil originates, when traced through a call.
    pub root_cause: Option<RootCause>,
}

/// Severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity `{other}`")),
        }
    }
}

impl Severity {
    /// Check if this severity is at or above a threshold.
    pub fn is_at_least(&self, threshold: Severity) -> bool {
        *self >= threshold
    }
}

/// Source code location.
///
/// Lines and columns are 1-based (matching Go's `token.Position`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Root cause information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub file: String,
    pub line: u32,
    pub description: String,
}

/// Builder for creating diagnostics conveniently.
pub struct DiagnosticBuilder {
    rule: String,
    severity: Severity,
    title: String,
    file: String,
    line: u32,
    column: u32,
    explanation: String,
    root_cause: Option<RootCause>,
}

impl DiagnosticBuilder {
    /// Create a new diagnostic builder.
    pub fn new(rule: impl Into<String>, severity: Severity, title: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity,
            title: title.into(),
            file: String::new(),
            line: 0,
            column: 0,
            explanation: String::new(),
            root_cause: None,
        }
    }

    /// Set the location.
    pub fn location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self.column = column;
        self
    }

    /// Set the explanation.
    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Set the root cause.
    pub fn root_cause(
        mut self,
        file: impl Into<String>,
        line: u32,
        description: impl Into<String>,
    ) -> Self {
        self.root_cause = Some(RootCause {
            file: file.into(),
            line,
            description: description.into(),
        });
        self
    }

    /// Build the diagnostic.
    pub fn build(self) -> Diagnostic {
        let id = format!("{}-{}:{}", self.rule, self.file, self.line);
        Diagnostic {
            id,
            rule: self.rule,
            severity: self.severity,
            title: self.title,
            explanation: self.explanation,
            location: Location {
                file: self.file,
                line: self.line,
                column: self.column,
            },
            root_cause: self.root_cause,
        }
    }
}

/// Summary of analysis results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl AnalysisSummary {
    /// Create a summary from a list of diagnostics.
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self::default();
        for diag in diagnostics {
            match diag.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Error => summary.error += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }

    /// Total number of diagnostics.
    pub fn total(&self) -> usize {
        self.critical + self.error + self.warning + self.info
    }
}
