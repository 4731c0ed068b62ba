//! High-level IR wrappers for Go code analysis.
//!
//! These types mirror the JSON document produced by the SSA front-end
//! and are the only input the typed-nil passes consume.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::IrError;

/// Root type: complete analysis input from the front-end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub packages: Vec<Package>,
    #[serde(default)]
    pub go_version: String,
}

impl AnalysisInput {
    /// Parse an analysis input from its JSON encoding.
    pub fn from_json(data: &str) -> Result<Self, IrError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Find a package by import path.
    pub fn package(&self, import_path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.import_path == import_path)
    }
}

/// A Go package (one compilation unit) with full SSA IR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub import_path: String,
    pub name: String,
    /// Import paths of the packages this one depends on directly.
    #[serde(default)]
    pub imports: Vec<String>,
    pub types: Vec<TypeRef>,
    pub functions: Vec<Function>,
}

/// Type reference with unique ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRef {
    pub id: u32,
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub is_nilable: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TypeKind {
    Basic,
    Named,
    Pointer,
    Slice,
    Array,
    Map,
    Chan,
    Struct,
    Interface,
    Signature,
    Tuple,
    /// The type of the bare `nil` literal.
    UntypedNil,
    #[serde(other)]
    Unknown,
}

/// Source location span
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub start_line: u32,
    pub start_col: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub end_col: u32,
}

impl Span {
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start_line, self.start_col)
    }
}

/// SSA Instruction
///
/// Values are instructions too: an operand is the `id` of another
/// instruction in the same function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub id: u32,
    pub kind: ValueKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub type_id: u32,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub operands: Vec<u32>,
    /// For `Extract` instructions: which tuple index is being extracted (0-based).
    #[serde(default)]
    pub extract_index: u32,

    // Call-specific
    /// Qualified name of the statically bound callee. `None` for calls
    /// through function values.
    #[serde(default)]
    pub callee: Option<String>,
    /// Interface method invocation (dynamic dispatch).
    #[serde(default)]
    pub callee_is_interface: bool,

    // Const-specific
    #[serde(default)]
    pub const_value: Option<String>,
    #[serde(default)]
    pub is_nil: bool,

    // BinOp-specific
    #[serde(default)]
    pub bin_op: Option<String>,
}

impl Instruction {
    /// Source position, or a placeholder when the front-end had none.
    pub fn position(&self) -> Span {
        self.span
            .clone()
            .unwrap_or_else(|| Span::new("unknown", 0, 0))
    }

    /// True for `==` and `!=` comparisons.
    pub fn is_equality(&self) -> bool {
        self.kind == ValueKind::BinOp && matches!(self.bin_op.as_deref(), Some("==" | "!="))
    }

    /// Statically bound callee, if this is a call that does not dispatch dynamically.
    pub fn static_callee(&self) -> Option<&str> {
        if self.kind != ValueKind::Call || self.callee_is_interface {
            return None;
        }
        self.callee.as_deref()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValueKind {
    Const,
    Parameter,
    Alloc,
    FieldAddr,
    IndexAddr,
    Call,
    BinOp,
    UnOp,
    Phi,
    Extract,
    TypeAssert,
    MakeChan,
    MakeMap,
    MakeSlice,
    MakeInterface,
    MakeClosure,
    Lookup,
    Slice,
    Convert,
    ChangeInterface,
    ChangeType,
    FreeVar,
    Global,
    Builtin,
    Return,
    If,
    Jump,
    Panic,
    Store,
    Load,
    #[serde(other)]
    Unknown,
}

/// SSA Basic Block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub instructions: Vec<Instruction>,
}

/// Declared parameter and result types of a function, as type IDs
/// into the owning package's type table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<u32>,
    #[serde(default)]
    pub results: Vec<u32>,
}

/// SSA Function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    /// Qualified name, e.g. `a/b.E` or `(*a/b.T).M`.
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub signature: Signature,
    pub blocks: Vec<BasicBlock>,
    /// Compiler-generated (closures, wrappers, init thunks): no declared symbol.
    #[serde(default)]
    pub is_synthetic: bool,
}

impl Function {
    /// All instructions in block order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }

    /// Static return sites in block order, then instruction order.
    pub fn returns(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions()
            .filter(|i| i.kind == ValueKind::Return)
    }

    /// Index from value ID to its defining instruction.
    pub fn instr_map(&self) -> HashMap<u32, &Instruction> {
        self.instructions().map(|i| (i.id, i)).collect()
    }
}
