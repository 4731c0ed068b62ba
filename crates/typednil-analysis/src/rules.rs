//! Typed-nil rules (TNIL001).

use typednil_diagnostics::diagnostic::*;
use typednil_ir::ir::Instruction;

use crate::classify::Reason;

pub const TNIL001: &str = "TNIL001";

pub const TNIL001_TITLE: &str = "it may become a comparison between a typed nil and an untyped nil";

/// TNIL001: interface holding a typed nil compared against untyped nil
pub fn build_tnil001(cmp: &Instruction, func_name: &str, reason: &Reason) -> Diagnostic {
    let pos = cmp.position();
    let op = cmp.bin_op.as_deref().unwrap_or("==");
    let mut builder = DiagnosticBuilder::new(TNIL001, Severity::Warning, TNIL001_TITLE)
        .location(&pos.file, pos.start_line, pos.start_col)
        .explanation(format!(
            "In function `{func_name}`, `{op} nil` compares against untyped nil but {reason}"
        ));
    if let Some(ref origin) = reason.origin {
        builder = builder.root_cause(
            &origin.position.file,
            origin.position.start_line,
            format!("`{}` returns a nil pointer here", origin.function),
        );
    }
    builder.build()
}
