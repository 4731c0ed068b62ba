//! Value classification: can this SSA value be a typed nil?
//!
//! Only two shapes are recognized: boxing a nil constant of a concrete
//! pointer-like type, and results of statically bound calls whose
//! exported fact marks the slot nilable. Everything else is unknown.

use std::collections::HashMap;

use typednil_ir::ir::{Function, Instruction, Span, ValueKind};
use typednil_ir::types::TypeMap;

use crate::facts::{FactLookup, FunctionSummary};
use crate::kind::NilableKind;

/// Why a value was classified as a typed nil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reason {
    pub message: String,
    /// Set when the classification was traced through a call.
    pub origin: Option<Origin>,
}

/// The callee return site a classification came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub function: String,
    pub position: Span,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Classifier over the values of one function.
pub struct Classifier<'a> {
    instrs: HashMap<u32, &'a Instruction>,
    types: &'a TypeMap<'a>,
    facts: &'a dyn FactLookup,
}

impl<'a> Classifier<'a> {
    pub fn new(func: &'a Function, types: &'a TypeMap<'a>, facts: &'a dyn FactLookup) -> Self {
        Self {
            instrs: func.instr_map(),
            types,
            facts,
        }
    }

    /// Returns a reason if `value` may be an interface holding a nil
    /// concrete pointer.
    pub fn classify(&self, value: u32) -> Option<Reason> {
        let instr = self.instrs.get(&value)?;
        if instr.kind != ValueKind::MakeInterface {
            return self.nilable_func_call(value, NilableKind::InterfaceNilable);
        }

        let x = *instr.operands.first()?;
        match self.instrs.get(&x) {
            Some(inner) if self.is_typed_nil_const(inner) => Some(Reason {
                message: format!(
                    "constant nil of type {} converted to boxed value",
                    self.types.name(inner.type_id)
                ),
                origin: None,
            }),
            _ => self.nilable_func_call(x, NilableKind::ConcreteNilable),
        }
    }

    /// Returns a reason if `value` is a result of a statically bound call
    /// whose fact records `kind` at that result slot.
    pub fn nilable_func_call(&self, value: u32, kind: NilableKind) -> Option<Reason> {
        let instr = self.instrs.get(&value)?;
        let (call, index) = match instr.kind {
            ValueKind::Call => (*instr, 0),
            ValueKind::Extract => {
                let tuple = self.instrs.get(instr.operands.first()?)?;
                if tuple.kind != ValueKind::Call {
                    return None;
                }
                (*tuple, instr.extract_index)
            }
            _ => return None,
        };

        let fact = self.import_fact(call)?;
        let slot = fact.slot(index).filter(|r| r.kind == kind)?;
        Some(Reason {
            message: format!(
                "result {index} of `{}` is {}",
                fact.display_name,
                kind.describe()
            ),
            origin: Some(Origin {
                function: fact.display_name.clone(),
                position: slot.position.clone(),
            }),
        })
    }

    /// True if `value` is a nil constant, typed or untyped.
    pub fn is_literal_nil(&self, value: u32) -> bool {
        self.instrs
            .get(&value)
            .map(|i| i.kind == ValueKind::Const && i.is_nil)
            .unwrap_or(false)
    }

    fn is_typed_nil_const(&self, instr: &Instruction) -> bool {
        instr.kind == ValueKind::Const
            && instr.is_nil
            && self.types.is_concrete_nilable(instr.type_id)
    }

    /// Fact of a statically bound callee. Interface invocations and calls
    /// through function values are never looked up. A fact whose result
    /// types differ from the call's type is stale and ignored.
    fn import_fact(&self, call: &Instruction) -> Option<&'a FunctionSummary> {
        let callee = call.static_callee()?;
        let fact = self.facts.import_summary(callee)?;
        let call_type = self.types.name(call.type_id);
        if !fact.matches_call_type(call_type) {
            tracing::debug!(
                callee,
                call_type,
                fact_type = %fact.result_type,
                "ignoring fact with mismatched result types"
            );
            return None;
        }
        Some(fact)
    }
}
