//! Per-function return summaries for typed-nil analysis.
//!
//! Per-return-slot facts: for a function returning `(int, *T)` that
//! executes `return 0, nil`, slot 1 is `ConcreteNilable`. A slot is
//! nilable if any static return site makes it so.

use std::collections::{BTreeMap, HashMap};

use typednil_ir::call_graph::CallGraph;
use typednil_ir::ir::{Function, Package};
use typednil_ir::types::TypeMap;

use crate::classify::Classifier;
use crate::facts::{FactLookup, FactStore, FunctionSummary, ReturnSlotResult};
use crate::kind::NilableKind;

/// Readable signature used in facts and diagnostics,
/// e.g. `func a/b.CE1() (int, *a/b.MyError)`.
pub fn display_name(func: &Function, types: &TypeMap) -> String {
    let params: Vec<&str> = func.signature.params.iter().map(|&t| types.name(t)).collect();
    let results = result_type(func, types);
    let sep = if results.is_empty() { "" } else { " " };
    format!("func {}({}){sep}{results}", func.name, params.join(", "))
}

/// Type name of a call to `func`, as the front-end names it: empty, the
/// single result type, or the result tuple `(A, B)`.
pub fn result_type(func: &Function, types: &TypeMap) -> String {
    let results: Vec<&str> = func.signature.results.iter().map(|&t| types.name(t)).collect();
    match results.as_slice() {
        [] => String::new(),
        [single] => single.to_string(),
        many => format!("({})", many.join(", ")),
    }
}

/// Classify each return slot of `func`. Returns `None` for synthetic
/// functions and when no slot is nilable.
///
/// Return sites are visited in block order, then instruction order; the
/// first site that makes a slot nilable is the one recorded.
pub fn summarize_function(
    func: &Function,
    types: &TypeMap,
    facts: &dyn FactLookup,
) -> Option<FunctionSummary> {
    if func.is_synthetic {
        return None;
    }

    let classifier = Classifier::new(func, types, facts);
    let declared = &func.signature.results;
    let mut results: BTreeMap<u32, ReturnSlotResult> = BTreeMap::new();

    for ret in func.returns() {
        for (index, (&value, &result_type)) in ret.operands.iter().zip(declared).enumerate() {
            let slot = index as u32;
            if results.contains_key(&slot) {
                continue;
            }

            let kind = if types.is_interface(result_type) {
                classifier
                    .classify(value)
                    .map(|_| NilableKind::InterfaceNilable)
            } else if types.is_concrete_nilable(result_type) {
                classifier
                    .is_literal_nil(value)
                    .then_some(NilableKind::ConcreteNilable)
            } else {
                None
            };

            if let Some(kind) = kind {
                results.insert(
                    slot,
                    ReturnSlotResult {
                        position: ret.position(),
                        kind,
                    },
                );
            }
        }
    }

    if results.is_empty() {
        return None;
    }

    Some(FunctionSummary {
        function: func.name.clone(),
        display_name: display_name(func, types),
        result_type: result_type(func, types),
        results,
    })
}

/// Summarize every function of `pkg` and export the facts into `store`.
///
/// Functions are visited callee-first along the static call graph, so a
/// call to a function of the same package sees that function's fact.
/// Returns the names of the functions that exported a fact.
pub fn summarize_package<S: FactStore>(pkg: &Package, store: &mut S) -> Vec<String> {
    let types = TypeMap::from_package(pkg);
    let by_name: HashMap<&str, &Function> =
        pkg.functions.iter().map(|f| (f.name.as_str(), f)).collect();
    let order = CallGraph::from_package(pkg).bottom_up_order();

    let mut exported = Vec::new();
    for name in order {
        let Some(func) = by_name.get(name) else {
            continue;
        };
        let Some(summary) = summarize_function(func, &types, &*store) else {
            continue;
        };

        tracing::debug!(func = %func.name, fact = %summary, "exporting fact");
        match store.export(&func.name, summary) {
            Ok(()) => exported.push(func.name.clone()),
            Err(e) => tracing::warn!(func = %func.name, error = %e, "fact not exported"),
        }
    }
    exported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::MemoryFactStore;
    use crate::test_util::*;
    use typednil_ir::ir::{Span, ValueKind};

    fn summarize_alone(func: &Function) -> Option<FunctionSummary> {
        let types = make_types();
        let tm = TypeMap::from_types(&types);
        summarize_function(func, &tm, &MemoryFactStore::new())
    }

    #[test]
    fn test_boxed_nil_pointer_is_interface_nilable() {
        // func E() error { var p *MyError; return p }
        let func = make_func(
            "b.E",
            vec![ERROR],
            vec![nil_const(0, MY_ERROR_PTR), make_iface(1, 0), ret(2, vec![1])],
        );
        let summary = summarize_alone(&func).unwrap();
        assert_eq!(summary.to_string(), "nilable results [0:I]");
        assert_eq!(summary.display_name, "func b.E() error");
        assert_eq!(summary.slot(0).unwrap().position, Span::new("test.go", 12, 2));
    }

    #[test]
    fn test_bare_nil_return_not_summarized() {
        // func NE() error { return nil }
        let func = make_func("b.NE", vec![ERROR], vec![nil_const(0, ERROR), ret(1, vec![0])]);
        assert!(summarize_alone(&func).is_none());
    }

    #[test]
    fn test_concrete_nil_slot() {
        // func CE1() (int, *MyError) { return 0, nil }
        let func = make_func(
            "b.CE1",
            vec![INT, MY_ERROR_PTR],
            vec![int_const(0), nil_const(1, MY_ERROR_PTR), ret(2, vec![0, 1])],
        );
        let summary = summarize_alone(&func).unwrap();
        assert_eq!(summary.to_string(), "nilable results [1:C]");
        assert_eq!(summary.display_name, "func b.CE1() (int, *b.MyError)");
        assert_eq!(summary.result_type, "(int, *b.MyError)");
    }

    #[test]
    fn test_allocated_pointer_not_summarized() {
        // func CE2() (int, *MyError) { return 0, new(MyError) }
        let func = make_func(
            "b.CE2",
            vec![INT, MY_ERROR_PTR],
            vec![
                int_const(0),
                make_instr(1, ValueKind::Alloc, MY_ERROR_PTR),
                ret(2, vec![0, 1]),
            ],
        );
        assert!(summarize_alone(&func).is_none());
    }

    #[test]
    fn test_any_return_site_suffices() {
        // if cond { return new(MyError) } ; var p *MyError; return p
        let func = make_func_blocks(
            "b.Maybe",
            vec![ERROR],
            vec![
                vec![
                    make_instr(0, ValueKind::Alloc, MY_ERROR_PTR),
                    make_iface(1, 0),
                    ret(2, vec![1]),
                ],
                vec![nil_const(3, MY_ERROR_PTR), make_iface(4, 3), ret(5, vec![4])],
            ],
        );
        let summary = summarize_alone(&func).unwrap();
        assert_eq!(summary.slot(0).unwrap().kind, NilableKind::InterfaceNilable);
        assert_eq!(summary.slot(0).unwrap().position.start_line, 15);
    }

    #[test]
    fn test_first_return_site_wins() {
        let func = make_func_blocks(
            "b.Twice",
            vec![MY_ERROR_PTR],
            vec![
                vec![nil_const(0, MY_ERROR_PTR), ret(1, vec![0])],
                vec![nil_const(2, MY_ERROR_PTR), ret(3, vec![2])],
            ],
        );
        let summary = summarize_alone(&func).unwrap();
        assert_eq!(summary.slot(0).unwrap().position.start_line, 11);
    }

    #[test]
    fn test_non_nilable_result_type_ignored() {
        let func = make_func("b.N", vec![INT], vec![nil_const(0, INT), ret(1, vec![0])]);
        assert!(summarize_alone(&func).is_none());
    }

    #[test]
    fn test_synthetic_function_skipped() {
        let mut func = make_func(
            "b.E$1",
            vec![ERROR],
            vec![nil_const(0, MY_ERROR_PTR), make_iface(1, 0), ret(2, vec![1])],
        );
        func.is_synthetic = true;
        assert!(summarize_alone(&func).is_none());
    }

    #[test]
    fn test_interface_result_through_concrete_call() {
        // func P() *MyError { return nil }
        // func W() error { return P() }
        let p = make_func(
            "b.P",
            vec![MY_ERROR_PTR],
            vec![nil_const(0, MY_ERROR_PTR), ret(1, vec![0])],
        );
        let w = make_func(
            "b.W",
            vec![ERROR],
            vec![call(0, "b.P", MY_ERROR_PTR), make_iface(1, 0), ret(2, vec![1])],
        );
        // Declared after its caller: the call graph order still summarizes P first.
        let pkg = make_package("b", vec![w, p]);
        let mut store = MemoryFactStore::new();
        let exported = summarize_package(&pkg, &mut store);
        assert_eq!(exported, vec!["b.P".to_string(), "b.W".to_string()]);
        assert_eq!(
            store.import_summary("b.W").unwrap().slot(0).map(|r| r.kind),
            Some(NilableKind::InterfaceNilable)
        );
    }

    #[test]
    fn test_interface_result_through_interface_call() {
        let e = make_func(
            "b.E",
            vec![ERROR],
            vec![nil_const(0, MY_ERROR_PTR), make_iface(1, 0), ret(2, vec![1])],
        );
        let wrap = make_func(
            "b.Wrap",
            vec![ERROR],
            vec![call(0, "b.E", ERROR), ret(1, vec![0])],
        );
        let mut dynamic_call = call(0, "b.E", ERROR);
        dynamic_call.callee_is_interface = true;
        let dynamic = make_func("b.Dyn", vec![ERROR], vec![dynamic_call, ret(1, vec![0])]);

        let pkg = make_package("b", vec![e, wrap, dynamic]);
        let mut store = MemoryFactStore::new();
        summarize_package(&pkg, &mut store);
        assert!(store.import_summary("b.Wrap").is_some());
        assert!(store.import_summary("b.Dyn").is_none());
    }

    #[test]
    fn test_already_exported_fact_is_kept() {
        let e = make_func(
            "b.E",
            vec![ERROR],
            vec![nil_const(0, MY_ERROR_PTR), make_iface(1, 0), ret(2, vec![1])],
        );
        let pkg = make_package("b", vec![e]);
        let mut store = MemoryFactStore::new();
        assert_eq!(summarize_package(&pkg, &mut store).len(), 1);
        assert!(summarize_package(&pkg, &mut store).is_empty());
        assert_eq!(store.len(), 1);
    }
}
