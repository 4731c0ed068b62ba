//! Call graph helpers for inter-procedural analysis.
//!
//! Built from the statically bound `Call` instructions of a package.
//! Interface invocations and calls through function values carry no
//! edge.

use crate::ir::Package;
use std::collections::{HashMap, HashSet};

/// Static intra-package call graph
pub struct CallGraph<'a> {
    /// Functions in declaration order
    functions: Vec<&'a str>,
    /// Callees per caller, deduplicated, in first-call order
    callees: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> CallGraph<'a> {
    /// Build the call graph of a package. Edges to functions defined
    /// outside the package are dropped.
    pub fn from_package(pkg: &'a Package) -> Self {
        let functions: Vec<&str> = pkg.functions.iter().map(|f| f.name.as_str()).collect();
        let defined: HashSet<&str> = functions.iter().copied().collect();

        let mut callees: HashMap<&str, Vec<&str>> = HashMap::new();
        for func in &pkg.functions {
            let entry = callees.entry(func.name.as_str()).or_default();
            for callee in func.instructions().filter_map(|i| i.static_callee()) {
                if defined.contains(callee) && !entry.contains(&callee) {
                    entry.push(callee);
                }
            }
        }

        Self { functions, callees }
    }

    /// Statically bound callees of `func_name` defined in this package
    pub fn calls_from(&self, func_name: &str) -> &[&'a str] {
        self.callees
            .get(func_name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Every function after the functions it calls. Recursion is cut at
    /// the first revisit, and unrelated functions keep declaration order.
    pub fn bottom_up_order(&self) -> Vec<&'a str> {
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.functions.len());

        for &root in &self.functions {
            if !visited.insert(root) {
                continue;
            }
            // Iterative post-order: (node, next child index)
            let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
            while let Some((node, child)) = stack.pop() {
                let callees = self.calls_from(node);
                if let Some(&next) = callees.get(child) {
                    stack.push((node, child + 1));
                    if visited.insert(next) {
                        stack.push((next, 0));
                    }
                } else {
                    order.push(node);
                }
            }
        }

        order
    }
}
