//! Type system helpers for working with Go types from front-end data.

use crate::ir::{Package, TypeKind, TypeRef};
use std::collections::HashMap;

/// Type lookup table for a package
pub struct TypeMap<'a> {
    types: HashMap<u32, &'a TypeRef>,
}

impl<'a> TypeMap<'a> {
    pub fn from_package(pkg: &'a Package) -> Self {
        Self::from_types(&pkg.types)
    }

    pub fn from_types(types: &'a [TypeRef]) -> Self {
        let types = types.iter().map(|t| (t.id, t)).collect();
        Self { types }
    }

    pub fn get(&self, id: u32) -> Option<&'a TypeRef> {
        self.types.get(&id).copied()
    }

    /// Display name, `?` for unknown IDs.
    pub fn name(&self, id: u32) -> &'a str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("?")
    }

    /// Interface (boxed) type: nil only when both type tag and payload are empty.
    pub fn is_interface(&self, id: u32) -> bool {
        self.get(id)
            .map(|t| t.kind == TypeKind::Interface)
            .unwrap_or(false)
    }

    /// A nilable type that is neither an interface nor the untyped nil type:
    /// pointers, slices, maps, channels, funcs, and named types over them.
    pub fn is_concrete_nilable(&self, id: u32) -> bool {
        self.get(id)
            .map(|t| {
                t.is_nilable && !matches!(t.kind, TypeKind::Interface | TypeKind::UntypedNil)
            })
            .unwrap_or(false)
    }
}
