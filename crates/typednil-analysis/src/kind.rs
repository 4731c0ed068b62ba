//! Nilable classifications recorded per return slot.

use serde::{Deserialize, Serialize};

/// How a value may turn out to be nil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NilableKind {
    /// An interface value whose dynamic payload is a nil concrete pointer.
    /// Such a value never compares equal to the untyped `nil`.
    InterfaceNilable,
    /// A concrete pointer-like value that is literally nil.
    ConcreteNilable,
}

impl NilableKind {
    /// Short form used when rendering facts (`I` / `C`).
    pub fn short(self) -> &'static str {
        match self {
            NilableKind::InterfaceNilable => "I",
            NilableKind::ConcreteNilable => "C",
        }
    }

    /// Phrase describing a call result of this kind.
    pub fn describe(self) -> &'static str {
        match self {
            NilableKind::InterfaceNilable => "an interface holding a typed nil",
            NilableKind::ConcreteNilable => "a nil pointer that is boxed into an interface here",
        }
    }
}

impl std::fmt::Display for NilableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short())
    }
}
