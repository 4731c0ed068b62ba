//! typednil diagnostics - diagnostic types and formatting

pub mod diagnostic;
pub mod human;

pub use diagnostic::*;
