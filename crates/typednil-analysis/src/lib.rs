//! typednil analysis - interface values holding a typed nil compared against nil

pub mod analysis;
pub mod classify;
pub mod facts;
pub mod kind;
pub mod rules;
pub mod summary;

#[cfg(test)]
mod test_util;
