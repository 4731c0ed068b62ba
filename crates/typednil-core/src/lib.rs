//! typednil core - driver, configuration, and fact persistence

pub mod config;
pub mod driver;
pub mod flags;
pub mod persist;
