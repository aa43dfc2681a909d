//! Common test utilities for rawconv integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
