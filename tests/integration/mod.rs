//! Integration tests for pruva-branches
//!
//! These tests run the provisioner, the validator and the binaries against
//! real git repositories and a mock registry.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod readiness_flow;
