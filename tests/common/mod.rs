//! Shared test utilities
//!
//! This module provides common helpers for integration tests:
//! - Git repository fixtures with a bare remote
//! - A mock registry HTTP server

pub mod git_fixtures;
pub mod registry_server;
