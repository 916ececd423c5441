//! Pourguard RPC - CLI orchestrator
//!
//! This crate provides the `pourguard` binary and command orchestration.

pub mod commands;
pub mod context;

pub use context::AppContext;
