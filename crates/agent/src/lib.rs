//! # Codetrail Agent
//!
//! Host-facing layer of the Codetrail activity agent.
//!
//! This crate contains:
//! - Host commands (IDE plugin → agent bridge)
//! - The agent context (dependency injection and lifecycle)
//! - Logging bootstrap
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

pub use context::AgentContext;
