//! Utility helpers for the agent layer

pub mod logging;
