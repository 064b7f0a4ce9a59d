//! Host commands - IDE plugin to agent bridge

mod identity;
mod tracking;

pub use identity::*;
pub use tracking::*;
