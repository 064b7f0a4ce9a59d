//! Wire serialization of drained activity

pub mod codec;

pub use codec::{DecodedEntry, WireCodec};
