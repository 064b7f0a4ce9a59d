//! Shared helpers

pub mod time_format;

pub use time_format::{format_duration, parse_duration, parse_timestamp, TimestampFormat};
