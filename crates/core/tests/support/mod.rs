//! Shared test helpers for `codetrail-core` integration tests.
//!
//! In-memory doubles for every core port so tests can drive the registry and
//! the flush cycle deterministically.

#![allow(dead_code)]

pub mod mocks;

use chrono::{DateTime, Duration, TimeZone, Utc};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(seconds)
}
