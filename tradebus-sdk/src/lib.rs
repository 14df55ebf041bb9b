//! Shared objects for tradebus.
//!
//! Everything in here is plain data: channel names, routing keys, payloads
//! and validated configuration. The engine itself lives in `tradebus-core`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod config;
pub mod objects;
