//! # OBD2 Gateway Library
//!
//! Collect telemetry from OBD-II/GPS logging dongles over HTTP.
//!
//! This library provides the decoding-and-aggregation pipeline: the dongle's
//! line protocol decoder, the channel allocator multiplexing concurrent dongles,
//! per-session merge of repeated samples and the per-vehicle store.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod wire;
