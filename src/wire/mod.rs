//! # Dongle Wire Format Module
//!
//! Implementation of the compact text line protocol emitted by the OBD-II/GPS dongle.
//!
//! This module handles:
//! - Splitting a payload into comma-separated fields and space-separated entries
//! - Absolute (`#<seconds>`) and relative (`<millis>`) timestamp markers
//! - Tag dispatch for `UTC`, `LAT`, `LNG`, `ALT`, `SPD`, `SAT` and `ACC`
//! - Tolerant numeric parsing of device values such as `"108 0"`

pub mod protocol;
pub mod numeric;
pub mod decoder;

pub use decoder::decode;
