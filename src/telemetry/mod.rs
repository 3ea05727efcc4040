//! # Telemetry Module
//!
//! Value types produced by the wire decoder and accumulated by sessions.
//!
//! This module handles:
//! - Acceleration samples from the dongle's accelerometer
//! - GPS fixes assembled from the `UTC/LAT/LNG/ALT/SPD/SAT` tags
//! - Sample records with first-wins merge semantics

pub mod types;

pub use types::{AccelerationSample, GpsFix, SampleRecord};
