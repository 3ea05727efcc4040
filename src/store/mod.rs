//! # Vehicle Store Module
//!
//! In-memory aggregate of every record folded in per vehicle.
//!
//! This module handles:
//! - Folding session records into the per-vehicle aggregate
//! - Serializing folds per vehicle while different vehicles proceed in parallel
//! - Rendering the human-readable report

pub mod vehicle;
pub mod report;

pub use vehicle::{VehicleAggregate, VehicleStore};
