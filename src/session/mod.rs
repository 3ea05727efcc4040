//! # Session Module
//!
//! Multiplexes concurrently connected dongles onto small integer channels.
//!
//! This module handles:
//! - Allocating the smallest free channel identifier for a vehicle
//! - Releasing identifiers for reuse
//! - Per-channel record storage with merge-on-insert

pub mod allocator;
pub mod channel;

pub use allocator::ChannelAllocator;
pub use channel::{Session, SessionKey, SessionRecords};
