//! # Channel Allocator
//!
//! Assigns the smallest free channel identifier to each new session.
//!
//! The table is a slot vector indexed by channel identifier plus a min-heap of
//! released identifiers. Allocation pops the smallest released identifier or
//! appends a new slot, so the handed-out identifier is always the smallest one
//! not in use.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use super::channel::{Session, SessionKey};
use crate::error::{GatewayError, Result};

#[derive(Debug, Default)]
struct ChannelTable {
    slots: Vec<Option<Arc<Session>>>,
    released: BinaryHeap<Reverse<u32>>,
    next_serial: u64,
}

/// Thread-safe channel table
///
/// `allocate` and `release` take the write lock and are serialized; `lookup`
/// takes the read lock and only ever sees fully constructed sessions.
///
/// # Examples
///
/// ```
/// use obd2_gateway::session::ChannelAllocator;
///
/// let channels = ChannelAllocator::new();
/// let first = channels.allocate("vin")?;
/// let second = channels.allocate("vin2")?;
/// assert_eq!(first.channel_identifier(), 0);
/// assert_eq!(second.channel_identifier(), 1);
///
/// channels.release(0);
/// assert_eq!(channels.allocate("vin3")?.channel_identifier(), 0);
/// # Ok::<(), obd2_gateway::error::GatewayError>(())
/// ```
#[derive(Debug, Default)]
pub struct ChannelAllocator {
    table: RwLock<ChannelTable>,
}

impl ChannelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ChannelTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChannelTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a session for a vehicle on the smallest free channel
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidVehicleId`] if `vehicle_id` is empty or
    /// whitespace only, and [`GatewayError::ChannelsExhausted`] if every `u32`
    /// identifier is taken. Nothing is allocated in either case.
    pub fn allocate(&self, vehicle_id: &str) -> Result<Arc<Session>> {
        if vehicle_id.trim().is_empty() {
            return Err(GatewayError::InvalidVehicleId);
        }

        let mut table = self.write();
        let channel = match table.released.pop() {
            Some(Reverse(channel)) => channel,
            None => {
                let channel = slot_identifier(table.slots.len())?;
                table.slots.push(None);
                channel
            }
        };
        let serial = table.next_serial;
        table.next_serial += 1;

        let session = Arc::new(Session::new(
            SessionKey { channel, serial },
            vehicle_id.to_string(),
        ));
        table.slots[channel as usize] = Some(Arc::clone(&session));

        info!("Channel {} assigned to VIN {}", channel, vehicle_id);
        Ok(session)
    }

    /// Close a channel, making its identifier available again
    ///
    /// # Returns
    ///
    /// * `Option<Arc<Session>>` - The released session, or `None` if the channel was not active
    pub fn release(&self, channel: u32) -> Option<Arc<Session>> {
        let mut table = self.write();
        let session = table.slots.get_mut(channel as usize)?.take()?;
        table.released.push(Reverse(channel));

        info!("Channel {} of VIN {} released", channel, session.vehicle_id());
        Some(session)
    }

    /// Find the active session on a channel
    pub fn lookup(&self, channel: u32) -> Option<Arc<Session>> {
        let session = self.read().slots.get(channel as usize)?.clone();
        if session.is_none() {
            debug!("Lookup of inactive channel {}", channel);
        }
        session
    }

    /// All active sessions ordered by channel identifier
    pub fn active(&self) -> Vec<Arc<Session>> {
        self.read().slots.iter().flatten().cloned().collect()
    }

    /// Number of active channels
    pub fn len(&self) -> usize {
        self.read().slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identifier of the slot appended at index `len`
fn slot_identifier(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| GatewayError::ChannelsExhausted)
}
