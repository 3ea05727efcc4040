//! # Per-Vehicle Aggregation
//!
//! Folding is an upsert keyed by `(session, record identifier)`: folding the
//! same session again replaces the earlier snapshot of each record in place and
//! appends only records not seen before. Repeated folds therefore never
//! duplicate data, and records keep the position of their first fold.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::debug;

use super::report;
use crate::session::{Session, SessionKey};
use crate::telemetry::SampleRecord;

#[derive(Debug, Default)]
struct FoldedRecords {
    records: Vec<SampleRecord>,
    positions: HashMap<(SessionKey, String), usize>,
}

impl FoldedRecords {
    fn upsert(&mut self, origin: SessionKey, record: &SampleRecord) {
        let key = (origin, record.identifier().to_string());
        match self.positions.get(&key).copied() {
            Some(position) => {
                if self.records[position] != *record {
                    self.records[position] = record.clone();
                }
            }
            None => {
                self.positions.insert(key, self.records.len());
                self.records.push(record.clone());
            }
        }
    }
}

/// Everything folded in for one vehicle, across all its sessions
#[derive(Debug)]
pub struct VehicleAggregate {
    vehicle_id: String,
    folded: Mutex<FoldedRecords>,
}

impl VehicleAggregate {
    fn new(vehicle_id: &str) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            folded: Mutex::new(FoldedRecords::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FoldedRecords> {
        self.folded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    /// Copy of the accumulated records in fold order
    pub fn records(&self) -> Vec<SampleRecord> {
        self.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct VehicleIndex {
    order: Vec<Arc<VehicleAggregate>>,
    by_id: HashMap<String, Arc<VehicleAggregate>>,
}

/// Process-lifetime store of all folded records, keyed by VIN
///
/// Vehicles are listed in first-fold order. Nothing is ever pruned.
///
/// # Examples
///
/// ```
/// use obd2_gateway::session::ChannelAllocator;
/// use obd2_gateway::store::VehicleStore;
/// use obd2_gateway::wire::decode;
///
/// let channels = ChannelAllocator::new();
/// let store = VehicleStore::new();
///
/// let session = channels.allocate("vin")?;
/// session.add_records(decode("#10,ACC,2,-1,109"));
/// store.fold(&session);
///
/// assert_eq!(store.vehicle("vin").map(|v| v.len()), Some(1));
/// # Ok::<(), obd2_gateway::error::GatewayError>(())
/// ```
#[derive(Debug, Default)]
pub struct VehicleStore {
    vehicles: RwLock<VehicleIndex>,
}

impl VehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the current records of `session` into its vehicle's aggregate
    ///
    /// The session lock is held for the whole fold so that concurrent folds of
    /// the same session are applied in the order their snapshots were taken.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of records in the folded snapshot
    pub fn fold(&self, session: &Session) -> usize {
        let records = session.lock();
        let aggregate = self.aggregate_for(session.vehicle_id());
        let mut folded = aggregate.lock();

        for record in records.records() {
            folded.upsert(session.key(), record);
        }

        debug!(
            "Folded {} record(s) from channel {} into VIN {} ({} total)",
            records.len(),
            session.channel_identifier(),
            session.vehicle_id(),
            folded.records.len()
        );
        records.len()
    }

    fn aggregate_for(&self, vehicle_id: &str) -> Arc<VehicleAggregate> {
        if let Some(aggregate) = self.vehicle(vehicle_id) {
            return aggregate;
        }

        let mut index = self.vehicles.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(aggregate) = index.by_id.get(vehicle_id) {
            return Arc::clone(aggregate);
        }

        let aggregate = Arc::new(VehicleAggregate::new(vehicle_id));
        index.order.push(Arc::clone(&aggregate));
        index
            .by_id
            .insert(vehicle_id.to_string(), Arc::clone(&aggregate));
        aggregate
    }

    /// Aggregate of one vehicle, if anything was ever folded for it
    pub fn vehicle(&self, vehicle_id: &str) -> Option<Arc<VehicleAggregate>> {
        self.vehicles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(vehicle_id)
            .cloned()
    }

    /// All aggregates in first-fold order
    pub fn vehicles(&self) -> Vec<Arc<VehicleAggregate>> {
        self.vehicles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }

    /// Human-readable listing of every vehicle and its records
    pub fn report(&self) -> String {
        report::render(&self.vehicles())
    }
}
