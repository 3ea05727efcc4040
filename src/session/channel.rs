//! # Session
//!
//! One allocated channel and the records received through it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::telemetry::SampleRecord;

/// Process-unique key of a session
///
/// Channel identifiers are reused after release, so `serial` tells two sessions
/// on the same channel apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Channel identifier handed to the dongle
    pub channel: u32,

    /// Monotonic allocation counter
    pub serial: u64,
}

/// Records of one session, keyed by record identifier in insertion order
#[derive(Debug, Default)]
pub struct SessionRecords {
    records: Vec<SampleRecord>,
    index: HashMap<String, usize>,
}

impl SessionRecords {
    /// Insert a record, merging it into an existing one with the same identifier
    pub fn add_record(&mut self, record: SampleRecord) {
        let existing = self.index.get(record.identifier()).copied();
        match existing {
            Some(position) => self.records[position].merge_from(record),
            None => {
                self.index
                    .insert(record.identifier().to_string(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Insert records one by one in the given order
    pub fn add_records<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = SampleRecord>,
    {
        for record in records {
            self.add_record(record);
        }
    }

    /// All records in first-insertion order
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An allocated channel bound to a vehicle
///
/// Identity fields are immutable; the record map sits behind a mutex so posts
/// to the same channel serialize their merges.
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    vehicle_id: String,
    opened_at: DateTime<Utc>,
    records: Mutex<SessionRecords>,
}

impl Session {
    pub(crate) fn new(key: SessionKey, vehicle_id: String) -> Self {
        Self {
            key,
            vehicle_id,
            opened_at: Utc::now(),
            records: Mutex::new(SessionRecords::default()),
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn channel_identifier(&self) -> u32 {
        self.key.channel
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Lock the record map
    ///
    /// A poisoned lock is recovered: every mutation leaves the map consistent.
    pub fn lock(&self) -> MutexGuard<'_, SessionRecords> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge one record into this session
    pub fn add_record(&self, record: SampleRecord) {
        self.lock().add_record(record);
    }

    /// Merge a batch of records under a single lock acquisition
    pub fn add_records<I>(&self, records: I)
    where
        I: IntoIterator<Item = SampleRecord>,
    {
        self.lock().add_records(records);
    }

    /// Copy of the current records
    pub fn snapshot(&self) -> Vec<SampleRecord> {
        self.lock().records().to_vec()
    }

    pub fn record_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{AccelerationSample, GpsFix};

    fn session() -> Session {
        Session::new(SessionKey { channel: 0, serial: 0 }, "vin".to_string())
    }

    fn record(identifier: &str, ax: i32, gps_time: Option<u64>) -> SampleRecord {
        let mut record = SampleRecord::new(identifier);
        record.push_acceleration(AccelerationSample::new(10_000, ax, 0, 0));
        if let Some(gps_time) = gps_time {
            record.set_gps_fix(GpsFix {
                gps_time,
                latitude: 51.0,
                longitude: 13.0,
                altitude: 179,
                speed: 0.0,
                satellite_count: 4,
            });
        }
        record
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = session();
        assert_eq!(session.channel_identifier(), 0);
        assert_eq!(session.vehicle_id(), "vin");
        assert_eq!(session.record_count(), 0);
    }

    #[test]
    fn test_distinct_identifiers_are_inserted() {
        let session = session();
        session.add_record(record("#1", 1, None));
        session.add_record(record("#2", 2, None));
        assert_eq!(session.record_count(), 2);
    }

    #[test]
    fn test_same_identifier_is_merged() {
        let session = session();
        session.add_record(record("#1", 1, Some(100)));
        session.add_record(record("#1", 2, Some(200)));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 1);
        let xs: Vec<i32> = snapshot[0].accelerations().iter().map(|s| s.ax).collect();
        assert_eq!(xs, vec![1, 2]);
        assert_eq!(snapshot[0].gps_fix().unwrap().gps_time, 100);
    }

    #[test]
    fn test_batch_order_decides_precedence() {
        let session = session();
        session.add_records(vec![
            record("#1", 1, None),
            record("#1", 2, Some(200)),
            record("#1", 3, Some(300)),
        ]);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 1);
        let merged = &snapshot[0];
        assert_eq!(merged.gps_fix().unwrap().gps_time, 200);
        assert_eq!(merged.accelerations().len(), 3);
    }

    #[test]
    fn test_records_keep_first_insertion_order() {
        let session = session();
        session.add_records(vec![
            record("#2", 2, None),
            record("#1", 1, None),
            record("#2", 3, None),
        ]);

        let ids: Vec<String> = session
            .snapshot()
            .iter()
            .map(|r| r.identifier().to_string())
            .collect();
        assert_eq!(ids, vec!["#2", "#1"]);
    }

    #[test]
    fn test_concurrent_posts_do_not_lose_updates() {
        use std::sync::Arc;
        use std::thread;

        let session = Arc::new(session());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for _ in 0..50 {
                        session.add_record(record("#1", i, None));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].accelerations().len(), 400);
    }
}
