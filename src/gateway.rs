//! # Gateway
//!
//! The operations the HTTP front end calls: open a channel, ingest a payload,
//! close a channel and render the report.
//!
//! ## Ingest flow
//!
//! 1. Look up the session; unknown channels fail before anything is decoded
//! 2. Decode the payload (malformed entries are skipped, never fatal)
//! 3. Merge the decoded records into the session under one lock acquisition
//! 4. Fold the session into the record sink

use std::sync::Arc;

use tracing::debug;

use crate::error::{GatewayError, Result};
use crate::session::{ChannelAllocator, Session};
use crate::store::VehicleStore;
use crate::wire::decode;

/// Destination of session folds
#[cfg_attr(test, mockall::automock)]
pub trait RecordSink: Send + Sync {
    /// Fold the current records of `session`
    fn fold(&self, session: &Session);
}

impl RecordSink for VehicleStore {
    fn fold(&self, session: &Session) {
        VehicleStore::fold(self, session);
    }
}

/// Composition root of the channel table and the record sink
#[derive(Debug)]
pub struct Gateway<S = VehicleStore> {
    channels: ChannelAllocator,
    sink: S,
}

impl Default for Gateway<VehicleStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway<VehicleStore> {
    /// Create a gateway backed by an in-memory [`VehicleStore`]
    pub fn new() -> Self {
        Self::with_sink(VehicleStore::new())
    }

    /// Render every vehicle and its accumulated records
    pub fn report(&self) -> String {
        self.sink.report()
    }
}

impl<S: RecordSink> Gateway<S> {
    /// Create a gateway folding into a custom sink
    pub fn with_sink(sink: S) -> Self {
        Self {
            channels: ChannelAllocator::new(),
            sink,
        }
    }

    pub fn channels(&self) -> &ChannelAllocator {
        &self.channels
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Open a channel for a vehicle
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidVehicleId`] if `vehicle_id` is blank.
    pub fn new_channel(&self, vehicle_id: &str) -> Result<u32> {
        debug!("Received request for new channel with VIN {:?}", vehicle_id);
        let session = self.channels.allocate(vehicle_id)?;
        Ok(session.channel_identifier())
    }

    /// Decode a payload, merge it into the channel's session and fold the session
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of records decoded from the payload
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownChannel`] if the channel is not active.
    /// Nothing is decoded, merged or folded in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use obd2_gateway::gateway::Gateway;
    ///
    /// let gateway = Gateway::new();
    /// let channel = gateway.new_channel("vin")?;
    /// gateway.ingest(channel, "#10,UTC,7284,LAT,51.0 100,ACC,2,-1,109")?;
    /// assert!(gateway.report().starts_with("vin: \n"));
    /// # Ok::<(), obd2_gateway::error::GatewayError>(())
    /// ```
    pub fn ingest(&self, channel: u32, payload: &str) -> Result<usize> {
        debug!("Received data for channel {}", channel);
        let session = self.session(channel)?;

        let records = decode(payload);
        let decoded = records.len();
        session.add_records(records);
        self.sink.fold(&session);

        debug!(
            "Channel {} holds {} record(s) after ingest",
            channel,
            session.record_count()
        );
        Ok(decoded)
    }

    /// Close a channel; its identifier becomes available again
    ///
    /// Records already folded stay in the sink.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownChannel`] if the channel is not active.
    pub fn close_channel(&self, channel: u32) -> Result<()> {
        self.channels
            .release(channel)
            .map(|_| ())
            .ok_or(GatewayError::UnknownChannel(channel))
    }

    fn session(&self, channel: u32) -> Result<Arc<Session>> {
        self.channels
            .lookup(channel)
            .ok_or(GatewayError::UnknownChannel(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_new_channel_returns_smallest_free_identifier() {
        let gateway = Gateway::new();
        assert_eq!(assert_ok!(gateway.new_channel("vin")), 0);
        assert_eq!(assert_ok!(gateway.new_channel("vin2")), 1);
        assert_eq!(assert_ok!(gateway.new_channel("vin3")), 2);

        assert_ok!(gateway.close_channel(0));
        assert_eq!(assert_ok!(gateway.new_channel("vin4")), 0);
    }

    #[test]
    fn test_new_channel_rejects_blank_vin() {
        let gateway = Gateway::new();
        assert!(matches!(
            assert_err!(gateway.new_channel(" ")),
            GatewayError::InvalidVehicleId
        ));
        assert!(gateway.channels().is_empty());
    }

    #[test]
    fn test_ingest_unknown_channel_never_reaches_sink() {
        let mut sink = MockRecordSink::new();
        sink.expect_fold().never();

        let gateway = Gateway::with_sink(sink);
        let err = assert_err!(gateway.ingest(3, "#10,ACC,2,-1,109"));
        assert!(matches!(err, GatewayError::UnknownChannel(3)));
    }

    #[test]
    fn test_ingest_folds_once_per_post() {
        let mut sink = MockRecordSink::new();
        sink.expect_fold().with(always()).times(2).return_const(());

        let gateway = Gateway::with_sink(sink);
        let channel = assert_ok!(gateway.new_channel("vin"));
        assert_eq!(assert_ok!(gateway.ingest(channel, "#10,ACC,2,-1,109")), 1);
        assert_eq!(assert_ok!(gateway.ingest(channel, "garbage")), 0);
    }

    #[test]
    fn test_ingest_unknown_channel_leaves_store_unchanged() {
        let gateway = Gateway::new();
        let channel = assert_ok!(gateway.new_channel("vin"));
        assert_ok!(gateway.ingest(channel, "#10,ACC,2,-1,109"));
        let before = gateway.report();

        assert_err!(gateway.ingest(channel + 1, "#11,ACC,1,1,1"));
        assert_eq!(gateway.report(), before);
    }

    #[test]
    fn test_ingest_after_close_fails() {
        let gateway = Gateway::new();
        let channel = assert_ok!(gateway.new_channel("vin"));
        assert_ok!(gateway.close_channel(channel));

        assert!(matches!(
            assert_err!(gateway.ingest(channel, "#10,ACC,2,-1,109")),
            GatewayError::UnknownChannel(_)
        ));
        assert!(matches!(
            assert_err!(gateway.close_channel(channel)),
            GatewayError::UnknownChannel(_)
        ));
    }

    #[test]
    fn test_end_to_end_report() {
        let gateway = Gateway::new();
        let channel = assert_ok!(gateway.new_channel("vin"));
        assert_ok!(gateway.ingest(
            channel,
            "#10,UTC,7284,LAT,51.025750,LNG,13.722881,ALT,179,SAT,0 100,ACC,2,-1,109 200,ACC,1,0,110"
        ));

        let report = gateway.report();
        assert_eq!(
            report,
            "vin: \n\
             \t\t\ttimestamp: 7284 Lat: 51.02575 Lon: 13.722881 Speed: 0.0 Altitude: 179 Satellites: 0\n\
             \t\t\ttimestamp: 10100 ax: 2 ay: -1 az: 109\n\
             \t\t\ttimestamp: 10200 ax: 1 ay: 0 az: 110\n\
             \n"
        );
    }

    #[test]
    fn test_redelivered_payload_merges_into_one_record() {
        let gateway = Gateway::new();
        let channel = assert_ok!(gateway.new_channel("vin"));
        let payload = "#10,UTC,7284,LAT,51.0 100,ACC,2,-1,109";
        assert_ok!(gateway.ingest(channel, payload));
        assert_ok!(gateway.ingest(channel, "#10,UTC,9999,LAT,12.0 300,ACC,5,5,5"));

        let vehicle = gateway.sink().vehicle("vin").unwrap();
        let records = vehicle.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gps_fix().unwrap().gps_time, 7284);
        assert_eq!(records[0].accelerations().len(), 2);
    }

    #[test]
    fn test_records_survive_close() {
        let gateway = Gateway::new();
        let channel = assert_ok!(gateway.new_channel("vin"));
        assert_ok!(gateway.ingest(channel, "#10,ACC,2,-1,109"));
        assert_ok!(gateway.close_channel(channel));

        assert!(gateway.report().contains("ax: 2 ay: -1 az: 109"));
    }
}
