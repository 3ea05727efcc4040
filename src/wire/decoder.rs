//! # Payload Decoder
//!
//! Decodes one dongle payload into [`SampleRecord`]s.
//!
//! The payload is scanned as one stream of comma-separated fields. A field may
//! carry text after a space: the part before the space is the field's value and
//! every whitespace-separated token after it is a timestamp marker that takes
//! effect once the current tag group is complete. So `ACC,108 0,2,3` decodes
//! the sample `(108, 2, 3)` and `109 100,ACC,...` starts a new entry at `100`.
//!
//! Every payload produces at most one record. Its identifier is the raw
//! timestamp token of the first well-formed marker, so a re-delivered payload
//! merges into the record of its first delivery instead of duplicating it.

use tracing::{debug, warn};

use super::numeric::split_trailing;
use super::protocol::{Field, Marker, Tag, FIELD_SEPARATOR, MILLIS_PER_SECOND};
use crate::telemetry::{AccelerationSample, GpsFix, SampleRecord};

/// GPS values collected across a payload until a `UTC` value makes them a fix
#[derive(Debug, Default)]
struct PendingFix {
    gps_time: Option<u64>,
    latitude: f64,
    longitude: f64,
    altitude: i32,
    speed: f64,
    satellite_count: u32,
}

impl PendingFix {
    fn finish(self) -> Option<GpsFix> {
        match self.gps_time {
            Some(gps_time) if gps_time != 0 => Some(GpsFix {
                gps_time,
                latitude: self.latitude,
                longitude: self.longitude,
                altitude: self.altitude,
                speed: self.speed,
                satellite_count: self.satellite_count,
            }),
            _ => None,
        }
    }
}

/// One comma-separated field split into its value and trailing markers
#[derive(Debug, Clone, Copy)]
struct RawField<'a> {
    value: &'a str,
    markers: &'a str,
}

impl<'a> RawField<'a> {
    fn split(raw: &'a str) -> Self {
        let (value, markers) = split_trailing(raw.trim());
        Self { value, markers }
    }
}

/// Per-call decoding state
#[derive(Debug, Default)]
struct PayloadDecoder {
    last_absolute: u64,
    /// Timestamp of the current entry; `None` while inside an entry with a bad marker
    timestamp: Option<u64>,
    identifier: Option<String>,
    accelerations: Vec<AccelerationSample>,
    fix: PendingFix,
}

impl PayloadDecoder {
    /// Resolve a marker into milliseconds, updating the base time for absolute markers
    fn resolve(&mut self, marker: Marker) -> u64 {
        match marker {
            Marker::Absolute(seconds) => {
                self.last_absolute = seconds.saturating_mul(MILLIS_PER_SECOND);
                self.last_absolute
            }
            Marker::Relative(offset) => self.last_absolute.saturating_add(offset),
        }
    }

    /// Start a new entry at `token`
    ///
    /// A malformed marker is logged and the fields up to the next marker are skipped.
    fn open_entry(&mut self, token: &str) {
        match Marker::parse(token) {
            Ok(marker) => {
                self.timestamp = Some(self.resolve(marker));
                if self.identifier.is_none() {
                    self.identifier = Some(token.to_string());
                }
            }
            Err(e) => {
                warn!("Skipping malformed entry {:?}: {}", token, e);
                self.timestamp = None;
            }
        }
    }

    fn open_entries(&mut self, markers: &str) {
        for token in markers.split_whitespace() {
            self.open_entry(token);
        }
    }

    fn apply(&mut self, timestamp: u64, field: Field) {
        match field {
            Field::Utc(gps_time) => self.fix.gps_time = Some(gps_time),
            Field::Lat(latitude) => self.fix.latitude = latitude,
            Field::Lng(longitude) => self.fix.longitude = longitude,
            Field::Alt(altitude) => self.fix.altitude = altitude,
            Field::Spd(speed) => self.fix.speed = speed,
            Field::Sat(count) => self.fix.satellite_count = count,
            Field::Acc { ax, ay, az } => self
                .accelerations
                .push(AccelerationSample::new(timestamp, ax, ay, az)),
        }
    }

    /// Consume all tag groups following the first marker
    ///
    /// An unknown tag or a bad group skips exactly one field and is logged.
    fn consume(&mut self, fields: &[RawField<'_>]) {
        let mut i = 0;
        while i < fields.len() {
            let field = fields[i];
            let Some(timestamp) = self.timestamp else {
                self.open_entries(field.markers);
                i += 1;
                continue;
            };

            if field.value.is_empty() {
                self.open_entries(field.markers);
                i += 1;
                continue;
            }

            let Some(group) = Tag::lookup(field.value) else {
                warn!("Skipping unknown tag {:?}", field.value);
                self.open_entries(field.markers);
                i += 1;
                continue;
            };

            let values: Vec<&str> = fields[i + 1..]
                .iter()
                .take(group.arity)
                .map(|f| f.value)
                .collect();

            match group.decode(&values) {
                Ok(decoded) => {
                    self.apply(timestamp, decoded);
                    for consumed in &fields[i..=i + group.arity] {
                        self.open_entries(consumed.markers);
                    }
                    i += 1 + group.arity;
                }
                Err(e) => {
                    warn!("Skipping {} group: {}", group.tag.as_str(), e);
                    self.open_entries(field.markers);
                    i += 1;
                }
            }
        }
    }

    fn finish(self) -> Vec<SampleRecord> {
        let Some(identifier) = self.identifier else {
            return Vec::new();
        };

        let mut record = SampleRecord::new(identifier);
        for sample in self.accelerations {
            record.push_acceleration(sample);
        }
        if let Some(fix) = self.fix.finish() {
            record.set_gps_fix(fix);
        }

        if record.is_empty() {
            Vec::new()
        } else {
            vec![record]
        }
    }
}

/// Decode a raw dongle payload
///
/// Never fails: malformed markers and tag groups are skipped with a warning. A
/// payload without any acceleration sample or GPS fix decodes to no records.
///
/// # Arguments
///
/// * `payload` - Raw request body as sent by the dongle
///
/// # Returns
///
/// * `Vec<SampleRecord>` - Zero or one record
///
/// # Examples
///
/// ```
/// use obd2_gateway::wire::decode;
///
/// let records = decode("#10,UTC,7284,LAT,51.025750 100,ACC,2,-1,109");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].accelerations()[0].timestamp, 10_100);
/// ```
pub fn decode(payload: &str) -> Vec<SampleRecord> {
    let mut decoder = PayloadDecoder::default();
    let mut raw = payload.split(FIELD_SEPARATOR);

    // The first field holds nothing but markers
    if let Some(first) = raw.next() {
        decoder.open_entries(first);
    }
    let fields: Vec<RawField<'_>> = raw.map(RawField::split).collect();
    decoder.consume(&fields);

    let records = decoder.finish();
    debug!("Decoded payload into {} record(s)", records.len());
    records
}
