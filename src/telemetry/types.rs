//! # Telemetry Value Types
//!
//! Immutable sensor readings and the [`SampleRecord`] that groups them.

use std::fmt;

/// Accelerometer reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccelerationSample {
    /// Milliseconds since the device epoch (absolute marker base plus relative offset)
    pub timestamp: u64,

    /// Acceleration in device local x direction
    pub ax: i32,

    /// Acceleration in device local y direction
    pub ay: i32,

    /// Acceleration in device local z direction
    pub az: i32,
}

impl AccelerationSample {
    /// Create a new acceleration sample
    pub fn new(timestamp: u64, ax: i32, ay: i32, az: i32) -> Self {
        Self { timestamp, ax, ay, az }
    }
}

impl fmt::Display for AccelerationSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp: {} ax: {} ay: {} az: {}",
            self.timestamp, self.ax, self.ay, self.az
        )
    }
}

/// GPS fix assembled from one payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    /// GPS time as a UTC timestamp (never zero)
    pub gps_time: u64,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in meters
    pub altitude: i32,

    /// Ground speed as reported by the receiver
    pub speed: f64,

    /// Number of satellites in view
    pub satellite_count: u32,
}

impl fmt::Display for GpsFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp: {} Lat: {:?} Lon: {:?} Speed: {:?} Altitude: {} Satellites: {}",
            self.gps_time,
            self.latitude,
            self.longitude,
            self.speed,
            self.altitude,
            self.satellite_count
        )
    }
}

/// One logical sample: the acceleration readings and optional GPS fix of a payload
///
/// Records sharing an [`identifier`](SampleRecord::identifier) describe the same
/// logical sample and are folded together with [`SampleRecord::merge_from`].
///
/// # Examples
///
/// ```
/// use obd2_gateway::telemetry::{AccelerationSample, SampleRecord};
///
/// let mut existing = SampleRecord::new("#10");
/// existing.push_acceleration(AccelerationSample::new(10_000, 1, 2, 3));
///
/// let mut incoming = SampleRecord::new("#10");
/// incoming.push_acceleration(AccelerationSample::new(10_100, 4, 5, 6));
///
/// existing.merge_from(incoming);
/// assert_eq!(existing.accelerations().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    identifier: String,
    accelerations: Vec<AccelerationSample>,
    gps_fix: Option<GpsFix>,
}

impl SampleRecord {
    /// Create an empty record
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            accelerations: Vec::new(),
            gps_fix: None,
        }
    }

    /// Merge key of this record
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Acceleration samples in insertion order
    pub fn accelerations(&self) -> &[AccelerationSample] {
        &self.accelerations
    }

    /// GPS fix, if one was ever attached
    pub fn gps_fix(&self) -> Option<&GpsFix> {
        self.gps_fix.as_ref()
    }

    /// True if the record carries neither samples nor a fix
    pub fn is_empty(&self) -> bool {
        self.accelerations.is_empty() && self.gps_fix.is_none()
    }

    /// Append an acceleration sample
    pub fn push_acceleration(&mut self, sample: AccelerationSample) {
        self.accelerations.push(sample);
    }

    /// Attach a GPS fix unless one is already present
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if the fix was adopted, `false` if an earlier fix was kept
    pub fn set_gps_fix(&mut self, fix: GpsFix) -> bool {
        if self.gps_fix.is_some() {
            return false;
        }
        self.gps_fix = Some(fix);
        true
    }

    /// Fold `incoming` into this record
    ///
    /// Samples are appended in order without deduplication. The existing GPS fix
    /// always wins; the incoming one is adopted only when none is set yet.
    pub fn merge_from(&mut self, incoming: SampleRecord) {
        self.accelerations.extend(incoming.accelerations);
        if let Some(fix) = incoming.gps_fix {
            self.set_gps_fix(fix);
        }
    }
}

impl fmt::Display for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(fix) = &self.gps_fix {
            writeln!(f, "\t\t\t{}", fix)?;
        }
        for sample in &self.accelerations {
            writeln!(f, "\t\t\t{}", sample)?;
        }
        Ok(())
    }
}
