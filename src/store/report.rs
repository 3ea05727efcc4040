//! # Report Rendering
//!
//! Plain-text listing served on `GET /`:
//!
//! ```text
//! vin:
//! 			timestamp: 7284 Lat: 51.02575 Lon: 13.722881 Speed: 0.0 Altitude: 179 Satellites: 0
//! 			timestamp: 10100 ax: 2 ay: -1 az: 109
//!
//! ```
//!
//! One blank line closes every record.

use std::fmt::Write;
use std::sync::Arc;

use super::vehicle::VehicleAggregate;

/// Render all vehicles in the given order
pub fn render(vehicles: &[Arc<VehicleAggregate>]) -> String {
    let mut out = String::new();
    for vehicle in vehicles {
        // Writing into a String cannot fail
        let _ = writeln!(out, "{}: ", vehicle.vehicle_id());
        for record in vehicle.records() {
            let _ = writeln!(out, "{}", record);
        }
    }
    out
}
