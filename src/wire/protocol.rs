//! # Dongle Protocol Constants and Types
//!
//! Core definitions for the dongle's line format.
//!
//! A payload is a sequence of entries separated by spaces. Each entry is a
//! comma-separated list starting with a timestamp marker followed by one or
//! more tag groups:
//!
//! ```text
//! #10,UTC,7284,LAT,51.025750,LNG,13.722881 100,ACC,2,-1,109
//! ^^^ absolute marker (seconds)             ^^^ relative marker (ms)
//! ```

use super::numeric::parse_field;
use crate::error::{GatewayError, Result};

/// Prefix of an absolute timestamp marker
pub const ABSOLUTE_MARKER_PREFIX: char = '#';

/// Separator between fields of one entry
pub const FIELD_SEPARATOR: char = ',';

/// Absolute markers count seconds, relative markers count milliseconds
pub const MILLIS_PER_SECOND: u64 = 1000;

/// Number of values following the `ACC` tag
pub const ACC_VALUE_COUNT: usize = 3;

/// Tags understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// GPS time in UTC epoch milliseconds
    Utc,
    /// Latitude in degrees
    Lat,
    /// Longitude in degrees
    Lng,
    /// Altitude in meters
    Alt,
    /// GPS speed
    Spd,
    /// Satellites in view
    Sat,
    /// Accelerometer triple
    Acc,
}

/// One decoded tag group with its typed payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Utc(u64),
    Lat(f64),
    Lng(f64),
    Alt(i32),
    Spd(f64),
    Sat(u32),
    Acc { ax: i32, ay: i32, az: i32 },
}

/// Dispatch table entry: tag, value count and parser
#[derive(Clone, Copy)]
pub struct TagSpec {
    pub tag: Tag,
    pub arity: usize,
    pub parse: fn(&[&str]) -> Result<Field>,
}

impl std::fmt::Debug for TagSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagSpec")
            .field("tag", &self.tag)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

fn parse_utc(values: &[&str]) -> Result<Field> {
    Ok(Field::Utc(parse_field(values[0])?))
}

fn parse_lat(values: &[&str]) -> Result<Field> {
    Ok(Field::Lat(parse_field(values[0])?))
}

fn parse_lng(values: &[&str]) -> Result<Field> {
    Ok(Field::Lng(parse_field(values[0])?))
}

fn parse_alt(values: &[&str]) -> Result<Field> {
    Ok(Field::Alt(parse_field(values[0])?))
}

fn parse_spd(values: &[&str]) -> Result<Field> {
    Ok(Field::Spd(parse_field(values[0])?))
}

fn parse_sat(values: &[&str]) -> Result<Field> {
    Ok(Field::Sat(parse_field(values[0])?))
}

fn parse_acc(values: &[&str]) -> Result<Field> {
    Ok(Field::Acc {
        ax: parse_field(values[0])?,
        ay: parse_field(values[1])?,
        az: parse_field(values[2])?,
    })
}

/// All supported tags
pub static TAG_TABLE: [TagSpec; 7] = [
    TagSpec { tag: Tag::Utc, arity: 1, parse: parse_utc },
    TagSpec { tag: Tag::Lat, arity: 1, parse: parse_lat },
    TagSpec { tag: Tag::Lng, arity: 1, parse: parse_lng },
    TagSpec { tag: Tag::Alt, arity: 1, parse: parse_alt },
    TagSpec { tag: Tag::Spd, arity: 1, parse: parse_spd },
    TagSpec { tag: Tag::Sat, arity: 1, parse: parse_sat },
    TagSpec { tag: Tag::Acc, arity: ACC_VALUE_COUNT, parse: parse_acc },
];

impl Tag {
    /// Look up the dispatch entry for a wire tag name
    pub fn lookup(name: &str) -> Option<&'static TagSpec> {
        TAG_TABLE.iter().find(|entry| entry.tag.as_str() == name)
    }

    /// Wire name of this tag
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Utc => "UTC",
            Tag::Lat => "LAT",
            Tag::Lng => "LNG",
            Tag::Alt => "ALT",
            Tag::Spd => "SPD",
            Tag::Sat => "SAT",
            Tag::Acc => "ACC",
        }
    }
}

impl TagSpec {
    /// Parse the values of one group
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedEntry`] if fewer than `arity` values are
    /// given or any of them fails to parse.
    pub fn decode(&self, values: &[&str]) -> Result<Field> {
        if values.len() < self.arity {
            return Err(GatewayError::MalformedEntry(format!(
                "{} expects {} value(s), got {}",
                self.tag.as_str(),
                self.arity,
                values.len()
            )));
        }
        (self.parse)(&values[..self.arity])
    }
}

/// Timestamp marker heading an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `#<seconds>`: sets a new base time
    Absolute(u64),
    /// `<millis>`: offset from the most recent absolute marker
    Relative(u64),
}

impl Marker {
    /// Parse a timestamp token
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedEntry`] if the token is not `#<int>` or `<int>`.
    pub fn parse(token: &str) -> Result<Self> {
        match token.strip_prefix(ABSOLUTE_MARKER_PREFIX) {
            Some(seconds) => Ok(Marker::Absolute(parse_field(seconds)?)),
            None => Ok(Marker::Relative(parse_field(token)?)),
        }
    }
}
