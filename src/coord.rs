//! ISO 6709 positional coordinate strings.
//!
//! Supported encodings, from coarse to fine:
//! - degrees: `±DD.DDDD±DDD.DDDD`
//! - degrees + minutes: `±DDMM.MMMM±DDDMM.MMMM`
//! - degrees + minutes + seconds: `±DDMMSS.SSSS±DDDMMSS.SSSS`
//!
//! all three with an optional trailing signed altitude (`±AAA.AAA`).
//! There is no tier marker: the fixed field widths (2 digit latitude
//! degrees, 3 digit longitude degrees, 2 digits per minute/second group)
//! are what tells minutes apart from degrees.
use regex::{Captures, Regex};
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    static ref ISO6709_RE: Regex = Regex::new(
        r"(?x)
        ^
        (?P<lat_sign>[+-])
        (?P<lat_deg>\d{2}(?:\.\d+)?)
        (?P<lat_min>\d{2}(?:\.\d+)?)?
        (?P<lat_sec>\d{2}(?:\.\d+)?)?
        (?P<lon_sign>[+-])
        (?P<lon_deg>\d{3}(?:\.\d+)?)
        (?P<lon_min>\d{2}(?:\.\d+)?)?
        (?P<lon_sec>\d{2}(?:\.\d+)?)?
        (?P<alt>[+-]\d+(?:\.\d+)?)?
        $",
    )
    .unwrap();
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    /// Input does not reduce to exactly one of the three precision tiers.
    #[error("invalid ISO 6709 coordinate format: \"{0}\"")]
    InvalidFormat(String),
}

/// Geodetic position in decimal degrees, produced by parsing an
/// ISO 6709 string.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees, positive north
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east
    pub longitude: f64,
    /// Altitude as encoded, if the string carried one.
    /// Consumers that need a number decide the default themselves.
    pub altitude: Option<f64>,
}

/// The three nested precision tiers of the textual encoding
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precision {
    Degrees,
    DegreesMinutes,
    DegreesMinutesSeconds,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Re-encodes Self at the requested precision tier,
    /// with the altitude field appended when present.
    pub fn to_iso6709(&self, precision: Precision) -> String {
        let lat = encode_axis(self.latitude, 2, precision);
        let lon = encode_axis(self.longitude, 3, precision);
        match self.altitude {
            Some(alt) => format!("{}{}{:+}", lat, lon, alt),
            None => format!("{}{}", lat, lon),
        }
    }
}

impl FromStr for Coordinate {
    type Err = ParsingError;
    /// Parses any of the three precision tiers.
    /// The grammar is enforced strictly (no partial matches), but the
    /// numeric range is not: |latitude| > 90° or |longitude| > 180°
    /// pass through untouched, consistent with the encoding being
    /// positional rather than semantic.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = ISO6709_RE
            .captures(s)
            .ok_or_else(|| ParsingError::InvalidFormat(s.to_string()))?;

        let latitude = axis_value(&caps, "lat_sign", "lat_deg", "lat_min", "lat_sec")
            .ok_or_else(|| ParsingError::InvalidFormat(s.to_string()))?;
        let longitude = axis_value(&caps, "lon_sign", "lon_deg", "lon_min", "lon_sec")
            .ok_or_else(|| ParsingError::InvalidFormat(s.to_string()))?;
        let altitude = match caps.name("alt") {
            Some(alt) => Some(
                alt.as_str()
                    .parse::<f64>()
                    .map_err(|_| ParsingError::InvalidFormat(s.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }
}

/// Decodes one axis: degrees, plus minutes/60 and seconds/3600 when the
/// respective groups matched, sign applied last.
fn axis_value(caps: &Captures, sign: &str, deg: &str, min: &str, sec: &str) -> Option<f64> {
    let sign = if &caps[sign] == "-" { -1.0 } else { 1.0 };
    let mut value = caps.name(deg)?.as_str().parse::<f64>().ok()?;
    if let Some(min) = caps.name(min) {
        value += min.as_str().parse::<f64>().ok()? / 60.0;
        if let Some(sec) = caps.name(sec) {
            value += sec.as_str().parse::<f64>().ok()? / 3600.0;
        }
    }
    Some(sign * value)
}

fn encode_axis(value: f64, deg_width: usize, precision: Precision) -> String {
    let sign = if value < 0.0 { '-' } else { '+' };
    let abs = value.abs();
    match precision {
        Precision::Degrees => format!("{}{:0w$.4}", sign, abs, w = deg_width + 5),
        Precision::DegreesMinutes => {
            let mut degrees = abs.trunc();
            let mut minutes = (abs - degrees) * 60.0;
            if minutes >= 59.99995 {
                // would print as 60.0000
                degrees += 1.0;
                minutes = 0.0;
            }
            format!("{}{:0w$}{:07.4}", sign, degrees as u32, minutes, w = deg_width)
        },
        Precision::DegreesMinutesSeconds => {
            let mut degrees = abs.trunc();
            let total_minutes = (abs - degrees) * 60.0;
            let mut minutes = total_minutes.trunc();
            let mut seconds = (total_minutes - minutes) * 60.0;
            if seconds >= 59.995 {
                minutes += 1.0;
                seconds = 0.0;
            }
            if minutes >= 60.0 {
                degrees += 1.0;
                minutes = 0.0;
            }
            format!(
                "{}{:0w$}{:02}{:05.2}",
                sign,
                degrees as u32,
                minutes as u32,
                seconds,
                w = deg_width
            )
        },
    }
}
