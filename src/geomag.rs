//! Geomagnetic declination, consumed as an external model.
use thiserror::Error;

use world_magnetic_model::time::Date;
use world_magnetic_model::uom::si::angle::degree;
use world_magnetic_model::uom::si::f32::{Angle, Length};
use world_magnetic_model::uom::si::length::kilometer;
use world_magnetic_model::GeomagneticField;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Decimal year does not map onto a calendar date the model accepts
    #[error("invalid model date: {0}")]
    InvalidDate(String),
    /// The model rejected the query (date outside the coefficient epoch,
    /// altitude outside the valid band, ..)
    #[error("declination model error: {0}")]
    Rejected(String),
}

/// Declination provider: signed angle between true and magnetic north,
/// in degrees, at a location and moment in time.
///
/// The coefficient table and spherical harmonic evaluation behind it are
/// the implementor's business; the annotation pipeline only consumes
/// this signature, which is what the tests substitute.
pub trait DeclinationModel {
    /// Latitude/longitude in decimal degrees, altitude in kilometers
    /// above the WGS84 ellipsoid, time as a decimal year.
    fn declination(
        &self,
        latitude: f64,
        longitude: f64,
        altitude_km: f64,
        decimal_year: f64,
    ) -> Result<f64, ModelError>;
}

/// NOAA World Magnetic Model backend.
///
/// Coefficients ship with the `world_magnetic_model` crate and are
/// initialized once; the table is read-only for the rest of the run.
#[derive(Debug, Default)]
pub struct Wmm {}

impl Wmm {
    pub fn new() -> Self {
        Self {}
    }
}

impl DeclinationModel for Wmm {
    fn declination(
        &self,
        latitude: f64,
        longitude: f64,
        altitude_km: f64,
        decimal_year: f64,
    ) -> Result<f64, ModelError> {
        let date = date_from_decimal_year(decimal_year)?;
        let field = GeomagneticField::new(
            Length::new::<kilometer>(altitude_km as f32),
            Angle::new::<degree>(latitude as f32),
            Angle::new::<degree>(longitude as f32),
            date,
        )
        .map_err(|e| ModelError::Rejected(format!("{:?}", e)))?;
        Ok(field.declination().get::<degree>() as f64)
    }
}

/// Truncates a decimal year back to the calendar day it falls in.
/// Day resolution is enough: the field drifts arcminutes per year.
fn date_from_decimal_year(decimal_year: f64) -> Result<Date, ModelError> {
    let year = decimal_year.floor() as i32;
    let days: u16 = if is_leap_year(year) { 366 } else { 365 };
    let ordinal = ((decimal_year - year as f64) * days as f64) as u16 + 1;
    let ordinal = ordinal.min(days);
    Date::from_ordinal_date(year, ordinal).map_err(|e| ModelError::InvalidDate(e.to_string()))
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}
