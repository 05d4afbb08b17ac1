//! Magnetic variation annotation for navigation position documents.
//!
//! Airspace/navigation `Position` records carry their location as a
//! compact ISO 6709 coordinate string. This crate parses those strings,
//! evaluates magnetic declination there for the current date, and
//! rewrites each record's `MagneticVariation` and `Rotation` attributes
//! in place, leaving the rest of the document untouched.
//!
//! ```no_run
//! use magvar::prelude::*;
//! use magvar::epoch;
//!
//! # fn main() -> Result<(), Error> {
//! let text = std::fs::read_to_string("Positions.xml")?;
//! let mut document = Document::parse(&text)?;
//!
//! let model = Wmm::new();
//! let decimal_year = epoch::decimal_year(&chrono::Local::now());
//! let updated = Annotator::new(&model, decimal_year).annotate_document(&mut document)?;
//!
//! std::fs::write("Positions.xml", document.to_xml_string()?)?;
//! println!("{} positions updated", updated);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate lazy_static;

pub mod annotate;
pub mod coord;
pub mod document;
pub mod epoch;
pub mod error;
pub mod geomag;

pub mod prelude {
    pub use crate::{
        annotate::Annotator,
        coord::{Coordinate, Precision},
        document::{Document, Element},
        error::Error,
        geomag::{DeclinationModel, Wmm},
    };
}
