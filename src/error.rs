use thiserror::Error;

use crate::coord::ParsingError;
use crate::document::DocumentError;
use crate::geomag::ModelError;

/// Any failure of the annotation pipeline. All of them are fatal:
/// nothing is retried and the target file is only (re)written after a
/// fully successful run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("coordinate error: {0}")]
    Coordinate(#[from] ParsingError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
