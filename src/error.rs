use thiserror::Error;

use gnss_rs::{
    constellation::ParsingError as ConstellationParsingError, sv::ParsingError as SVParsingError,
};

/// Errors that may rise while parsing a single line or field
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("header delimiter not found")]
    MissingHeaderDelimiter,
    #[error("invalid version")]
    VersionParsing,
    #[error("invalid or unknown file type")]
    TypeParsing,
    #[error("invalid date/time")]
    DateTimeParsing,
    #[error("invalid satellite identifier")]
    SatelliteParsing,
    #[error("missing or invalid field \"{0}\"")]
    MissingField(&'static str),
    #[error("line is too short")]
    LineTooShort,
    #[error("constellation parsing error: {0}")]
    ConstellationParsing(#[from] ConstellationParsingError),
    #[error("sv parsing error: {0}")]
    SVParsing(#[from] SVParsingError),
}

/// Crate level errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("parsing error: {0}")]
    Parsing(#[from] ParsingError),
    #[error("unknown or unsupported input format")]
    UnknownFormat,
    #[error("file i/o error: {0}")]
    IoError(#[from] std::io::Error),
    /// Trilateration needs at least 4 (satellite, range) pairs
    #[error("insufficient observations: {0} < 4")]
    InsufficientObservations(usize),
    /// Measurement standard deviation must be strictly positive
    #[error("invalid measurement standard deviation: {0} m")]
    InvalidSigma(f64),
    #[error("satellite positions and ranges must have the same length")]
    DimensionMismatch,
    /// Degenerate geometry (for example coplanar satellites)
    #[error("failed to invert matrix")]
    MatrixInversion,
}
