use thiserror::Error;

use crate::propagation::{DecayCause, NumericalFault};

pub type Result<T> = std::result::Result<T, Sgp4Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Sgp4Error {
    #[error("malformed TLE: {0}")]
    MalformedTle(String),

    #[error("invalid elements: {0}")]
    InvalidElements(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("satellite decayed: {0}")]
    Decayed(DecayCause),

    #[error("numerical error: {0}")]
    Numerical(NumericalFault),
}

macro_rules! malformed_tle {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::Sgp4Error::MalformedTle( format!( $fmt $(, $arg)* ))
    };
}
pub(crate) use malformed_tle;

macro_rules! invalid_elements {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::Sgp4Error::InvalidElements( format!( $fmt $(, $arg)* ))
    };
}
pub(crate) use invalid_elements;
