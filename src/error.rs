//! Errors reported by the projection core.
//!
//! Per-bin anomalies (rejected samples, empty matrix rows) are not errors:
//! they are handled where they occur. Everything here is either a set-up
//! failure reported to the caller, or a programmer error which must not be
//! swallowed.

use thiserror::Error;

use crate::projdata::BinKey;

pub type Result<T> = std::result::Result<T, ProjError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjError {
    /// An index lies outside the ranges declared by the geometry descriptor
    #[error("{what} {value} is out of range [{min}, {max}]")]
    OutOfRange { what: &'static str, value: i32, min: i32, max: i32 },

    /// Image and projection-data geometries disagree
    #[error("geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// Element-wise combination of objects with different characteristics
    #[error("characteristics mismatch: {0}")]
    CharacteristicsMismatch(String),

    /// Internal invariant of a projection matrix (or its cache) violated
    #[error("projection matrix inconsistency: {0}")]
    CacheInconsistency(String),

    /// A row was requested directly for a bin which is not basic
    #[error("bin {0:?} is not basic under the symmetries in use")]
    NotBasic(BinKey),

    #[error("{0} used before a successful set_up")]
    NotSetUp(&'static str),

    #[error("unknown {kind} `{name}`")]
    UnknownName { kind: &'static str, name: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProjError {
    pub(crate) fn out_of_range(what: &'static str, value: i32, range: &std::ops::RangeInclusive<i32>) -> Self {
        Self::OutOfRange { what, value, min: *range.start(), max: *range.end() }
    }
}

/// Fail with `OutOfRange` unless `value` lies in `range`
pub(crate) fn check_range(what: &'static str, value: i32, range: &std::ops::RangeInclusive<i32>) -> Result<()> {
    if range.contains(&value) { Ok(()) }
    else { Err(ProjError::out_of_range(what, value, range)) }
}
