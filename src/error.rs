//! Crate error type
//!
//! The core favors silent tolerance internally, but every mutating entry
//! point validates its inputs against the documented domains before the
//! values reach the running statistics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HivemindError {
    /// A numeric input fell outside its documented domain
    #[error("invalid {field}: {value} outside [{min}, {max}]")]
    InvalidInput {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A value that must be non-negative was negative
    #[error("invalid {field}: {value} must not be negative")]
    NegativeInput { field: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, HivemindError>;

/// Validate that `value` lies in `[min, max]`. NaN never validates.
pub(crate) fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_nan() || value < min || value > max {
        return Err(HivemindError::InvalidInput {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_nan() || value < 0.0 {
        return Err(HivemindError::NegativeInput { field, value });
    }
    Ok(())
}
