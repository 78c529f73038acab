//! Error types and input validation for surrogate generation.
//!
//! All operations in this crate fail fast: the violating precondition is
//! reported before any randomness is consumed or any output allocated,
//! rather than surfacing later as an index panic or NaN propagation.

use nalgebra::DMatrix;
use thiserror::Error;

/// Error types for surrogate-series operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum SurrogateError {
    /// Input matrix is empty or has zero channels/samples.
    #[error("Invalid input shape: {rows}x{cols} matrix, need at least one sample and one channel")]
    InvalidInputShape {
        /// Number of rows (time samples) in the offending input
        rows: usize,
        /// Number of columns (channels) in the offending input
        cols: usize,
    },

    /// Channel too short for the Fourier-based derivation to be well-defined.
    #[error("Insufficient samples: need at least {required} per channel, got {actual}")]
    InsufficientSamples {
        /// Minimum required samples per channel
        required: usize,
        /// Actual number of samples provided
        actual: usize,
    },

    /// Invalid auxiliary argument (permutation, phase vector, transform size).
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Numerical precondition violated (non-finite input values).
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for the failure
        reason: String,
    },

    /// Discrete Fourier transform could not be planned at the requested size.
    #[error("FFT computation failed: input size {size} not supported")]
    FftError {
        /// Transform size that was rejected
        size: usize,
    },

    /// Shared random-source state could not be accessed.
    #[error("Concurrent access failed: {resource}")]
    ConcurrencyError {
        /// Resource that couldn't be accessed
        resource: String,
    },
}

/// Result type for surrogate-series operations.
pub type SurrogateResult<T> = Result<T, SurrogateError>;

/// Validates that a matrix has at least one sample and one channel.
///
/// # Example
/// ```rust
/// use nalgebra::DMatrix;
/// use surrogate_series::errors::validate_matrix_shape;
///
/// let x = DMatrix::from_column_slice(3, 1, &[1.0, 2.0, 3.0]);
/// assert!(validate_matrix_shape(&x).is_ok());
/// assert!(validate_matrix_shape(&DMatrix::<f64>::zeros(0, 0)).is_err());
/// ```
pub fn validate_matrix_shape(x: &DMatrix<f64>) -> SurrogateResult<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(SurrogateError::InvalidInputShape {
            rows: x.nrows(),
            cols: x.ncols(),
        });
    }
    Ok(())
}

/// Validates that a channel has sufficient length for an analysis.
///
/// # Example
/// ```rust
/// use surrogate_series::errors::validate_channel_length;
///
/// assert!(validate_channel_length(8, 4, "phase randomization").is_ok());
/// assert!(validate_channel_length(3, 4, "phase randomization").is_err());
/// ```
pub fn validate_channel_length(
    actual: usize,
    min_required: usize,
    _operation: &str,
) -> SurrogateResult<()> {
    if actual < min_required {
        Err(SurrogateError::InsufficientSamples {
            required: min_required,
            actual,
        })
    } else {
        Ok(())
    }
}

/// Validates that all values in a slice are finite.
///
/// Returns on the first non-finite value; rank comparisons over NaN would
/// otherwise produce an arbitrary ordering instead of a clear failure.
///
/// # Example
/// ```rust
/// use surrogate_series::errors::validate_all_finite;
///
/// assert!(validate_all_finite(&[1.0, 2.0, 3.0], "test").is_ok());
/// assert!(validate_all_finite(&[1.0, f64::NAN], "test").is_err());
/// ```
pub fn validate_all_finite(data: &[f64], name: &str) -> SurrogateResult<()> {
    if let Some((i, &value)) = data.iter().enumerate().find(|(_, &v)| !v.is_finite()) {
        let value_desc = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
        return Err(SurrogateError::NumericalError {
            reason: format!(
                "{} contains non-finite value at index {}: {}",
                name, i, value_desc
            ),
        });
    }
    Ok(())
}

/// Validates a time-series matrix in full: shape first, then finiteness.
pub fn validate_input_matrix(x: &DMatrix<f64>) -> SurrogateResult<()> {
    validate_matrix_shape(x)?;
    validate_all_finite(x.as_slice(), "input matrix")
}
