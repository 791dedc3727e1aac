//! Input validation utilities.
//!
//! These checks run at module boundaries so malformed values surface as
//! [`SwapError`]s instead of panics deep inside a stage.

use crate::core::errors::SwapError;

/// Validates that a float value is finite (not NaN or infinite).
#[inline]
pub fn validate_finite(value: f32, param_name: &str) -> Result<(), SwapError> {
    if !value.is_finite() {
        return Err(SwapError::invalid_input(format!(
            "Parameter '{param_name}' must be finite, got: {value}"
        )));
    }
    Ok(())
}

/// Validates that a value is within a specified range (inclusive).
#[inline]
pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    value: T,
    min: T,
    max: T,
    param_name: &str,
) -> Result<(), SwapError> {
    if value < min || value > max {
        return Err(SwapError::invalid_input(format!(
            "Parameter '{param_name}' must be in range [{min}, {max}], got: {value}"
        )));
    }
    Ok(())
}

/// Validates that a value is positive (> 0).
#[inline]
pub fn validate_positive<T: PartialOrd + std::fmt::Display + Default>(
    value: T,
    param_name: &str,
) -> Result<(), SwapError> {
    if value <= T::default() {
        return Err(SwapError::invalid_input(format!(
            "Parameter '{param_name}' must be positive, got: {value}"
        )));
    }
    Ok(())
}

/// Validates that every element of a slice is finite, reporting the first bad index.
pub fn validate_all_finite(values: &[f32], name: &str) -> Result<(), SwapError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(SwapError::invalid_input(format!(
            "'{name}' contains non-finite value {} at index {idx}",
            values[idx]
        ))),
        None => Ok(()),
    }
}

/// Validates image dimensions.
pub fn validate_image_dimensions(width: u32, height: u32, context: &str) -> Result<(), SwapError> {
    if height == 0 || width == 0 {
        return Err(SwapError::invalid_input(format!(
            "{context}: image dimensions must be positive, got {width}x{height}"
        )));
    }

    // Upper bound keeps a single decode from exhausting memory.
    const MAX_DIMENSION: u32 = 16384;
    if height > MAX_DIMENSION || width > MAX_DIMENSION {
        return Err(SwapError::invalid_input(format!(
            "{context}: image dimensions exceed maximum of {MAX_DIMENSION}x{MAX_DIMENSION}, got {width}x{height}"
        )));
    }

    Ok(())
}

/// Validates a model output shape against an expected pattern.
///
/// `None` entries in `expected` match any extent. A mismatch is reported as a
/// model execution error naming `model`.
pub fn validate_output_shape(
    model: &str,
    shape: &[usize],
    expected: &[Option<usize>],
) -> Result<(), SwapError> {
    let matches = shape.len() == expected.len()
        && shape
            .iter()
            .zip(expected)
            .all(|(&actual, want)| want.is_none_or(|w| w == actual));
    if matches {
        return Ok(());
    }
    let pattern = expected
        .iter()
        .map(|d| d.map_or_else(|| "*".to_string(), |v| v.to_string()))
        .collect::<Vec<_>>()
        .join(", ");
    Err(SwapError::output_contract(
        model,
        &format!("[{pattern}]"),
        shape,
    ))
}

/// Validates normalization parameters (mean and std).
pub fn validate_normalization_params(
    mean: &[f32],
    std: &[f32],
    num_channels: usize,
) -> Result<(), SwapError> {
    if mean.len() != num_channels || std.len() != num_channels {
        return Err(SwapError::invalid_input(format!(
            "normalization expects {num_channels} channels, got mean {} / std {}",
            mean.len(),
            std.len()
        )));
    }
    for (i, &m) in mean.iter().enumerate() {
        validate_finite(m, &format!("mean[{i}]"))?;
    }
    for (i, &s) in std.iter().enumerate() {
        validate_finite(s, &format!("std[{i}]"))?;
        validate_positive(s, &format!("std[{i}]"))?;
    }
    Ok(())
}
