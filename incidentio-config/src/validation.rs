// Configuration validation

use crate::{ConfigError, Result};
use std::cmp::Ordering;

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a number is strictly positive (and finite)
    pub fn positive(value: f64, field: &str) -> Result<()> {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be greater than 0 (got {})",
                field, value
            )));
        }
        Ok(())
    }

    /// Validate that a number is at least `min`. Unordered values (NaN) fail.
    pub fn at_least<T: PartialOrd + std::fmt::Display>(value: T, min: T, field: &str) -> Result<()> {
        if !matches!(
            value.partial_cmp(&min),
            Some(Ordering::Greater | Ordering::Equal)
        ) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be at least {} (got {})",
                field, min, value
            )));
        }
        Ok(())
    }

    /// Validate that a number is at most `max`. Unordered values (NaN) fail.
    pub fn at_most<T: PartialOrd + std::fmt::Display>(value: T, max: T, field: &str) -> Result<()> {
        if !matches!(value.partial_cmp(&max), Some(Ordering::Less | Ordering::Equal)) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be at most {} (got {})",
                field, max, value
            )));
        }
        Ok(())
    }

    /// Validate that a float is neither infinite nor NaN
    pub fn finite(value: f64, field: &str) -> Result<()> {
        if !value.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a finite number (got {})",
                field, value
            )));
        }
        Ok(())
    }

    /// Validate URL format
    pub fn is_url(value: &str, field: &str) -> Result<()> {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a valid URL",
                field
            )));
        }
        Ok(())
    }

    /// Validate port number
    pub fn is_port(value: u16, field: &str) -> Result<()> {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a valid port number",
                field
            )));
        }
        Ok(())
    }
}
