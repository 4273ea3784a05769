//! Validation traits and common validators
//!
//! Thin predicates shared by the container facade and the configuration
//! loader.

use thiserror::Error;

/// Validation error with context
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Required field missing: {field}")]
    Required { field: String },
}

/// Trait for types that can be validated
pub trait Validatable {
    /// Validate the instance, returning Ok(()) if valid or a ValidationError if invalid
    fn validate(&self) -> Result<(), ValidationError>;

    /// Check if the instance is valid without returning the error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Trait for validators that can check values
pub trait Validator<T: ?Sized> {
    /// Validate a value
    fn validate(&self, value: &T) -> Result<(), ValidationError>;
}

/// Non-empty string validator
pub struct NonEmptyStringValidator {
    field_name: String,
}

impl NonEmptyStringValidator {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
        }
    }
}

impl Validator<str> for NonEmptyStringValidator {
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Required {
                field: self.field_name.clone(),
            });
        }
        Ok(())
    }
}

impl Validator<String> for NonEmptyStringValidator {
    fn validate(&self, value: &String) -> Result<(), ValidationError> {
        Validator::<str>::validate(self, value.as_str())
    }
}

/// Validator for container identifiers: any non-empty string.
///
/// Identifiers are compared exactly, so `"key"` and `" key"` are two entries.
pub struct IdentifierValidator;

impl Validator<str> for IdentifierValidator {
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        NonEmptyStringValidator::new("identifier").validate(value)
    }
}

/// Shorthand for `IdentifierValidator.validate(identifier)`
pub fn validate_identifier(identifier: &str) -> Result<(), ValidationError> {
    IdentifierValidator.validate(identifier)
}
