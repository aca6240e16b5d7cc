//! # Error Types
//!
//! Domain-specific error types for cart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cart-core errors (this file)                                          │
//! │  ├── CoreError        - Lookup, registry, parsing, config failures     │
//! │  └── ValidationError  - Opt-in input validation failures               │
//! │                                                                         │
//! │  cart-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → host application        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, condition name, etc.)
//! 3. Errors are enum variants, never String
//! 4. Nothing is retried or swallowed: every error reaches the caller

use thiserror::Error;

use crate::types::ItemId;

// =============================================================================
// Core Error
// =============================================================================

/// Cart engine errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The catalog returned no model for an item that is in the cart.
    ///
    /// ## When This Occurs
    /// - Item id was added to the cart but doesn't exist in the catalog
    /// - Catalog row was deleted after the item was added
    /// - Primed models (`use_models`) don't cover every item
    ///
    /// The cart and the catalog disagree; the host decides how to recover.
    #[error("Model for item {item_id} not found in resolved models")]
    ModelNotFound { item_id: ItemId },

    /// An operation addressed an item that isn't in the cart.
    #[error("Item {item_id} is not in the cart")]
    ItemNotFound { item_id: ItemId },

    /// A condition value couldn't be reduced to a number.
    ///
    /// ## User Workflow
    /// ```text
    /// condition("sale").set_value("ten percent")
    ///      │
    ///      ▼
    /// cart.total()
    ///      │
    ///      ▼
    /// InvalidConditionValue { name: "sale", value: "ten percent" }
    /// ```
    #[error("Condition '{name}' has a non-numeric value: '{value}'")]
    InvalidConditionValue { name: String, value: String },

    /// A named function was invoked without being registered.
    #[error("'{name}' function is not registered")]
    UnregisteredFunction { name: String },

    /// The catalog collaborator failed to resolve models.
    #[error("Catalog lookup failed: {0}")]
    Catalog(String),

    /// Session payload couldn't be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file couldn't be read.
    #[error("Failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file isn't valid TOML for `CartConfig`.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Only raised when a caller opts into validation (for example
/// `ConditionInput::validate`); the engine itself accepts any input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ModelNotFound {
            item_id: ItemId::new(7).unwrap(),
        };
        assert_eq!(err.to_string(), "Model for item 7 not found in resolved models");

        let err = CoreError::UnregisteredFunction {
            name: "sync_items".to_string(),
        };
        assert_eq!(err.to_string(), "'sync_items' function is not registered");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "type".to_string(),
        };
        assert_eq!(err.to_string(), "type is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
