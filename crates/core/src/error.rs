//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business/domain failures. Every variant
/// carries enough context (entity, id, conflicting state or quantity) for the
/// caller to act on without a retry: a failed operation leaves all records
/// exactly as they were.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced id does not resolve to a record.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation is illegal in the entity's current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A uniqueness violation on a business key.
    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Requested more stock than is available (or reserved).
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// A debit would drive a driver balance negative.
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    /// The driver is not in a state that allows the assignment.
    #[error("driver unavailable: {0}")]
    DriverUnavailable(String),

    /// The shipment has no assigned driver.
    #[error("missing driver: {0}")]
    MissingDriver(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(entity: &str, id: impl core::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn duplicate_entry(msg: impl Into<String>) -> Self {
        Self::DuplicateEntry(msg.into())
    }

    pub fn insufficient_stock(msg: impl Into<String>) -> Self {
        Self::InsufficientStock(msg.into())
    }

    pub fn insufficient_balance(msg: impl Into<String>) -> Self {
        Self::InsufficientBalance(msg.into())
    }

    pub fn driver_unavailable(msg: impl Into<String>) -> Self {
        Self::DriverUnavailable(msg.into())
    }

    pub fn missing_driver(msg: impl Into<String>) -> Self {
        Self::MissingDriver(msg.into())
    }
}
