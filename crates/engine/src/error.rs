//! The module contains the error the engine can throw.
//!
//! The errors fall in three families:
//!
//! - validation: [`InvalidName`], [`InvalidHierarchy`], [`InvalidAmount`],
//!   [`InvalidDate`], [`InvalidId`], [`InvalidSort`], plus the conflicts
//!   [`ExistingKey`] and [`CategoryInUse`];
//! - [`KeyNotFound`] thrown when a referenced item does not exist;
//! - [`Database`] for unexpected storage failures.
//!
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidHierarchy`]: EngineError::InvalidHierarchy
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidDate`]: EngineError::InvalidDate
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`InvalidSort`]: EngineError::InvalidSort
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`CategoryInUse`]: EngineError::CategoryInUse
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid sort: {0}")]
    InvalidSort(String),
    #[error("Category in use: {0}")]
    CategoryInUse(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for errors caused by caller input.
    ///
    /// These are never retried and never corrected by the engine.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::KeyNotFound(_) | Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidHierarchy(a), Self::InvalidHierarchy(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidSort(a), Self::InvalidSort(b)) => a == b,
            (Self::CategoryInUse(a), Self::CategoryInUse(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
