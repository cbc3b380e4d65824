//! Error types for store operations

use sea_orm::DbErr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Account error: {0}")]
    Account(#[from] uniportal_auth::AuthError),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Corrupted document {id}: {reason}")]
    Corrupted { id: String, reason: String },
    #[error("Invalid database path: {0}")]
    InvalidPath(String),
}
