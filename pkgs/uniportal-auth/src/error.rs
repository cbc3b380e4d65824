//! Error types for account operations

use sea_orm::DbErr;
use thiserror::Error;

use crate::signup::SignupRejection;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur in account and session operations
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Signup rejected: {0}")]
    Rejected(#[from] SignupRejection),
    #[error("An account already exists for {0}")]
    AccountExists(String),
    #[error("No account found for {0}")]
    UnknownAccount(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Please verify your email address before logging in")]
    EmailNotVerified,
    #[error("{0} is already verified")]
    AlreadyVerified(String),
    #[error("Token is invalid or has expired")]
    InvalidToken,
    #[error("Failed to derive password key")]
    KeyDerivation,
    #[error("Stored account is corrupted: {0}")]
    Corrupted(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
