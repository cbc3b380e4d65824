//! Authentication and account management for UniPortal
//!
//! This crate provides functionality for managing portal accounts, including:
//! - Signup validation against the institutional email policy
//! - Salted password verifiers (HKDF-SHA256)
//! - Email verification and password reset tokens
//! - Explicit [`Session`] values instead of an ambient "current user"

pub mod auth_manager;
pub mod credentials;
pub mod entities;
pub mod error;
pub mod migration;
pub mod session;
pub mod signup;

pub use auth_manager::{AuthManager, SignupOutcome};
pub use error::{AuthError, Result};
pub use session::{Role, Session, SessionFile, UserProfile};
pub use signup::{AuthPolicy, SignupRejection, SignupRequest};
