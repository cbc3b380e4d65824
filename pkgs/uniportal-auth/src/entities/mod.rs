//! Sea-ORM entities for uniportal-auth

pub mod accounts;
pub mod auth_tokens;

pub use accounts::Entity as Accounts;
pub use auth_tokens::Entity as AuthTokens;
