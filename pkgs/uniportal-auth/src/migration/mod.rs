//! Schema for account tables
//!
//! The store crate runs these ahead of its own migrations; [`Migrator`] is
//! enough for a database that only holds accounts.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_accounts_table;
mod m20250301_000002_create_auth_tokens_table;

/// Account migrations in application order
pub fn account_migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
        Box::new(m20250301_000001_create_accounts_table::Migration),
        Box::new(m20250301_000002_create_auth_tokens_table::Migration),
    ]
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        account_migrations()
    }
}
