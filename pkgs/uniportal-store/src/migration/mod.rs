pub use sea_orm_migration::prelude::*;

mod m20250302_000001_create_chat_messages_table;
mod m20250302_000002_create_last_seen_table;
mod m20250303_000001_create_appointments_table;
mod m20250304_000001_create_qna_tables;

/// Runs account migrations followed by the portal's document tables
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        let mut migrations = uniportal_auth::migration::account_migrations();
        migrations.push(Box::new(
            m20250302_000001_create_chat_messages_table::Migration,
        ));
        migrations.push(Box::new(m20250302_000002_create_last_seen_table::Migration));
        migrations.push(Box::new(
            m20250303_000001_create_appointments_table::Migration,
        ));
        migrations.push(Box::new(m20250304_000001_create_qna_tables::Migration));
        migrations
    }
}
