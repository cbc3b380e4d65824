use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum LastSeen {
    Table,
    UserId,
    ScopeKey,
    MessageId,
    UpdatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250302_000002_create_last_seen_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LastSeen::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LastSeen::UserId).string().not_null())
                    .col(ColumnDef::new(LastSeen::ScopeKey).string().not_null())
                    .col(ColumnDef::new(LastSeen::MessageId).string().not_null())
                    .col(ColumnDef::new(LastSeen::UpdatedAt).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(LastSeen::UserId)
                            .col(LastSeen::ScopeKey),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LastSeen::Table).to_owned())
            .await
    }
}
