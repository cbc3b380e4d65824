use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Token,
    Uid,
    Purpose,
    ExpiresAt,
    Consumed,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250301_000002_create_auth_tokens_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthTokens::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuthTokens::Uid).string().not_null())
                    .col(ColumnDef::new(AuthTokens::Purpose).string().not_null())
                    .col(ColumnDef::new(AuthTokens::ExpiresAt).big_integer().not_null())
                    .col(
                        ColumnDef::new(AuthTokens::Consumed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(AuthTokens::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await
    }
}
