use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    Id,
    ScopeKey,
    Seq,
    SenderId,
    SenderName,
    Kind,
    Text,
    BodyJson,
    ReplyJson,
    ImageUrl,
    ReactionsJson,
    SentAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250302_000001_create_chat_messages_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChatMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatMessages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatMessages::ScopeKey).string().not_null())
                    .col(ColumnDef::new(ChatMessages::Seq).big_integer().not_null())
                    .col(ColumnDef::new(ChatMessages::SenderId).string().not_null())
                    .col(ColumnDef::new(ChatMessages::SenderName).string().not_null())
                    .col(ColumnDef::new(ChatMessages::Kind).string().not_null())
                    .col(ColumnDef::new(ChatMessages::Text).text().not_null())
                    .col(ColumnDef::new(ChatMessages::BodyJson).text().not_null())
                    .col(ColumnDef::new(ChatMessages::ReplyJson).text().null())
                    .col(ColumnDef::new(ChatMessages::ImageUrl).string().null())
                    .col(
                        ColumnDef::new(ChatMessages::ReactionsJson)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(ColumnDef::new(ChatMessages::SentAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_chat_messages_scope_seq")
                    .table(ChatMessages::Table)
                    .col(ChatMessages::ScopeKey)
                    .col(ChatMessages::Seq)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChatMessages::Table).to_owned())
            .await
    }
}
