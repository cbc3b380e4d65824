use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum QnaQuestions {
    Table,
    Id,
    ScopeKey,
    AuthorId,
    AuthorName,
    AuthorEmail,
    Text,
    ThumbsUpJson,
    CreatedAt,
}

#[derive(DeriveIden)]
enum QnaReplies {
    Table,
    Id,
    QuestionId,
    AuthorId,
    AuthorName,
    AuthorEmail,
    Text,
    ThumbsUpJson,
    Deleted,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250304_000001_create_qna_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QnaQuestions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QnaQuestions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QnaQuestions::ScopeKey).string().not_null())
                    .col(ColumnDef::new(QnaQuestions::AuthorId).string().not_null())
                    .col(ColumnDef::new(QnaQuestions::AuthorName).string().not_null())
                    .col(ColumnDef::new(QnaQuestions::AuthorEmail).string().not_null())
                    .col(ColumnDef::new(QnaQuestions::Text).text().not_null())
                    .col(
                        ColumnDef::new(QnaQuestions::ThumbsUpJson)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(QnaQuestions::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QnaReplies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QnaReplies::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QnaReplies::QuestionId).string().not_null())
                    .col(ColumnDef::new(QnaReplies::AuthorId).string().not_null())
                    .col(ColumnDef::new(QnaReplies::AuthorName).string().not_null())
                    .col(ColumnDef::new(QnaReplies::AuthorEmail).string().not_null())
                    .col(ColumnDef::new(QnaReplies::Text).text().not_null())
                    .col(
                        ColumnDef::new(QnaReplies::ThumbsUpJson)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(QnaReplies::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(QnaReplies::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_qna_replies_question")
                    .table(QnaReplies::Table)
                    .col(QnaReplies::QuestionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QnaReplies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QnaQuestions::Table).to_owned())
            .await
    }
}
