use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Appointments {
    Table,
    Id,
    StudentId,
    StudentName,
    StudentEmail,
    LecturerId,
    LecturerName,
    LecturerEmail,
    Module,
    Date,
    Time,
    Reason,
    Status,
    Reply,
    StudentViewed,
    CreatedAt,
    UpdatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250303_000001_create_appointments_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appointments::StudentId).string().not_null())
                    .col(ColumnDef::new(Appointments::StudentName).string().not_null())
                    .col(ColumnDef::new(Appointments::StudentEmail).string().not_null())
                    .col(ColumnDef::new(Appointments::LecturerId).string().not_null())
                    .col(ColumnDef::new(Appointments::LecturerName).string().not_null())
                    .col(ColumnDef::new(Appointments::LecturerEmail).string().not_null())
                    .col(ColumnDef::new(Appointments::Module).string().not_null())
                    .col(ColumnDef::new(Appointments::Date).string().not_null())
                    .col(ColumnDef::new(Appointments::Time).string().not_null())
                    .col(ColumnDef::new(Appointments::Reason).text().not_null())
                    .col(
                        ColumnDef::new(Appointments::Status)
                            .string()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Appointments::Reply).text().null())
                    .col(
                        ColumnDef::new(Appointments::StudentViewed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Appointments::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Appointments::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_appointments_lecturer")
                    .table(Appointments::Table)
                    .col(Appointments::LecturerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_appointments_student")
                    .table(Appointments::Table)
                    .col(Appointments::StudentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Appointments::Table).to_owned())
            .await
    }
}
