use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feedback::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Feedback::Name).string_len(120).not_null())
                    .col(ColumnDef::new(Feedback::Email).string_len(120).not_null())
                    .col(ColumnDef::new(Feedback::Rating).big_integer().not_null())
                    .col(ColumnDef::new(Feedback::Comments).text().null())
                    .col(
                        ColumnDef::new(Feedback::DateSubmitted)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_date_submitted")
                    .table(Feedback::Table)
                    .col(Feedback::DateSubmitted)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
enum Feedback {
    Table,
    Id,
    Name,
    Email,
    Rating,
    Comments,
    DateSubmitted,
}
