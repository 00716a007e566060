use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MagicLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MagicLinks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MagicLinks::Email).string().not_null())
                    .col(
                        ColumnDef::new(MagicLinks::Secret)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MagicLinks::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MagicLinks::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MagicLinks::UsedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(MagicLinks::Table)
                    .col(MagicLinks::Email)
                    .name("idx_magic_links_email")
                    .to_owned(),
            )
            .await?;

        // Index for the cleanup sweep (bulk delete by expiry).
        manager
            .create_index(
                Index::create()
                    .table(MagicLinks::Table)
                    .col(MagicLinks::ExpiresAt)
                    .name("idx_magic_links_expires_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MagicLinks::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MagicLinks {
    Table,
    Id,
    Email,
    Secret,
    IssuedAt,
    ExpiresAt,
    UsedAt,
}
