//! 目标地址状态表迁移
//!
//! 每个短链接最多一行，首次检查时惰性创建，随短链接删除级联删除。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UrlStatus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UrlStatus::UrlId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UrlStatus::LastCheckedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(UrlStatus::LastStatusCode).integer().null())
                    .col(ColumnDef::new(UrlStatus::LastError).text().null())
                    .col(
                        ColumnDef::new(UrlStatus::GoneAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(UrlStatus::ArchiveUrl).text().null())
                    .col(
                        ColumnDef::new(UrlStatus::ArchiveCheckedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_url_status_short_code")
                            .from(UrlStatus::Table, UrlStatus::UrlId)
                            .to(ShortLink::Table, ShortLink::ShortCode)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 选择待检查批次时按 last_checked_at 升序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_url_status_last_checked_at")
                    .table(UrlStatus::Table)
                    .col(UrlStatus::LastCheckedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_url_status_gone_at")
                    .table(UrlStatus::Table)
                    .col(UrlStatus::GoneAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_url_status_gone_at").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_url_status_last_checked_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(UrlStatus::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UrlStatus {
    #[sea_orm(iden = "url_status")]
    Table,
    UrlId,
    LastCheckedAt,
    LastStatusCode,
    LastError,
    GoneAt,
    ArchiveUrl,
    ArchiveCheckedAt,
}

#[derive(DeriveIden)]
enum ShortLink {
    #[sea_orm(iden = "short_links")]
    Table,
    ShortCode,
}
