//! Mutation operations for SeaOrmStorage
//!
//! Short link maintenance. Status rows are written through the
//! `StatusRepository` impl in `status.rs`.

use sea_orm::{EntityTrait, sea_query::OnConflict};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::shortlink_to_active_model;
use super::retry;
use crate::errors::{LinkwatchError, Result};
use crate::storage::ShortLink;

use migration::entities::{short_link, url_status};

impl SeaOrmStorage {
    /// 使用 ON CONFLICT 的原子 upsert
    ///
    /// 已有链接的 created_at 不会被覆盖。目标地址变化时，旧地址的检查状态在同一事务中
    /// 删除，新地址回到“未检查”并在下一轮立即到期。
    pub async fn upsert_link(&self, link: &ShortLink) -> Result<()> {
        use sea_orm::TransactionTrait;

        let db = &self.db;

        let retargeted = retry::with_retry(
            &format!("upsert_link({})", link.code),
            self.retry_config,
            || async {
                let txn = db.begin().await?;

                let previous = short_link::Entity::find_by_id(link.code.clone())
                    .one(&txn)
                    .await?;

                short_link::Entity::insert(shortlink_to_active_model(link))
                    .on_conflict(
                        OnConflict::column(short_link::Column::ShortCode)
                            .update_columns([
                                short_link::Column::TargetUrl,
                                short_link::Column::ExpiresAt,
                            ])
                            .to_owned(),
                    )
                    .exec(&txn)
                    .await?;

                let retargeted = previous.is_some_and(|p| p.target_url != link.target);
                if retargeted {
                    url_status::Entity::delete_by_id(link.code.clone())
                        .exec(&txn)
                        .await?;
                }

                txn.commit().await?;
                Ok::<_, sea_orm::DbErr>(retargeted)
            },
        )
        .await
        .map_err(|e| {
            LinkwatchError::database_operation(format!(
                "Upsert 短链接 '{}' 失败 (target: {}): {}",
                link.code,
                truncate(&link.target, 50),
                e
            ))
        })?;

        if retargeted {
            info!("Short link re-pointed, destination status reset: {}", link.code);
        } else {
            info!("Short link upserted: {}", link.code);
        }
        Ok(())
    }

    /// 删除链接，其状态行随外键级联删除
    pub async fn delete_link(&self, code: &str) -> Result<()> {
        let db = &self.db;
        let code_owned = code.to_string();

        let result = retry::with_retry(&format!("delete_link({})", code), self.retry_config, || async {
            short_link::Entity::delete_by_id(&code_owned).exec(db).await
        })
        .await
        .map_err(|e| LinkwatchError::database_operation(format!("删除短链接失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(LinkwatchError::not_found(format!(
                "短链接不存在: {}",
                code
            )));
        }

        info!("Short link deleted: {}", code);
        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 50), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("链接链接", 2), "链接...");
    }
}
