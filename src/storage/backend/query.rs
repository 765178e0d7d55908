//! Query operations for SeaOrmStorage
//!
//! Short link reads. All reads go through the retry helper.

use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;

use super::{SeaOrmStorage, retry};
use crate::errors::{LinkwatchError, Result};
use crate::storage::{LinkTarget, ShortLink};

use migration::entities::short_link;

use super::converters::model_to_shortlink;

/// 未过期条件：expires_at 为 null 或 > now
fn active_condition() -> Condition {
    Condition::any()
        .add(short_link::Column::ExpiresAt.is_null())
        .add(short_link::Column::ExpiresAt.gt(Utc::now()))
}

impl SeaOrmStorage {
    /// 按短码读取链接（包括已过期的）
    pub async fn get_link(&self, code: &str) -> Result<Option<ShortLink>> {
        let db = &self.db;
        let code_owned = code.to_string();

        let model = retry::with_retry(&format!("get_link({})", code), self.retry_config, || async {
            short_link::Entity::find_by_id(&code_owned).one(db).await
        })
        .await
        .map_err(|e| LinkwatchError::database_operation(format!("查询短链接失败: {}", e)))?;

        Ok(model.map(model_to_shortlink))
    }

    /// 读取所有链接，按短码排序
    pub async fn list_links(&self) -> Result<Vec<ShortLink>> {
        let db = &self.db;

        let models = retry::with_retry("list_links", self.retry_config, || async {
            short_link::Entity::find()
                .order_by_asc(short_link::Column::ShortCode)
                .all(db)
                .await
        })
        .await
        .map_err(|e| LinkwatchError::database_operation(format!("加载短链接失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_shortlink).collect())
    }

    /// 读取所有未过期链接的短码与目标地址
    pub async fn load_active_targets(&self) -> Result<Vec<LinkTarget>> {
        let db = &self.db;

        let rows: Vec<(String, String)> =
            retry::with_retry("load_active_targets", self.retry_config, || async {
                short_link::Entity::find()
                    .select_only()
                    .column(short_link::Column::ShortCode)
                    .column(short_link::Column::TargetUrl)
                    .filter(active_condition())
                    .order_by_asc(short_link::Column::ShortCode)
                    .into_tuple()
                    .all(db)
                    .await
            })
            .await
            .map_err(|e| {
                LinkwatchError::database_operation(format!("加载短链接目标失败: {}", e))
            })?;

        debug!("Loaded {} active link targets", rows.len());
        Ok(rows
            .into_iter()
            .map(|(url_id, destination)| LinkTarget {
                url_id,
                destination,
            })
            .collect())
    }

    /// 读取单个未过期链接
    pub async fn load_active_target(&self, code: &str) -> Result<Option<LinkTarget>> {
        let link = self.get_link(code).await?;
        Ok(link
            .filter(|link| !link.is_expired_at(Utc::now()))
            .map(|link| LinkTarget::from(&link)))
    }
}
