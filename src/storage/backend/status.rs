//! Checker repositories backed by SeaOrmStorage

use async_trait::async_trait;
use sea_orm::{EntityTrait, sea_query::OnConflict};
use tracing::trace;

use super::converters::{model_to_status, status_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::checker::{StatusRepository, UrlRepository};
use crate::errors::{LinkwatchError, Result};
use crate::storage::{LinkTarget, UrlStatus};

use migration::entities::url_status;

#[async_trait]
impl UrlRepository for SeaOrmStorage {
    async fn list_targets(&self) -> Result<Vec<LinkTarget>> {
        self.load_active_targets().await
    }

    async fn get_target(&self, url_id: &str) -> Result<Option<LinkTarget>> {
        self.load_active_target(url_id).await
    }
}

#[async_trait]
impl StatusRepository for SeaOrmStorage {
    async fn get_status(&self, url_id: &str) -> Result<Option<UrlStatus>> {
        let db = &self.db;
        let id = url_id.to_string();

        let model = retry::with_retry(&format!("get_status({})", url_id), self.retry_config, || async {
            url_status::Entity::find_by_id(&id).one(db).await
        })
        .await
        .map_err(|e| LinkwatchError::database_operation(format!("查询检查状态失败: {}", e)))?;

        Ok(model.map(model_to_status))
    }

    async fn list_statuses(&self) -> Result<Vec<UrlStatus>> {
        let db = &self.db;

        let models = retry::with_retry("list_statuses", self.retry_config, || async {
            url_status::Entity::find().all(db).await
        })
        .await
        .map_err(|e| LinkwatchError::database_operation(format!("加载检查状态失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_status).collect())
    }

    /// 单条 `INSERT .. ON CONFLICT(url_id) DO UPDATE`，失败不在本轮重试
    async fn upsert_status(&self, status: &UrlStatus) -> Result<()> {
        url_status::Entity::insert(status_to_active_model(status))
            .on_conflict(
                OnConflict::column(url_status::Column::UrlId)
                    .update_columns([
                        url_status::Column::LastCheckedAt,
                        url_status::Column::LastStatusCode,
                        url_status::Column::LastError,
                        url_status::Column::GoneAt,
                        url_status::Column::ArchiveUrl,
                        url_status::Column::ArchiveCheckedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| {
                LinkwatchError::database_operation(format!(
                    "写入检查状态 '{}' 失败: {}",
                    status.url_id, e
                ))
            })?;

        trace!("Status upserted: {}", status.url_id);
        Ok(())
    }
}
