//! 检查器依赖的存储抽象
//!
//! 链接表由链接管理 API 维护，检查器只读；状态表由检查器独占写入。

use async_trait::async_trait;

use crate::errors::Result;
use crate::storage::{LinkTarget, UrlStatus};

/// 短链接来源
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// 列出所有有效（未过期）短链接的短码与目标地址
    async fn list_targets(&self) -> Result<Vec<LinkTarget>>;

    /// 查询单个有效短链接
    async fn get_target(&self, url_id: &str) -> Result<Option<LinkTarget>>;
}

/// 检查状态存储
#[async_trait]
pub trait StatusRepository: Send + Sync {
    async fn get_status(&self, url_id: &str) -> Result<Option<UrlStatus>>;

    /// 批量读取全部状态行（供批次选择使用）
    async fn list_statuses(&self) -> Result<Vec<UrlStatus>>;

    /// 按 url_id 插入或整行覆盖
    async fn upsert_status(&self, status: &UrlStatus) -> Result<()>;
}
