use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLink {
    pub code: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShortLink {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// 检查器眼中的短链接：短码 + 目标地址
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkTarget {
    pub url_id: String,
    pub destination: String,
}

impl From<&ShortLink> for LinkTarget {
    fn from(link: &ShortLink) -> Self {
        Self {
            url_id: link.code.clone(),
            destination: link.target.clone(),
        }
    }
}

/// 目标地址检查状态（每个短链接一行，首次检查时创建）
///
/// `archive_url` 为 `None` 时，`archive_checked_at` 区分两种情况：
/// `None` 表示尚未查询，`Some` 表示查询过但没有快照。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlStatus {
    pub url_id: String,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_status_code: Option<u16>,
    pub last_error: Option<String>,
    pub gone_at: Option<DateTime<Utc>>,
    pub archive_url: Option<String>,
    pub archive_checked_at: Option<DateTime<Utc>>,
}

impl UrlStatus {
    /// 尚未检查过的空状态
    pub fn unchecked(url_id: impl Into<String>) -> Self {
        Self {
            url_id: url_id.into(),
            last_checked_at: None,
            last_status_code: None,
            last_error: None,
            gone_at: None,
            archive_url: None,
            archive_checked_at: None,
        }
    }

    pub fn is_gone(&self) -> bool {
        self.gone_at.is_some()
    }
}
