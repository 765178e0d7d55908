//! 状态迁移
//!
//! 每个短链接一个小状态机：unknown → alive ⇄ gone，gone 状态下附带存档查询子状态。
//! 这里只做纯计算，写库由调度器负责。

use chrono::{DateTime, Utc};

use super::prober::{Classification, ProbeOutcome};
use crate::storage::UrlStatus;

/// 一次探测后的新状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTransition {
    pub status: UrlStatus,
    /// 本次探测使链接从非 gone 变为 gone
    pub newly_gone: bool,
}

/// 将探测结果合并进已有状态
///
/// - `Alive`：清除 gone_at 以及存档字段（存档字段只属于 gone 行）
/// - `Gone`：已有 gone_at 保持不变，否则设为本次探测时间
/// - `Unknown`：gone_at 与存档字段保持不变；状态码置空，记录错误
///
/// `last_checked_at` 单调不减。
pub fn apply_probe(
    previous: Option<&UrlStatus>,
    url_id: &str,
    outcome: &ProbeOutcome,
    at: DateTime<Utc>,
) -> ProbeTransition {
    let mut status = previous
        .cloned()
        .unwrap_or_else(|| UrlStatus::unchecked(url_id));
    let was_gone = status.is_gone();

    status.last_checked_at = Some(match status.last_checked_at {
        Some(prev) if prev > at => prev,
        _ => at,
    });
    status.last_status_code = outcome.status_code;
    status.last_error = outcome.error.clone();

    match outcome.classification {
        Classification::Alive => {
            status.gone_at = None;
            status.archive_url = None;
            status.archive_checked_at = None;
        }
        Classification::Gone => {
            if status.gone_at.is_none() {
                status.gone_at = Some(at);
            }
        }
        Classification::Unknown => {}
    }

    let newly_gone = !was_gone && status.is_gone();
    ProbeTransition { status, newly_gone }
}

/// 将存档查询结果合并进 gone 状态
///
/// 非 gone 行返回 `None`（存档字段只能写在 gone 行上）。没找到快照时仍推进
/// `archive_checked_at`，但保留之前找到的快照地址。
pub fn apply_archive(
    status: &UrlStatus,
    snapshot: Option<String>,
    at: DateTime<Utc>,
) -> Option<UrlStatus> {
    if !status.is_gone() {
        return None;
    }

    let mut next = status.clone();
    next.archive_checked_at = Some(match next.archive_checked_at {
        Some(prev) if prev > at => prev,
        _ => at,
    });
    if let Some(url) = snapshot {
        next.archive_url = Some(url);
    }
    Some(next)
}
