//! 批次选择
//!
//! 无状态：输入当前时间、链接列表、状态快照和正在处理的集合，输出本轮需要
//! 探测的目标地址批次和需要查询存档的批次。两类批次都按时间戳从旧到新排列
//! （从未检查的排在最前），并截断到 `batch_size`。

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::CheckerSettings;
use crate::storage::{LinkTarget, UrlStatus};

/// 一个 tick 的待处理批次
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DueBatches {
    pub destination: Vec<LinkTarget>,
    pub archive: Vec<LinkTarget>,
}

/// 状态行的目标地址复查是否到期（无状态行视为立即到期）
pub fn is_destination_due(
    status: Option<&UrlStatus>,
    now: DateTime<Utc>,
    settings: &CheckerSettings,
) -> bool {
    let Some(status) = status else {
        return true;
    };
    let Some(last_checked_at) = status.last_checked_at else {
        return true;
    };

    let interval = if status.is_gone() {
        settings.gone_recheck_interval
    } else {
        settings.alive_recheck_interval
    };
    now - last_checked_at >= interval
}

/// 状态行的存档查询是否到期（仅对已失效链接，且需开启存档查询）
pub fn is_archive_due(status: &UrlStatus, now: DateTime<Utc>, settings: &CheckerSettings) -> bool {
    if !settings.archive_lookup_enabled || !status.is_gone() {
        return false;
    }
    match status.archive_checked_at {
        None => true,
        Some(checked_at) => now - checked_at >= settings.archive_recheck_interval,
    }
}

/// 选出到期的目标地址检查批次
pub fn select_destination_batch(
    targets: &[LinkTarget],
    statuses: &HashMap<String, UrlStatus>,
    now: DateTime<Utc>,
    settings: &CheckerSettings,
    in_flight: &HashSet<String>,
) -> Vec<LinkTarget> {
    let mut due: Vec<(Option<DateTime<Utc>>, &LinkTarget)> = targets
        .iter()
        .filter(|target| !in_flight.contains(&target.url_id))
        .filter_map(|target| {
            let status = statuses.get(&target.url_id);
            is_destination_due(status, now, settings)
                .then(|| (status.and_then(|s| s.last_checked_at), target))
        })
        .collect();

    take_oldest(&mut due, settings.batch_size)
}

/// 选出到期的存档查询批次
pub fn select_archive_batch(
    targets: &[LinkTarget],
    statuses: &HashMap<String, UrlStatus>,
    now: DateTime<Utc>,
    settings: &CheckerSettings,
    in_flight: &HashSet<String>,
) -> Vec<LinkTarget> {
    if !settings.archive_lookup_enabled {
        return Vec::new();
    }

    let mut due: Vec<(Option<DateTime<Utc>>, &LinkTarget)> = targets
        .iter()
        .filter(|target| !in_flight.contains(&target.url_id))
        .filter_map(|target| {
            let status = statuses.get(&target.url_id)?;
            is_archive_due(status, now, settings).then_some((status.archive_checked_at, target))
        })
        .collect();

    take_oldest(&mut due, settings.batch_size)
}

/// 同时选出两类批次
///
/// 已进入目标地址批次的链接不会再出现在存档批次中：它们的存档查询要等本轮
/// 探测结果确认仍然失效后，由调度器追加。
pub fn select_due(
    targets: &[LinkTarget],
    statuses: &HashMap<String, UrlStatus>,
    now: DateTime<Utc>,
    settings: &CheckerSettings,
    in_flight: &HashSet<String>,
) -> DueBatches {
    let destination = select_destination_batch(targets, statuses, now, settings, in_flight);

    let mut excluded = in_flight.clone();
    excluded.extend(destination.iter().map(|t| t.url_id.clone()));
    let archive = select_archive_batch(targets, statuses, now, settings, &excluded);

    DueBatches {
        destination,
        archive,
    }
}

/// 按时间戳升序（None 最前，同时间按短码）排序并截断
fn take_oldest(due: &mut [(Option<DateTime<Utc>>, &LinkTarget)], limit: usize) -> Vec<LinkTarget> {
    // Option 的排序天然是 None < Some
    due.sort_by(|(a_ts, a), (b_ts, b)| a_ts.cmp(b_ts).then_with(|| a.url_id.cmp(&b.url_id)));
    due.iter()
        .take(limit)
        .map(|(_, target)| (*target).clone())
        .collect()
}
