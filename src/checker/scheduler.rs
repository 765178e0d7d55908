//! 检查调度器
//!
//! 单个后台任务按固定周期运行 tick：
//!
//! ```text
//! Idle → Selecting → Dispatching → Draining → (archive) Dispatching → Draining → Idle
//!                                                                 ↓ stop()
//!                                                               Stopped
//! ```
//!
//! - 探测与存档查询分别由独立的 `Semaphore` 限制并发，worker 运行在 `JoinSet` 中
//! - 单个 URL 的失败（探测、写库、甚至 worker panic）只记录，不影响其他 URL
//! - 本轮新失效的链接追加到同一 tick 的存档批次
//! - tick 之间不重叠：本轮所有 worker 结束后才会计算下一轮批次
//! - 停止信号到达后不再派发新任务，已派发的任务自然完成（受各自请求超时约束）

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::archive::ArchiveResolver;
use super::prober::{Classification, DestinationProber};
use super::repository::{StatusRepository, UrlRepository};
use super::selector::{is_archive_due, select_due};
use super::transition::{apply_archive, apply_probe};
use super::CheckerSettings;
use crate::errors::Result;
use crate::storage::{LinkTarget, UrlStatus};

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Selecting,
    Dispatching,
    Draining,
    Stopped,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Selecting => "selecting",
            SchedulerState::Dispatching => "dispatching",
            SchedulerState::Draining => "draining",
            SchedulerState::Stopped => "stopped",
        }
    }
}

/// 单个 tick 的执行报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// 本轮选出的目标地址检查数量
    pub selected: usize,
    pub alive: usize,
    pub gone: usize,
    /// 本轮从非 gone 变为 gone 的数量
    pub newly_gone: usize,
    pub unknown: usize,
    /// 实际执行的存档查询数量（含本轮新失效追加的）
    pub archive_lookups: usize,
    pub snapshots_found: usize,
    pub store_failures: usize,
    /// panic 等导致 worker 异常退出的数量
    pub worker_failures: usize,
    pub duration_ms: u64,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TickReport {
    /// 本轮是否做了任何工作
    pub fn is_idle(&self) -> bool {
        self.selected == 0 && self.archive_lookups == 0
    }
}

/// 探测 worker 的结果
struct ProbeResult {
    target: LinkTarget,
    classification: Classification,
    newly_gone: bool,
    /// 写库成功后的新状态
    stored: Option<UrlStatus>,
}

/// 存档 worker 的结果
struct ArchiveResult {
    found: bool,
    stored: bool,
}

/// 目标地址状态检查调度器
///
/// 所有依赖在构造时注入，没有全局状态；`spawn` 之后通过 [`CheckerHandle`] 控制。
pub struct CheckerScheduler {
    settings: CheckerSettings,
    urls: Arc<dyn UrlRepository>,
    statuses: Arc<dyn StatusRepository>,
    prober: Arc<dyn DestinationProber>,
    resolver: Option<Arc<dyn ArchiveResolver>>,
    probe_permits: Arc<Semaphore>,
    archive_permits: Arc<Semaphore>,
    /// 正在处理的 url_id，批次选择时排除
    in_flight: Mutex<HashSet<String>>,
    state: ArcSwap<SchedulerState>,
    last_report: ArcSwapOption<TickReport>,
    shutdown_tx: watch::Sender<bool>,
}

impl CheckerScheduler {
    pub fn new(
        settings: CheckerSettings,
        urls: Arc<dyn UrlRepository>,
        statuses: Arc<dyn StatusRepository>,
        prober: Arc<dyn DestinationProber>,
        resolver: Option<Arc<dyn ArchiveResolver>>,
    ) -> Self {
        let probe_permits = Arc::new(Semaphore::new(
            settings.concurrency.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let archive_permits = Arc::new(Semaphore::new(
            settings.archive_concurrency.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            settings,
            urls,
            statuses,
            prober,
            resolver,
            probe_permits,
            archive_permits,
            in_flight: Mutex::new(HashSet::new()),
            state: ArcSwap::from_pointee(SchedulerState::Idle),
            last_report: ArcSwapOption::empty(),
            shutdown_tx,
        }
    }

    pub fn settings(&self) -> &CheckerSettings {
        &self.settings
    }

    pub fn state(&self) -> SchedulerState {
        **self.state.load()
    }

    pub fn last_report(&self) -> Option<TickReport> {
        self.last_report.load_full().map(|r| (*r).clone())
    }

    /// 发出停止信号（幂等）
    pub fn request_stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.store(Arc::new(state));
    }

    fn archive_enabled(&self) -> bool {
        self.settings.archive_lookup_enabled && self.resolver.is_some()
    }

    /// 启动后台循环
    pub fn spawn(self: Arc<Self>) -> CheckerHandle {
        let scheduler = Arc::clone(&self);
        let task = tokio::spawn(async move { scheduler.run_loop().await });
        CheckerHandle {
            scheduler: self,
            task,
        }
    }

    async fn run_loop(&self) {
        let mut shutdown = self.shutdown_tx.subscribe();
        info!(
            "Destination checker started: prober={}, poll_interval={:?}, batch_size={}, concurrency={}, archive={}",
            self.prober.name(),
            self.settings.poll_interval,
            self.settings.batch_size,
            self.settings.concurrency,
            self.archive_enabled()
        );

        if !self.settings.startup_delay.is_zero() {
            debug!(
                "Destination checker waiting {:?} before first tick",
                self.settings.startup_delay
            );
            let stopped = tokio::select! {
                _ = tokio::time::sleep(self.settings.startup_delay) => false,
                _ = shutdown.wait_for(|stop| *stop) => true,
            };
            if stopped {
                self.set_state(SchedulerState::Stopped);
                info!("Destination checker stopped before first tick");
                return;
            }
        }

        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait_for(|stop| *stop) => break,
            }

            if let Err(e) = self.run_tick().await {
                warn!("Destination check tick skipped: {}", e);
            }

            if self.is_stop_requested() {
                break;
            }
        }

        self.set_state(SchedulerState::Stopped);
        info!("Destination checker stopped");
    }

    /// 执行一个完整的 tick
    ///
    /// 只有读取链接列表或状态表失败时返回错误（本轮跳过）；单个 URL 的任何失败
    /// 都计入报告。
    pub async fn run_tick(&self) -> Result<TickReport> {
        let started = Instant::now();
        let now = Utc::now();
        let mut shutdown = self.shutdown_tx.subscribe();
        let mut report = TickReport::default();

        self.set_state(SchedulerState::Selecting);
        let (targets, statuses) = match self.load_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.set_state(SchedulerState::Idle);
                return Err(e);
            }
        };

        let batches = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            let batches = select_due(&targets, &statuses, now, &self.settings, &in_flight);
            in_flight.extend(batches.destination.iter().map(|t| t.url_id.clone()));
            in_flight.extend(batches.archive.iter().map(|t| t.url_id.clone()));
            batches
        };
        let _claimed = InFlightClaim {
            set: &self.in_flight,
            ids: batches
                .destination
                .iter()
                .chain(batches.archive.iter())
                .map(|t| t.url_id.clone())
                .collect(),
        };
        report.selected = batches.destination.len();

        // 阶段一：目标地址探测
        let probed = self
            .dispatch_probes(batches.destination, &statuses, &mut shutdown, &mut report)
            .await;

        // 阶段二：存档查询（选出的批次 + 本轮确认失效且到期的）
        let mut archive_batch: Vec<(LinkTarget, UrlStatus)> = Vec::new();
        if self.archive_enabled() {
            archive_batch.extend(
                batches
                    .archive
                    .into_iter()
                    .filter_map(|t| statuses.get(&t.url_id).cloned().map(|s| (t, s))),
            );
            archive_batch.extend(probed.into_iter().filter_map(|r| {
                let status = r.stored?;
                is_archive_due(&status, now, &self.settings).then_some((r.target, status))
            }));
        }
        self.dispatch_archive(archive_batch, &mut shutdown, &mut report)
            .await;

        report.duration_ms = started.elapsed().as_millis() as u64;
        report.finished_at = Some(Utc::now());
        self.set_state(SchedulerState::Idle);

        if report.is_idle() {
            debug!("Destination check tick: nothing due");
        } else {
            info!(
                "Destination check tick finished in {}ms: selected {}, alive {}, gone {} ({} new), unknown {}, archive lookups {} ({} found), store failures {}, worker failures {}",
                report.duration_ms,
                report.selected,
                report.alive,
                report.gone,
                report.newly_gone,
                report.unknown,
                report.archive_lookups,
                report.snapshots_found,
                report.store_failures,
                report.worker_failures
            );
        }
        self.last_report.store(Some(Arc::new(report.clone())));
        Ok(report)
    }

    async fn load_snapshot(&self) -> Result<(Vec<LinkTarget>, HashMap<String, UrlStatus>)> {
        let targets = self.urls.list_targets().await?;
        let statuses = self
            .statuses
            .list_statuses()
            .await?
            .into_iter()
            .map(|s| (s.url_id.clone(), s))
            .collect();
        Ok((targets, statuses))
    }

    async fn dispatch_probes(
        &self,
        batch: Vec<LinkTarget>,
        statuses: &HashMap<String, UrlStatus>,
        shutdown: &mut watch::Receiver<bool>,
        report: &mut TickReport,
    ) -> Vec<ProbeResult> {
        if batch.is_empty() {
            return Vec::new();
        }

        self.set_state(SchedulerState::Dispatching);
        let total = batch.len();
        let mut workers = JoinSet::new();

        for (dispatched, target) in batch.into_iter().enumerate() {
            let Some(permit) = acquire(&self.probe_permits, shutdown).await else {
                info!(
                    "Stop requested, {} of {} destination checks left undispatched",
                    total - dispatched,
                    total
                );
                break;
            };
            let previous = statuses.get(&target.url_id).cloned();
            let prober = Arc::clone(&self.prober);
            let store = Arc::clone(&self.statuses);
            workers.spawn(async move {
                let result = probe_one(prober, store, target, previous).await;
                drop(permit);
                result
            });
        }

        self.set_state(SchedulerState::Draining);
        let mut results = Vec::with_capacity(total);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => {
                    match result.classification {
                        Classification::Alive => report.alive += 1,
                        Classification::Gone => report.gone += 1,
                        Classification::Unknown => report.unknown += 1,
                    }
                    if result.newly_gone {
                        report.newly_gone += 1;
                    }
                    if result.stored.is_none() {
                        report.store_failures += 1;
                    }
                    results.push(result);
                }
                Err(e) => {
                    error!("Destination check worker failed: {}", e);
                    report.worker_failures += 1;
                }
            }
        }
        results
    }

    async fn dispatch_archive(
        &self,
        batch: Vec<(LinkTarget, UrlStatus)>,
        shutdown: &mut watch::Receiver<bool>,
        report: &mut TickReport,
    ) {
        let Some(resolver) = self.resolver.as_ref().filter(|_| !batch.is_empty()) else {
            return;
        };

        self.set_state(SchedulerState::Dispatching);
        let total = batch.len();
        let mut workers = JoinSet::new();

        for (dispatched, (target, status)) in batch.into_iter().enumerate() {
            let Some(permit) = acquire(&self.archive_permits, shutdown).await else {
                info!(
                    "Stop requested, {} of {} archive lookups left undispatched",
                    total - dispatched,
                    total
                );
                break;
            };
            let resolver = Arc::clone(resolver);
            let store = Arc::clone(&self.statuses);
            workers.spawn(async move {
                let result = archive_one(resolver, store, target, status).await;
                drop(permit);
                result
            });
        }

        self.set_state(SchedulerState::Draining);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => {
                    report.archive_lookups += 1;
                    if result.found {
                        report.snapshots_found += 1;
                    }
                    if !result.stored {
                        report.store_failures += 1;
                    }
                }
                Err(e) => {
                    error!("Archive lookup worker failed: {}", e);
                    report.worker_failures += 1;
                }
            }
        }
    }
}

/// 获取并发许可；停止信号优先，收到后返回 `None`
async fn acquire(
    permits: &Arc<Semaphore>,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<OwnedSemaphorePermit> {
    tokio::select! {
        biased;
        _ = shutdown.wait_for(|stop| *stop) => None,
        permit = Arc::clone(permits).acquire_owned() => permit.ok(),
    }
}

async fn probe_one(
    prober: Arc<dyn DestinationProber>,
    store: Arc<dyn StatusRepository>,
    target: LinkTarget,
    previous: Option<UrlStatus>,
) -> ProbeResult {
    let at = Utc::now();
    let outcome = prober.probe(&target.destination).await;
    debug!(
        "Checked {} ({}): {} status={:?} error={:?}",
        target.url_id,
        target.destination,
        outcome.classification.as_str(),
        outcome.status_code,
        outcome.error
    );

    let transition = apply_probe(previous.as_ref(), &target.url_id, &outcome, at);
    if transition.newly_gone {
        warn!(
            "Destination of {} is gone (HTTP {}): {}",
            target.url_id,
            outcome.status_code.unwrap_or_default(),
            target.destination
        );
    }

    let stored = match store.upsert_status(&transition.status).await {
        Ok(()) => Some(transition.status),
        Err(e) => {
            warn!("Failed to store check result for {}: {}", target.url_id, e);
            None
        }
    };

    ProbeResult {
        target,
        classification: outcome.classification,
        newly_gone: transition.newly_gone,
        stored,
    }
}

async fn archive_one(
    resolver: Arc<dyn ArchiveResolver>,
    store: Arc<dyn StatusRepository>,
    target: LinkTarget,
    status: UrlStatus,
) -> ArchiveResult {
    let snapshot = resolver.resolve(&target.destination).await;
    let found = snapshot.is_some();
    debug!(
        "Archive lookup for {} via {}: {:?}",
        target.url_id,
        resolver.name(),
        snapshot
    );

    let Some(next) = apply_archive(&status, snapshot, Utc::now()) else {
        return ArchiveResult {
            found,
            stored: true,
        };
    };

    let stored = match store.upsert_status(&next).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to store archive result for {}: {}", target.url_id, e);
            false
        }
    };
    ArchiveResult { found, stored }
}

/// tick 结束（含 panic 展开）时释放本轮占用的 url_id
struct InFlightClaim<'a> {
    set: &'a Mutex<HashSet<String>>,
    ids: Vec<String>,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(PoisonError::into_inner);
        for id in &self.ids {
            set.remove(id);
        }
    }
}

/// 后台检查任务的控制句柄
pub struct CheckerHandle {
    scheduler: Arc<CheckerScheduler>,
    task: JoinHandle<()>,
}

impl CheckerHandle {
    pub fn scheduler(&self) -> Arc<CheckerScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn last_report(&self) -> Option<TickReport> {
        self.scheduler.last_report()
    }

    /// 发出停止信号并等待后台任务退出
    pub async fn stop(self) {
        self.scheduler.request_stop();
        if let Err(e) = self.task.await {
            error!("Destination checker task ended abnormally: {}", e);
        }
    }

    /// 带超时的停止，超时后放弃等待
    pub async fn stop_with_timeout(self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.stop()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(SchedulerState::Idle.as_str(), "idle");
        assert_eq!(SchedulerState::Stopped.as_str(), "stopped");
        assert_eq!(
            serde_json::to_value(SchedulerState::Draining).unwrap(),
            serde_json::json!("draining")
        );
    }

    #[test]
    fn test_empty_report_is_idle() {
        let mut report = TickReport::default();
        assert!(report.is_idle());
        report.archive_lookups = 1;
        assert!(!report.is_idle());
    }
}
