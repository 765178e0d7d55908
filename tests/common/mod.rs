//! In-memory fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use linkwatch::checker::{
    ArchiveResolver, DestinationProber, ProbeOutcome, StatusRepository, UrlRepository,
};
use linkwatch::errors::{LinkwatchError, Result};
use linkwatch::storage::{LinkTarget, UrlStatus};

pub fn target(id: &str) -> LinkTarget {
    LinkTarget {
        url_id: id.to_string(),
        destination: format!("https://{}.example.com/", id),
    }
}

/// 内存版链接表 + 状态表
#[derive(Default)]
pub struct MemoryStore {
    targets: Mutex<Vec<LinkTarget>>,
    statuses: Mutex<HashMap<String, UrlStatus>>,
    failing_upserts: Mutex<HashSet<String>>,
    fail_reads: AtomicBool,
    pub upserts: AtomicUsize,
}

impl MemoryStore {
    pub fn with_targets(targets: Vec<LinkTarget>) -> Self {
        let store = Self::default();
        *store.targets.lock().unwrap() = targets;
        store
    }

    pub fn status(&self, url_id: &str) -> Option<UrlStatus> {
        self.statuses.lock().unwrap().get(url_id).cloned()
    }

    pub fn put_status(&self, status: UrlStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(status.url_id.clone(), status);
    }

    pub fn status_count(&self) -> usize {
        self.statuses.lock().unwrap().len()
    }

    /// 让指定 url_id 的写入失败
    pub fn fail_upserts_for(&self, url_id: &str) {
        self.failing_upserts
            .lock()
            .unwrap()
            .insert(url_id.to_string());
    }

    pub fn clear_upsert_failures(&self) {
        self.failing_upserts.lock().unwrap().clear();
    }

    /// 让状态读取失败
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl UrlRepository for MemoryStore {
    async fn list_targets(&self) -> Result<Vec<LinkTarget>> {
        Ok(self.targets.lock().unwrap().clone())
    }

    async fn get_target(&self, url_id: &str) -> Result<Option<LinkTarget>> {
        Ok(self
            .targets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.url_id == url_id)
            .cloned())
    }
}

#[async_trait]
impl StatusRepository for MemoryStore {
    async fn get_status(&self, url_id: &str) -> Result<Option<UrlStatus>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LinkwatchError::database_connection("status store offline"));
        }
        Ok(self.status(url_id))
    }

    async fn list_statuses(&self) -> Result<Vec<UrlStatus>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LinkwatchError::database_connection("status store offline"));
        }
        Ok(self.statuses.lock().unwrap().values().cloned().collect())
    }

    async fn upsert_status(&self, status: &UrlStatus) -> Result<()> {
        if self.failing_upserts.lock().unwrap().contains(&status.url_id) {
            return Err(LinkwatchError::database_operation(format!(
                "write rejected for {}",
                status.url_id
            )));
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.put_status(status.clone());
        Ok(())
    }
}

/// 可编排结果的探测器，记录并发峰值
pub struct FakeProber {
    delay: Duration,
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
    panic_on: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeProber {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            outcomes: Mutex::new(HashMap::new()),
            panic_on: Mutex::new(HashSet::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// 为目标地址指定结果，未指定的返回 HTTP 200
    pub fn respond(&self, destination: &str, outcome: ProbeOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(destination.to_string(), outcome);
    }

    pub fn panic_on(&self, destination: &str) {
        self.panic_on
            .lock()
            .unwrap()
            .insert(destination.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DestinationProber for FakeProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_on.lock().unwrap().contains(url) {
            panic!("prober blew up on {}", url);
        }

        self.outcomes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| ProbeOutcome::from_status(200))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// 按目标地址返回预设快照
#[derive(Default)]
pub struct FakeResolver {
    snapshots: Mutex<HashMap<String, String>>,
    pub calls: AtomicUsize,
}

impl FakeResolver {
    pub fn with_snapshot(destination: &str, snapshot: &str) -> Self {
        let resolver = Self::default();
        resolver
            .snapshots
            .lock()
            .unwrap()
            .insert(destination.to_string(), snapshot.to_string());
        resolver
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveResolver for FakeResolver {
    async fn resolve(&self, url: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots.lock().unwrap().get(url).cloned()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
