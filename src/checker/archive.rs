//! 存档快照查询
//!
//! 对已确认失效的目标地址，查询外部存档索引（默认 Wayback Machine availability API）
//! 的最近可用快照。任何失败都视为"没有快照"，不会阻塞检查器。

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace, warn};
use ureq::Agent;

use super::CheckerSettings;
use super::prober::build_agent;

/// 存档快照查询 trait
#[async_trait]
pub trait ArchiveResolver: Send + Sync {
    /// 返回快照地址，没有快照或查询失败时返回 `None`
    async fn resolve(&self, url: &str) -> Option<String>;

    fn name(&self) -> &'static str;
}

/// Wayback Machine availability API
///
/// 请求：`GET {api}?url={destination}`
/// 响应：`{"archived_snapshots": {"closest": {"available": true, "url": "...", ...}}}`
pub struct WaybackResolver {
    agent: Agent,
    api_url: String,
    user_agent: String,
}

impl WaybackResolver {
    pub fn new(settings: &CheckerSettings) -> Self {
        Self {
            agent: build_agent(settings.probe_timeout, settings.max_redirects),
            api_url: settings.archive_api_url.clone(),
            user_agent: settings.user_agent.clone(),
        }
    }

    fn resolve_sync(agent: &Agent, api_url: &str, user_agent: &str, url: &str) -> Option<String> {
        let resp = match agent
            .get(api_url)
            .query("url", url)
            .header("User-Agent", user_agent)
            .call()
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Archive lookup for \"{}\" failed: {}", url, e);
                return None;
            }
        };

        if !resp.status().is_success() {
            warn!(
                "Archive lookup for \"{}\" returned HTTP {}",
                url,
                resp.status().as_u16()
            );
            return None;
        }

        let json: Value = match resp.into_body().read_json() {
            Ok(j) => j,
            Err(e) => {
                warn!("Archive response for \"{}\" parse failed: {}", url, e);
                return None;
            }
        };

        let snapshot = parse_availability(&json);
        trace!("Archive lookup: url={}, snapshot={:?}", url, snapshot);
        snapshot
    }
}

#[async_trait]
impl ArchiveResolver for WaybackResolver {
    async fn resolve(&self, url: &str) -> Option<String> {
        let agent = self.agent.clone();
        let api_url = self.api_url.clone();
        let user_agent = self.user_agent.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || Self::resolve_sync(&agent, &api_url, &user_agent, &url))
            .await
            .unwrap_or_else(|e| {
                debug!("Archive spawn_blocking failed: {}", e);
                None
            })
    }

    fn name(&self) -> &'static str {
        "Wayback"
    }
}

/// 从 availability 响应中取出最近快照地址
///
/// 只有 `available == true` 且 `url` 非空时才算找到；`http://` 快照统一升级为 `https://`。
pub fn parse_availability(json: &Value) -> Option<String> {
    let closest = &json["archived_snapshots"]["closest"];
    if closest["available"].as_bool() != Some(true) {
        return None;
    }

    let url = closest["url"].as_str().map(str::trim).filter(|u| !u.is_empty())?;
    match url.strip_prefix("http://") {
        Some(rest) => Some(format!("https://{}", rest)),
        None => Some(url.to_string()),
    }
}
