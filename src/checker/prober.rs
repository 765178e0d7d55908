//! 目标地址探测
//!
//! 对目标地址发一次请求并分类：
//! - 404 / 410 → [`Classification::Gone`]
//! - 其他任何 HTTP 状态码 → [`Classification::Alive`]（只表示"目标有响应"，不代表健康）
//! - 传输层失败（超时、DNS、拒绝连接、重定向过多）→ [`Classification::Unknown`]
//!
//! 探测没有副作用，可以安全重试。

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace, warn};
use ureq::Agent;

use super::CheckerSettings;

/// 三态分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Alive,
    Gone,
    /// 无法确认，不得据此改变 gone 状态
    Unknown,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Alive => "alive",
            Classification::Gone => "gone",
            Classification::Unknown => "unknown",
        }
    }
}

/// 单次探测结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub classification: Classification,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// 根据收到的 HTTP 状态码构造结果
    pub fn from_status(code: u16) -> Self {
        Self {
            classification: classify_status(code),
            status_code: Some(code),
            error: None,
        }
    }

    /// 传输层失败
    pub fn transport_failure(error: impl Into<String>) -> Self {
        Self {
            classification: Classification::Unknown,
            status_code: None,
            error: Some(error.into()),
        }
    }
}

/// 状态码分类策略：只有明确的 404/410 才算失效
pub fn classify_status(code: u16) -> Classification {
    match code {
        404 | 410 => Classification::Gone,
        _ => Classification::Alive,
    }
}

/// 目标地址探测器
#[async_trait]
pub trait DestinationProber: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;

    /// 获取 prober 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 基于 ureq 的 HTTP 探测器
///
/// ureq 为阻塞客户端，请求在 `spawn_blocking` 线程池中执行；
/// Agent 内部带连接池，可跨线程共享。
pub struct HttpProber {
    agent: Agent,
    user_agent: String,
}

impl HttpProber {
    pub fn new(settings: &CheckerSettings) -> Self {
        Self {
            agent: build_agent(settings.probe_timeout, settings.max_redirects),
            user_agent: settings.user_agent.clone(),
        }
    }

    fn probe_sync(agent: &Agent, user_agent: &str, url: &str) -> ProbeOutcome {
        if let Err(reason) = check_probeable(url) {
            return ProbeOutcome::transport_failure(reason);
        }

        match agent.get(url).header("User-Agent", user_agent).call() {
            Ok(resp) => {
                let code = resp.status().as_u16();
                trace!("Probe {} -> HTTP {}", url, code);
                ProbeOutcome::from_status(code)
            }
            Err(ureq::Error::StatusCode(code)) => ProbeOutcome::from_status(code),
            Err(e) => {
                debug!("Probe {} failed at transport level: {}", url, e);
                ProbeOutcome::transport_failure(e.to_string())
            }
        }
    }
}

#[async_trait]
impl DestinationProber for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || Self::probe_sync(&agent, &user_agent, &url))
            .await
            .unwrap_or_else(|e| {
                warn!("Probe spawn_blocking failed: {}", e);
                ProbeOutcome::transport_failure(format!("probe task failed: {}", e))
            })
    }

    fn name(&self) -> &'static str {
        "HTTP"
    }
}

/// 构建共享的 ureq Agent：全局超时、有限重定向、HTTP 错误码不当作 Err
pub(crate) fn build_agent(timeout: Duration, max_redirects: u32) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .max_redirects(max_redirects)
        .http_status_as_error(false)
        .build()
        .into()
}

/// 只探测 http(s) 地址
fn check_probeable(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("invalid destination URL: {}", e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(404), Classification::Gone);
        assert_eq!(classify_status(410), Classification::Gone);

        for code in [200, 204, 301, 302, 400, 401, 403, 429, 500, 502, 503] {
            assert_eq!(classify_status(code), Classification::Alive, "code {}", code);
        }
    }

    #[test]
    fn test_transport_failure_has_no_code() {
        let outcome = ProbeOutcome::transport_failure("timed out");
        assert_eq!(outcome.classification, Classification::Unknown);
        assert_eq!(outcome.status_code, None);
        assert_eq!(outcome.error.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_check_probeable() {
        assert!(check_probeable("https://example.com/a").is_ok());
        assert!(check_probeable("http://example.com").is_ok());
        assert!(check_probeable("ftp://example.com/file").is_err());
        assert!(check_probeable("not a url").is_err());
    }

    #[tokio::test]
    async fn test_unprobeable_destination_is_unknown_without_request() {
        let prober = HttpProber::new(&CheckerSettings::default());
        let outcome = prober.probe("mailto:someone@example.com").await;
        assert_eq!(outcome.classification, Classification::Unknown);
        assert!(outcome.error.unwrap().contains("unsupported scheme"));
    }
}
