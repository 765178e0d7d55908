use std::time::Duration;

use chrono::TimeDelta;

/// 检查器运行参数（由 `CheckerConfig::validate` 生成，进程生命周期内不可变）
#[derive(Debug, Clone)]
pub struct CheckerSettings {
    /// 调度器唤醒周期
    pub poll_interval: Duration,
    /// 存活链接的复查间隔
    pub alive_recheck_interval: TimeDelta,
    /// 已失效链接的复查间隔（通常更长）
    pub gone_recheck_interval: TimeDelta,
    /// 存档快照的复查间隔
    pub archive_recheck_interval: TimeDelta,
    /// 每个 tick 每类批次的最大数量
    pub batch_size: usize,
    /// 同时进行的探测数上限
    pub concurrency: usize,
    pub archive_lookup_enabled: bool,
    /// 同时进行的存档查询数上限
    pub archive_concurrency: usize,
    pub archive_api_url: String,
    /// 首个 tick 之前的等待时间
    pub startup_delay: Duration,
    pub probe_timeout: Duration,
    pub max_redirects: u32,
    pub user_agent: String,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            alive_recheck_interval: TimeDelta::days(1),
            gone_recheck_interval: TimeDelta::days(7),
            archive_recheck_interval: TimeDelta::days(7),
            batch_size: 100,
            concurrency: 5,
            archive_lookup_enabled: false,
            archive_concurrency: 5,
            archive_api_url: "https://archive.org/wayback/available".to_string(),
            startup_delay: Duration::ZERO,
            probe_timeout: Duration::from_secs(10),
            max_redirects: 5,
            user_agent: concat!("linkwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
