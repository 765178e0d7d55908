//! 配置值验证模块
//!
//! 将字符串形式的检查器配置解析为强类型设置。任何非法值都是启动期错误。

use crate::checker::CheckerSettings;
use crate::errors::{LinkwatchError, Result};
use crate::utils::TimeParser;

use super::CheckerConfig;

impl CheckerConfig {
    /// 校验并转换为 [`CheckerSettings`]
    pub fn validate(&self) -> Result<CheckerSettings> {
        let poll_interval = parse_positive("poll_interval", &self.poll_interval)?;
        let alive_recheck_interval =
            parse_positive("alive_recheck_interval", &self.alive_recheck_interval)?;
        let gone_recheck_interval =
            parse_positive("gone_recheck_interval", &self.gone_recheck_interval)?;
        let archive_recheck_interval =
            parse_positive("archive_recheck_interval", &self.archive_recheck_interval)?;
        let probe_timeout = parse_positive("probe_timeout", &self.probe_timeout)?;
        let startup_delay = TimeParser::parse_interval(&self.startup_delay)
            .map_err(|e| LinkwatchError::validation(format!("checker.startup_delay: {}", e)))?;

        if self.batch_size == 0 {
            return Err(LinkwatchError::validation(
                "checker.batch_size must be greater than 0",
            ));
        }
        check_concurrency("concurrency", self.concurrency)?;
        let archive_concurrency = self.archive_concurrency.unwrap_or(self.concurrency);
        check_concurrency("archive_concurrency", archive_concurrency)?;

        if self.archive_lookup_enabled {
            validate_http_url("archive_api_url", &self.archive_api_url)?;
        }

        Ok(CheckerSettings {
            poll_interval,
            alive_recheck_interval: to_time_delta("alive_recheck_interval", alive_recheck_interval)?,
            gone_recheck_interval: to_time_delta("gone_recheck_interval", gone_recheck_interval)?,
            archive_recheck_interval: to_time_delta(
                "archive_recheck_interval",
                archive_recheck_interval,
            )?,
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            archive_lookup_enabled: self.archive_lookup_enabled,
            archive_concurrency,
            archive_api_url: self.archive_api_url.clone(),
            startup_delay,
            probe_timeout,
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.clone(),
        })
    }
}

/// 单个检查器同时发出的请求上限
pub const MAX_CONCURRENCY: usize = 1024;

fn check_concurrency(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(LinkwatchError::validation(format!(
            "checker.{} must be greater than 0",
            name
        )));
    }
    if value > MAX_CONCURRENCY {
        return Err(LinkwatchError::validation(format!(
            "checker.{} must be at most {}, got {}",
            name, MAX_CONCURRENCY, value
        )));
    }
    Ok(())
}

fn parse_positive(name: &str, value: &str) -> Result<std::time::Duration> {
    let duration = TimeParser::parse_interval(value)
        .map_err(|e| LinkwatchError::validation(format!("checker.{}: {}", name, e)))?;
    if duration.is_zero() {
        return Err(LinkwatchError::validation(format!(
            "checker.{} must be greater than zero",
            name
        )));
    }
    Ok(duration)
}

fn to_time_delta(name: &str, duration: std::time::Duration) -> Result<chrono::TimeDelta> {
    chrono::TimeDelta::from_std(duration)
        .map_err(|_| LinkwatchError::validation(format!("checker.{} is out of range", name)))
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| LinkwatchError::validation(format!("checker.{}: {}", name, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(LinkwatchError::validation(format!(
            "checker.{} must use http or https, got '{}'",
            name, other
        ))),
    }
}
