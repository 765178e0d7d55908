//! Link maintenance commands
//!
//! Small helpers so a deployment can be seeded and inspected without a separate
//! admin tool. The checker only reads the link table.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use chrono::{SecondsFormat, Utc};
use colored::Colorize;

use crate::checker::StatusRepository;
use crate::runtime::lifetime::startup::prepare_storage;
use crate::storage::{ShortLink, UrlStatus};
use crate::utils::{TimeParser, is_valid_short_code};

pub async fn run_add(short_code: String, target_url: String, expire: Option<String>) -> Result<()> {
    if !is_valid_short_code(&short_code) {
        bail!("Invalid short code: {}", short_code);
    }
    validate_target(&target_url)?;

    let now = Utc::now();
    let expires_at = match expire.as_deref() {
        Some(expire) => {
            let duration = TimeParser::parse_interval(expire)
                .map_err(|e| anyhow::anyhow!("Invalid --expire '{}': {}", expire, e))?;
            let delta = chrono::TimeDelta::from_std(duration)
                .context("--expire is out of range")?;
            Some(now + delta)
        }
        None => None,
    };

    let storage = prepare_storage().await?;
    storage
        .upsert_link(&ShortLink {
            code: short_code.clone(),
            target: target_url.clone(),
            created_at: now,
            expires_at,
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.format_simple()))?;

    println!("{} {} -> {}", "Saved".green().bold(), short_code, target_url);
    Ok(())
}

pub async fn run_remove(short_code: String) -> Result<()> {
    let storage = prepare_storage().await?;
    storage
        .delete_link(&short_code)
        .await
        .map_err(|e| anyhow::anyhow!(e.format_simple()))?;

    println!("{} {}", "Removed".yellow().bold(), short_code);
    Ok(())
}

pub async fn run_list() -> Result<()> {
    let storage = prepare_storage().await?;
    let links = storage
        .list_links()
        .await
        .map_err(|e| anyhow::anyhow!(e.format_simple()))?;
    let statuses: HashMap<String, UrlStatus> = storage
        .list_statuses()
        .await
        .map_err(|e| anyhow::anyhow!(e.format_simple()))?
        .into_iter()
        .map(|s| (s.url_id.clone(), s))
        .collect();

    if links.is_empty() {
        println!("No short links.");
        return Ok(());
    }

    let now = Utc::now();
    for link in &links {
        let status = statuses.get(&link.code);
        let label = match status_label(status) {
            "alive" => "alive".green(),
            "gone" => "gone".red().bold(),
            "unknown" => "unknown".yellow(),
            other => other.dimmed(),
        };
        let expired = if link.is_expired_at(now) {
            " (expired)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("{:<24} {:<9} {}{}", link.code, label, link.target, expired);

        if let Some(status) = status {
            let checked = status
                .last_checked_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| "-".to_string());
            let code = status
                .last_status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{:<24} checked {} status {}", "", checked, code);
            if let Some(archive) = &status.archive_url {
                println!("{:<24} archive {}", "", archive);
            }
        }
    }
    Ok(())
}

/// 状态行的展示标签
pub fn status_label(status: Option<&UrlStatus>) -> &'static str {
    match status {
        None => "unchecked",
        Some(s) if s.last_checked_at.is_none() => "unchecked",
        Some(s) if s.is_gone() => "gone",
        Some(s) if s.last_status_code.is_none() => "unknown",
        Some(_) => "alive",
    }
}

fn validate_target(target: &str) -> Result<()> {
    let parsed = url::Url::parse(target).with_context(|| format!("Invalid target URL: {}", target))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("Unsupported target scheme '{}': only http and https are allowed", other),
    }
}
