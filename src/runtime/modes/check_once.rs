use anyhow::{Context, Result};

use crate::config::get_config;
use crate::runtime::lifetime::startup::{build_scheduler, checker_settings, prepare_storage};

/// 执行一次检查并以 JSON 打印报告
pub async fn run_check_once() -> Result<()> {
    let storage = prepare_storage().await?;
    let settings = checker_settings(&get_config().checker)?;

    let scheduler = build_scheduler(settings, &storage);
    let report = scheduler
        .run_tick()
        .await
        .context("Destination check tick failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
