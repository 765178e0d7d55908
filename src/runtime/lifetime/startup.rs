use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::checker::{
    ArchiveResolver, CheckerHandle, CheckerScheduler, CheckerSettings, HttpProber,
    StatusRepository, UrlRepository, WaybackResolver,
};
use crate::config::{CheckerConfig, get_config};
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    /// 检查器未启用或配置无效时为 `None`
    pub checker: Option<CheckerHandle>,
}

/// 安装 rustls 默认加密后端（已安装时跳过）
pub fn install_crypto_provider() -> Result<()> {
    if rustls::crypto::CryptoProvider::get_default().is_some() {
        return Ok(());
    }
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))
}

/// 创建存储（运行迁移）
pub async fn prepare_storage() -> Result<Arc<SeaOrmStorage>> {
    install_crypto_provider()?;

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());
    Ok(storage)
}

/// 准备服务器启动的上下文
///
/// 检查器配置无效只影响检查器本身：记录错误后服务器照常启动。
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = prepare_storage().await?;

    let config = get_config();
    let checker = if config.checker.enabled {
        match config.checker.validate() {
            Ok(settings) => Some(build_scheduler(settings, &storage).spawn()),
            Err(e) => {
                error!(
                    "Destination checker disabled due to invalid configuration: {}",
                    e.format_simple()
                );
                None
            }
        }
    } else {
        info!("Destination checker is disabled (checker.enabled = false)");
        None
    };

    debug!("Pre-startup completed in {:?}", start_time.elapsed());
    Ok(StartupContext { storage, checker })
}

/// 用数据库存储和真实的 HTTP 探测器组装调度器
pub fn build_scheduler(settings: CheckerSettings, storage: &Arc<SeaOrmStorage>) -> Arc<CheckerScheduler> {
    let urls: Arc<dyn UrlRepository> = storage.clone();
    let statuses: Arc<dyn StatusRepository> = storage.clone();
    let prober = Arc::new(HttpProber::new(&settings));
    let resolver: Option<Arc<dyn ArchiveResolver>> = settings
        .archive_lookup_enabled
        .then(|| Arc::new(WaybackResolver::new(&settings)) as Arc<dyn ArchiveResolver>);

    Arc::new(CheckerScheduler::new(
        settings, urls, statuses, prober, resolver,
    ))
}

/// 校验检查器配置，供 `check-once` 使用（忽略 `enabled`）
pub fn checker_settings(config: &CheckerConfig) -> Result<CheckerSettings> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e.format_simple()))
        .context("Invalid [checker] configuration")
}
