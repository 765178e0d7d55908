use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 服务器地址、端口、CPU 数量
/// - database: 数据库连接配置
/// - logging: 日志配置
/// - checker: 目标地址状态检查器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub checker: CheckerConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：LW，分隔符：__
    /// 示例：LW__CHECKER__ENABLED=true
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 LW，分隔符 __
            .add_source(
                Environment::with_prefix("LW")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 目标地址状态检查器配置
///
/// 时间间隔使用字符串（如 "30s"、"5m"、"1d"、"1d12h"），启动时由
/// `CheckerConfig::validate` 解析为 [`CheckerSettings`](crate::checker::CheckerSettings)，
/// 解析失败时检查器不启动，但重定向服务不受影响。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    #[serde(default = "default_alive_recheck_interval")]
    pub alive_recheck_interval: String,
    #[serde(default = "default_gone_recheck_interval")]
    pub gone_recheck_interval: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_startup_delay")]
    pub startup_delay: String,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: String,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub archive_lookup_enabled: bool,
    #[serde(default = "default_archive_recheck_interval")]
    pub archive_recheck_interval: String,
    /// 存档查询并发数，未设置时与 concurrency 相同
    #[serde(default)]
    pub archive_concurrency: Option<usize>,
    #[serde(default = "default_archive_api_url")]
    pub archive_api_url: String,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://linkwatch.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_poll_interval() -> String {
    "1m".to_string()
}

fn default_alive_recheck_interval() -> String {
    "1d".to_string()
}

fn default_gone_recheck_interval() -> String {
    "7d".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_concurrency() -> usize {
    5
}

fn default_startup_delay() -> String {
    "30s".to_string()
}

fn default_probe_timeout() -> String {
    "10s".to_string()
}

fn default_max_redirects() -> u32 {
    5
}

fn default_user_agent() -> String {
    format!(
        "linkwatch/{} (+destination status checker)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_archive_recheck_interval() -> String {
    "7d".to_string()
}

fn default_archive_api_url() -> String {
    "https://archive.org/wayback/available".to_string()
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval: default_poll_interval(),
            alive_recheck_interval: default_alive_recheck_interval(),
            gone_recheck_interval: default_gone_recheck_interval(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            startup_delay: default_startup_delay(),
            probe_timeout: default_probe_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            archive_lookup_enabled: false,
            archive_recheck_interval: default_archive_recheck_interval(),
            archive_concurrency: None,
            archive_api_url: default_archive_api_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_defaults() {
        let config = StaticConfig::default();
        assert!(!config.checker.enabled);
        assert!(!config.checker.archive_lookup_enabled);
        assert_eq!(config.checker.batch_size, 100);
        assert_eq!(config.checker.concurrency, 5);
        assert_eq!(config.checker.poll_interval, "1m");
    }

    #[test]
    fn test_sample_config_roundtrips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[checker]"));
        let parsed: StaticConfig = toml::from_str(&sample).expect("sample config should parse");
        assert_eq!(parsed.checker.gone_recheck_interval, "7d");
        assert_eq!(parsed.server.port, 8080);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [checker]
            enabled = true
            concurrency = 2
            "#,
        )
        .expect("partial config should parse");
        assert!(parsed.checker.enabled);
        assert_eq!(parsed.checker.concurrency, 2);
        assert_eq!(parsed.checker.batch_size, 100);
        assert_eq!(parsed.database.database_url, "sqlite://linkwatch.db");
    }
}
