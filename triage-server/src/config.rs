//! 服务配置
//!
//! 加载顺序：内置默认值 → 配置文件 → `TRIAGE__` 前缀的环境变量。

use anyhow::{bail, Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use triage_workflow::QueuePolicy;

/// 分诊服务完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub queue: QueuePolicy,
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接字符串
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时（秒）
    pub connect_timeout_secs: u64,
    /// 启动时建表
    pub auto_migrate: bool,
    /// 使用内存存储，不连接数据库
    pub in_memory: bool,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl AppConfig {
    /// 加载配置，`path` 为空时只使用默认值和环境变量
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.connect_timeout_secs", 30)?
            .set_default("database.auto_migrate", true)?
            .set_default("database.in_memory", false)?
            .set_default("queue.allow_direct_completion", true)?
            .set_default("logging.level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("TRIAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if let Some(path) = path {
            info!("Configuration loaded from: {}", path);
        }
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must not be 0");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must not be 0");
        }
        if !self.database.in_memory && self.database.url.trim().is_empty() {
            bail!("database.url is required unless database.in_memory is set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.queue.allow_direct_completion);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("triage-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[database]\nin_memory = true\n\n[queue]\nallow_direct_completion = false"
        )
        .unwrap();

        let config = AppConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(!config.queue.allow_direct_completion);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::load(None).unwrap();
        // 默认没有数据库地址
        assert!(config.validate().is_err());

        config.database.url = "postgres://localhost/triage".to_string();
        assert!(config.validate().is_ok());

        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 5;
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
