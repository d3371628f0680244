//! 分诊服务主程序

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use triage_database::{DatabasePool, DatabaseQueries, PgTriageStore};
use triage_web::WebServer;
use triage_workflow::{InMemoryStore, TriageQueueManager, TriageStore};

use crate::config::AppConfig;

/// 分诊服务命令行参数
#[derive(Parser, Debug)]
#[command(name = "triage-server")]
#[command(about = "医院分诊队列服务")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听主机，覆盖配置
    #[arg(long)]
    host: Option<String>,

    /// 服务器端口，覆盖配置
    #[arg(short, long)]
    port: Option<u16>,

    /// 数据库连接字符串，覆盖配置
    #[arg(long)]
    database_url: Option<String>,

    /// 使用内存存储
    #[arg(long)]
    memory: bool,

    /// 日志级别，覆盖配置
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if self.memory {
            config.database.in_memory = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut app_config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut app_config);
    app_config.validate()?;

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(&app_config.logging.level)
        .init();

    info!("启动分诊服务...");
    info!("  监听地址: {}:{}", app_config.server.host, app_config.server.port);

    let store = build_store(&app_config).await?;
    let manager = Arc::new(TriageQueueManager::new(store, app_config.queue.clone()));
    info!("  直接完成: {}", manager.policy().allow_direct_completion);

    let addr: SocketAddr = format!("{}:{}", app_config.server.host, app_config.server.port)
        .parse()
        .context("Invalid listen address")?;

    if let Err(e) = WebServer::new(addr, manager).run().await {
        error!("服务启动失败: {}", e);
        return Err(e);
    }

    Ok(())
}

/// 按配置选择存储实现
async fn build_store(app_config: &AppConfig) -> Result<Arc<dyn TriageStore>> {
    let database = &app_config.database;
    if database.in_memory {
        warn!("Using in-memory store, data is lost on restart");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let pool = DatabasePool::connect(
        &database.url,
        database.max_connections,
        database.connect_timeout(),
    )
    .await
    .context("Failed to connect to database")?;

    if database.auto_migrate {
        DatabaseQueries::new(&pool)
            .create_tables()
            .await
            .context("Failed to create database tables")?;
    }

    info!("  存储: PostgreSQL ({} connections)", database.max_connections);
    Ok(Arc::new(PgTriageStore::new(pool)))
}
