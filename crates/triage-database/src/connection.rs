//! 数据库连接管理

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use triage_core::{Result, TriageError};

/// 数据库连接池
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// 连接数据库
    pub async fn connect(url: &str, max_connections: u32, connect_timeout: Duration) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(TriageError::Config("database url must not be empty".to_string()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await?;

        tracing::info!("Connected to database with up to {} connections", max_connections);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
