//! # 分诊数据库模块
//!
//! 基于PostgreSQL的分诊存储实现，提供连接池、表结构和队列事务。

pub mod connection;
pub mod models;
pub mod queries;
pub mod store;

// 重新导出主要类型
pub use connection::DatabasePool;
pub use queries::DatabaseQueries;
pub use store::PgTriageStore;
