//! 错误定义模块

use thiserror::Error;
use uuid::Uuid;

/// 分诊系统统一错误类型
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {entity} {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("无效状态: {0}")]
    InvalidState(String),

    #[error("无效状态转换: {entity} 从 {from} 到 {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("医生不可用: {doctor_id} ({reason})")]
    DoctorUnavailable { doctor_id: Uuid, reason: String },

    #[error("并发冲突: {0}")]
    ConcurrencyConflict(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

impl TriageError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        TriageError::NotFound { entity, id }
    }

    /// 仅并发冲突属于瞬时错误，调用方可以重新读取后重试一次
    pub fn is_retryable(&self) -> bool {
        matches!(self, TriageError::ConcurrencyConflict(_))
    }
}

/// 判断 SQLSTATE 是否代表并发冲突
///
/// `40001` 序列化失败，`40P01` 死锁，`23505` 违反队列位置唯一索引。
pub fn is_conflict_sqlstate(code: &str) -> bool {
    matches!(code, "40001" | "40P01" | "23505")
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for TriageError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if let Some(code) = db_err.code() {
                if is_conflict_sqlstate(&code) {
                    return TriageError::ConcurrencyConflict(db_err.message().to_string());
                }
            }
        }
        TriageError::Database(err.to_string())
    }
}

/// 分诊系统统一结果类型
pub type Result<T> = std::result::Result<T, TriageError>;
