//! # Triage Core
//!
//! 分诊系统的核心模块，提供实体定义、状态枚举和统一错误类型。

pub mod error;
pub mod models;

pub use error::{Result, TriageError};
pub use models::*;
