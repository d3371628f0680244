//! # 分诊Web接口
//!
//! 以JSON接口暴露分诊队列、预约和紧急警报操作。

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{create_router, WebServer};
