//! # 分诊工作流模块
//!
//! 提供医院分诊队列与状态流转功能，包括：
//! - 状态机：分诊单、预约和紧急警报的合法转换
//! - 分诊队列：按医院维护连续的排队位置，入队与出队后的位置压缩
//! - 预约与紧急警报的状态推进
//! - 持久化接口及内存实现

pub mod alert;
pub mod appointment;
pub mod directory;
pub mod memory;
pub mod queue;
pub mod state_machine;
pub mod store;

#[cfg(test)]
mod testing;

// 重新导出主要类型
pub use alert::NewEmergencyAlert;
pub use appointment::NewAppointment;
pub use directory::{NewDoctor, NewHospital};
pub use memory::InMemoryStore;
pub use queue::{compact_positions, HospitalOverview, NewReceipt, TriageQueueManager};
pub use state_machine::{QueuePolicy, StateMachine};
pub use store::{QueueTransaction, TriageStore};
