//! 持久化接口
//!
//! 队列管理器只依赖这些接口，PostgreSQL 与内存实现各自提供。

use async_trait::async_trait;
use triage_core::{
    AlertStatus, Appointment, AppointmentStatus, Doctor, EmergencyAlert, Hospital, Receipt,
    ReceiptStatus, Result,
};
use uuid::Uuid;

/// 分诊数据存储
///
/// `update_*` 为比较并交换语义：行的当前状态必须等于 `expected`，
/// 否则返回 `TriageError::ConcurrencyConflict`。
#[async_trait]
pub trait TriageStore: Send + Sync {
    async fn insert_hospital(&self, hospital: &Hospital) -> Result<()>;
    async fn find_hospital(&self, id: Uuid) -> Result<Option<Hospital>>;

    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()>;
    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>>;
    async fn update_doctor(&self, doctor: &Doctor) -> Result<()>;
    async fn find_doctors_by_hospital(&self, hospital_id: Uuid) -> Result<Vec<Doctor>>;

    async fn insert_receipt(&self, receipt: &Receipt) -> Result<()>;
    async fn find_receipt(&self, id: Uuid) -> Result<Option<Receipt>>;
    async fn update_receipt(&self, receipt: &Receipt, expected: ReceiptStatus) -> Result<()>;
    /// 按队列位置升序，其次按上传时间
    async fn find_receipts_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: ReceiptStatus,
    ) -> Result<Vec<Receipt>>;

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<()>;
    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>>;
    async fn update_appointment(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> Result<()>;
    /// 按期望日期升序
    async fn find_appointments_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>>;

    async fn insert_alert(&self, alert: &EmergencyAlert) -> Result<()>;
    async fn find_alert(&self, id: Uuid) -> Result<Option<EmergencyAlert>>;
    async fn update_alert(&self, alert: &EmergencyAlert, expected: AlertStatus) -> Result<()>;
    /// 按创建时间升序
    async fn find_alerts_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: AlertStatus,
    ) -> Result<Vec<EmergencyAlert>>;

    /// 开启一个持有该医院队列独占锁的事务
    ///
    /// 医院不存在时返回 NotFound。同一医院同时只能有一个事务存活，
    /// 不同医院的事务互不阻塞。
    async fn begin_queue_transaction(&self, hospital_id: Uuid) -> Result<Box<dyn QueueTransaction>>;
}

/// 医院队列事务
///
/// 未调用 `commit` 就被丢弃时，所有写入回滚。
#[async_trait]
pub trait QueueTransaction: Send {
    async fn find_receipt(&mut self, id: Uuid) -> Result<Option<Receipt>>;

    /// 当前医院所有 QUEUED 分诊单，按队列位置升序，包含本事务内的写入
    async fn queued_receipts(&mut self) -> Result<Vec<Receipt>>;

    async fn update_receipt(&mut self, receipt: &Receipt) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
