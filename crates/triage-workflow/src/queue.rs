//! 分诊队列管理
//!
//! 维护每家医院的 QUEUED 分诊单顺序，并负责分诊单的状态流转。
//! 队列位置在每家医院内唯一且连续（1..n），入队与出队都在持有该医院
//! 队列锁的事务中完成。

use crate::state_machine::{
    alert_state_machine, appointment_state_machine, receipt_state_machine, QueuePolicy,
    StateMachine,
};
use crate::store::TriageStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage_core::{
    AlertStatus, AppointmentStatus, Receipt, ReceiptStatus, Result, TriageError,
};
use uuid::Uuid;

/// 新分诊单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReceipt {
    pub user_id: Uuid,
    pub image_url: String,
    pub condition: Option<String>,
    pub severity: Option<i32>,
    pub hospital_id: Option<Uuid>,
    pub ai_analysis: Option<String>,
}

/// 医院概览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalOverview {
    pub hospital_id: Uuid,
    pub queue_length: usize,
    pub next_in_line: Option<Uuid>,
    pub open_alerts: usize,
    pub pending_appointments: usize,
    pub available_doctors: usize,
}

/// 分诊队列管理器
///
/// 不持有任何进程内可变状态，全部状态都在存储中，多个实例可以并行运行。
pub struct TriageQueueManager {
    pub(crate) store: Arc<dyn TriageStore>,
    policy: QueuePolicy,
    receipt_machine: StateMachine<ReceiptStatus>,
    pub(crate) appointment_machine: StateMachine<AppointmentStatus>,
    pub(crate) alert_machine: StateMachine<AlertStatus>,
}

impl TriageQueueManager {
    /// 创建新的队列管理器
    pub fn new(store: Arc<dyn TriageStore>, policy: QueuePolicy) -> Self {
        Self {
            receipt_machine: receipt_state_machine(&policy),
            appointment_machine: appointment_state_machine(),
            alert_machine: alert_state_machine(),
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &QueuePolicy {
        &self.policy
    }

    /// 患者上传病情单据，初始状态为 PENDING
    pub async fn submit_receipt(&self, request: NewReceipt) -> Result<Receipt> {
        if request.image_url.trim().is_empty() {
            return Err(TriageError::Validation("image_url must not be empty".to_string()));
        }
        if let Some(hospital_id) = request.hospital_id {
            self.require_hospital(hospital_id).await?;
        }

        let receipt = Receipt {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            image_url: request.image_url,
            uploaded_at: Utc::now(),
            processed_at: None,
            condition: request.condition,
            severity: request.severity,
            hospital_id: request.hospital_id,
            doctor_id: None,
            status: ReceiptStatus::Pending,
            queue_position: None,
            ai_analysis: request.ai_analysis,
        };

        self.store.insert_receipt(&receipt).await?;
        tracing::info!("Submitted receipt {} for user {}", receipt.id, receipt.user_id);
        Ok(receipt)
    }

    /// 获取分诊单
    pub async fn get_receipt(&self, receipt_id: Uuid) -> Result<Receipt> {
        self.store
            .find_receipt(receipt_id)
            .await?
            .ok_or_else(|| TriageError::not_found("receipt", receipt_id))
    }

    /// 将分诊单加入医院队列末尾，返回分配的队列位置
    ///
    /// PENDING 与 PROCESSED 状态均可入队（PROCESSED 即重新排队）。
    pub async fn enqueue(&self, receipt_id: Uuid, hospital_id: Uuid) -> Result<i32> {
        let mut tx = self.store.begin_queue_transaction(hospital_id).await?;

        let mut receipt = tx
            .find_receipt(receipt_id)
            .await?
            .ok_or_else(|| TriageError::not_found("receipt", receipt_id))?;

        match receipt.status {
            ReceiptStatus::Pending | ReceiptStatus::Processed => {}
            ReceiptStatus::Queued => {
                return Err(TriageError::InvalidState(format!(
                    "receipt {} is already queued",
                    receipt_id
                )))
            }
            ReceiptStatus::Completed => {
                return Err(TriageError::InvalidState(format!(
                    "receipt {} is already completed",
                    receipt_id
                )))
            }
        }

        let position = next_position(&tx.queued_receipts().await?);
        place_in_queue(&mut receipt, hospital_id, position);

        tx.update_receipt(&receipt).await?;
        tx.commit().await?;

        tracing::info!(
            "Enqueued receipt {} at hospital {} position {}",
            receipt_id,
            hospital_id,
            position
        );
        Ok(position)
    }

    /// 获取医院队列中排在最前的分诊单，不修改任何状态
    pub async fn dequeue_next(&self, hospital_id: Uuid) -> Result<Option<Receipt>> {
        let queued = self.queue_snapshot(hospital_id).await?;
        tracing::debug!("Hospital {} has {} queued receipts", hospital_id, queued.len());
        Ok(queued.into_iter().next())
    }

    /// 医院当前排队列表，按队列位置升序
    pub async fn queue_snapshot(&self, hospital_id: Uuid) -> Result<Vec<Receipt>> {
        self.require_hospital(hospital_id).await?;
        self.store
            .find_receipts_by_hospital_and_status(hospital_id, ReceiptStatus::Queued)
            .await
    }

    /// 推进分诊单状态，可同时分配医生
    ///
    /// 离开 QUEUED 时清空队列位置，并把同医院后面的分诊单依次前移。
    pub async fn advance(
        &self,
        receipt_id: Uuid,
        new_status: ReceiptStatus,
        doctor_id: Option<Uuid>,
    ) -> Result<Receipt> {
        let current = self.get_receipt(receipt_id).await?;
        self.receipt_machine.check(current.status, new_status)?;

        if let Some(doctor_id) = doctor_id {
            self.ensure_doctor_eligible(doctor_id, current.hospital_id).await?;
        }

        let from = current.status;
        let updated = match (from, new_status) {
            (ReceiptStatus::Pending, ReceiptStatus::Queued) => {
                self.queue_pending(current, doctor_id).await?
            }
            (ReceiptStatus::Queued, _) => self.leave_queue(current, new_status, doctor_id).await?,
            _ => {
                let mut receipt = current;
                apply_status(&mut receipt, new_status, doctor_id);
                self.store.update_receipt(&receipt, from).await?;
                receipt
            }
        };

        tracing::info!("Receipt {} advanced from {} to {}", receipt_id, from, new_status);
        Ok(updated)
    }

    /// PENDING → QUEUED，使用分诊单已关联的医院
    async fn queue_pending(&self, current: Receipt, doctor_id: Option<Uuid>) -> Result<Receipt> {
        let hospital_id = current.hospital_id.ok_or_else(|| {
            TriageError::InvalidState(format!(
                "receipt {} has no hospital assigned, enqueue it with a hospital",
                current.id
            ))
        })?;

        let mut tx = self.store.begin_queue_transaction(hospital_id).await?;
        let mut receipt = tx
            .find_receipt(current.id)
            .await?
            .ok_or_else(|| TriageError::not_found("receipt", current.id))?;
        if receipt.status != ReceiptStatus::Pending || receipt.hospital_id != Some(hospital_id) {
            return Err(TriageError::ConcurrencyConflict(format!(
                "receipt {} changed while queueing",
                current.id
            )));
        }

        let position = next_position(&tx.queued_receipts().await?);
        place_in_queue(&mut receipt, hospital_id, position);
        if doctor_id.is_some() {
            receipt.doctor_id = doctor_id;
        }

        tx.update_receipt(&receipt).await?;
        tx.commit().await?;

        tracing::info!(
            "Enqueued receipt {} at hospital {} position {}",
            receipt.id,
            hospital_id,
            position
        );
        Ok(receipt)
    }

    /// 离开队列并压缩剩余位置
    async fn leave_queue(
        &self,
        current: Receipt,
        new_status: ReceiptStatus,
        doctor_id: Option<Uuid>,
    ) -> Result<Receipt> {
        let hospital_id = current.hospital_id.ok_or_else(|| {
            TriageError::Internal(format!("queued receipt {} has no hospital", current.id))
        })?;

        let mut tx = self.store.begin_queue_transaction(hospital_id).await?;
        let mut receipt = tx
            .find_receipt(current.id)
            .await?
            .ok_or_else(|| TriageError::not_found("receipt", current.id))?;
        if receipt.status != ReceiptStatus::Queued || receipt.hospital_id != Some(hospital_id) {
            return Err(TriageError::ConcurrencyConflict(format!(
                "receipt {} left the queue of hospital {} concurrently",
                current.id, hospital_id
            )));
        }

        apply_status(&mut receipt, new_status, doctor_id);
        tx.update_receipt(&receipt).await?;

        let shifted = compact_positions(tx.queued_receipts().await?);
        for moved in &shifted {
            tx.update_receipt(moved).await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Receipt {} left queue of hospital {}, {} receipts moved up",
            receipt.id,
            hospital_id,
            shifted.len()
        );
        Ok(receipt)
    }

    /// 获取医院概览
    pub async fn hospital_overview(&self, hospital_id: Uuid) -> Result<HospitalOverview> {
        let queued = self.queue_snapshot(hospital_id).await?;

        let mut open_alerts = 0;
        for status in [
            AlertStatus::Pending,
            AlertStatus::Acknowledged,
            AlertStatus::Responded,
        ] {
            open_alerts += self
                .store
                .find_alerts_by_hospital_and_status(hospital_id, status)
                .await?
                .len();
        }

        let pending_appointments = self
            .store
            .find_appointments_by_hospital_and_status(hospital_id, AppointmentStatus::Pending)
            .await?
            .len();

        let available_doctors = self
            .store
            .find_doctors_by_hospital(hospital_id)
            .await?
            .iter()
            .filter(|d| d.available)
            .count();

        Ok(HospitalOverview {
            hospital_id,
            queue_length: queued.len(),
            next_in_line: queued.first().map(|r| r.id),
            open_alerts,
            pending_appointments,
            available_doctors,
        })
    }
}

/// 下一个队列位置：当前最大位置加一
fn next_position(queued: &[Receipt]) -> i32 {
    queued
        .iter()
        .filter_map(|r| r.queue_position)
        .max()
        .unwrap_or(0)
        + 1
}

fn place_in_queue(receipt: &mut Receipt, hospital_id: Uuid, position: i32) {
    // 换到另一家医院时，原医院的医生分配失效
    if receipt.hospital_id != Some(hospital_id) {
        receipt.doctor_id = None;
    }
    receipt.hospital_id = Some(hospital_id);
    apply_status(receipt, ReceiptStatus::Queued, None);
    receipt.queue_position = Some(position);
}

fn apply_status(receipt: &mut Receipt, new_status: ReceiptStatus, doctor_id: Option<Uuid>) {
    if receipt.status == ReceiptStatus::Pending && receipt.processed_at.is_none() {
        receipt.processed_at = Some(Utc::now());
    }
    if new_status != ReceiptStatus::Queued {
        receipt.queue_position = None;
    }
    receipt.status = new_status;
    if doctor_id.is_some() {
        receipt.doctor_id = doctor_id;
    }
}

/// 将按位置排好序的排队单据重新编号为 1..n
///
/// 只返回位置发生变化的单据，顺序为升序，逐条写回时不会与唯一索引冲突。
pub fn compact_positions(queued: Vec<Receipt>) -> Vec<Receipt> {
    queued
        .into_iter()
        .enumerate()
        .filter_map(|(index, mut receipt)| {
            let position = index as i32 + 1;
            if receipt.queue_position == Some(position) {
                None
            } else {
                receipt.queue_position = Some(position);
                Some(receipt)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_dense, setup, setup_with_policy, submit};

    #[tokio::test]
    async fn test_sequential_enqueue_is_monotonic() {
        let (manager, hospital_id) = setup().await;

        for expected in 1..=5 {
            let receipt = submit(&manager, None).await;
            let position = manager.enqueue(receipt.id, hospital_id).await.unwrap();
            assert_eq!(position, expected);
        }
        assert_dense(&manager, hospital_id).await;
    }

    #[tokio::test]
    async fn test_advance_compacts_queue() {
        let (manager, hospital_id) = setup().await;
        let a = submit(&manager, None).await;
        let b = submit(&manager, None).await;
        let c = submit(&manager, None).await;
        for r in [&a, &b, &c] {
            manager.enqueue(r.id, hospital_id).await.unwrap();
        }

        let b = manager.advance(b.id, ReceiptStatus::Processed, None).await.unwrap();
        assert_eq!(b.queue_position, None);
        assert_eq!(b.status, ReceiptStatus::Processed);

        let queue = manager.queue_snapshot(hospital_id).await.unwrap();
        let order: Vec<(Uuid, Option<i32>)> =
            queue.iter().map(|r| (r.id, r.queue_position)).collect();
        assert_eq!(order, vec![(a.id, Some(1)), (c.id, Some(2))]);
    }

    #[tokio::test]
    async fn test_scenario_enqueue_then_process() {
        let (manager, hospital_id) = setup().await;
        let r1 = submit(&manager, None).await;
        assert_eq!(r1.status, ReceiptStatus::Pending);

        let position = manager.enqueue(r1.id, hospital_id).await.unwrap();
        assert_eq!(position, 1);
        let queued = manager.get_receipt(r1.id).await.unwrap();
        assert_eq!(queued.status, ReceiptStatus::Queued);

        let processed = manager.advance(r1.id, ReceiptStatus::Processed, None).await.unwrap();
        assert_eq!(processed.queue_position, None);
        assert_eq!(processed.status, ReceiptStatus::Processed);
        assert!(processed.processed_at.is_some());
    }

    #[tokio::test]
    async fn test_dequeue_next_is_pure_read() {
        let (manager, hospital_id) = setup().await;
        assert!(manager.dequeue_next(hospital_id).await.unwrap().is_none());

        let first = submit(&manager, None).await;
        let second = submit(&manager, None).await;
        manager.enqueue(first.id, hospital_id).await.unwrap();
        manager.enqueue(second.id, hospital_id).await.unwrap();

        let once = manager.dequeue_next(hospital_id).await.unwrap().unwrap();
        let twice = manager.dequeue_next(hospital_id).await.unwrap().unwrap();
        assert_eq!(once.id, first.id);
        assert_eq!(once, twice);
        assert_eq!(twice.status, ReceiptStatus::Queued);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_completed_and_missing() {
        let (manager, hospital_id) = setup().await;
        let receipt = submit(&manager, None).await;
        manager.advance(receipt.id, ReceiptStatus::Completed, None).await.unwrap();

        let err = manager.enqueue(receipt.id, hospital_id).await.unwrap_err();
        assert!(matches!(err, TriageError::InvalidState(_)));

        let err = manager.enqueue(Uuid::new_v4(), hospital_id).await.unwrap_err();
        assert!(matches!(err, TriageError::NotFound { entity: "receipt", .. }));

        let err = manager.enqueue(receipt.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, TriageError::NotFound { entity: "hospital", .. }));
    }

    #[tokio::test]
    async fn test_enqueue_twice_is_invalid_state() {
        let (manager, hospital_id) = setup().await;
        let receipt = submit(&manager, None).await;
        manager.enqueue(receipt.id, hospital_id).await.unwrap();

        let err = manager.enqueue(receipt.id, hospital_id).await.unwrap_err();
        assert!(matches!(err, TriageError::InvalidState(_)));
        assert_dense(&manager, hospital_id).await;
    }

    #[tokio::test]
    async fn test_processed_receipt_can_requeue() {
        let (manager, hospital_id) = setup().await;
        let a = submit(&manager, None).await;
        let b = submit(&manager, None).await;
        manager.enqueue(a.id, hospital_id).await.unwrap();
        manager.enqueue(b.id, hospital_id).await.unwrap();
        let processed = manager.advance(a.id, ReceiptStatus::Processed, None).await.unwrap();
        let processed_at = processed.processed_at;

        let position = manager.enqueue(a.id, hospital_id).await.unwrap();
        assert_eq!(position, 2);
        let requeued = manager.get_receipt(a.id).await.unwrap();
        assert_eq!(requeued.processed_at, processed_at);
        assert_dense(&manager, hospital_id).await;
    }

    #[tokio::test]
    async fn test_invalid_receipt_transitions() {
        let (manager, hospital_id) = setup().await;
        let receipt = submit(&manager, None).await;
        manager.enqueue(receipt.id, hospital_id).await.unwrap();

        let err = manager
            .advance(receipt.id, ReceiptStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidTransition { .. }));

        let err = manager
            .advance(receipt.id, ReceiptStatus::Pending, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidTransition { .. }));

        // 失败的转换不影响队列
        let still = manager.get_receipt(receipt.id).await.unwrap();
        assert_eq!(still.queue_position, Some(1));
    }

    #[tokio::test]
    async fn test_direct_completion_guard() {
        let (strict, _) = setup_with_policy(QueuePolicy {
            allow_direct_completion: false,
        })
        .await;
        assert!(!strict.policy().allow_direct_completion);
        let receipt = submit(&strict, None).await;
        let err = strict
            .advance(receipt.id, ReceiptStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidTransition { .. }));

        let (lenient, _) = setup().await;
        let receipt = submit(&lenient, None).await;
        let done = lenient
            .advance(receipt.id, ReceiptStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(done.status, ReceiptStatus::Completed);
        assert!(done.processed_at.is_some());
    }

    #[tokio::test]
    async fn test_advance_pending_to_queued_uses_receipt_hospital() {
        let (manager, hospital_id) = setup().await;
        let existing = submit(&manager, None).await;
        manager.enqueue(existing.id, hospital_id).await.unwrap();

        let receipt = submit(&manager, Some(hospital_id)).await;
        let queued = manager.advance(receipt.id, ReceiptStatus::Queued, None).await.unwrap();
        assert_eq!(queued.queue_position, Some(2));

        let orphan = submit(&manager, None).await;
        let err = manager
            .advance(orphan.id, ReceiptStatus::Queued, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_advance_assigns_available_doctor_only() {
        let (manager, hospital_id) = setup().await;
        let doctor = crate::testing::doctor(&manager, hospital_id, true).await;
        let off_duty = crate::testing::doctor(&manager, hospital_id, false).await;
        let other_hospital = crate::testing::hospital(&manager).await;
        let elsewhere = crate::testing::doctor(&manager, other_hospital, true).await;

        let receipt = submit(&manager, None).await;
        manager.enqueue(receipt.id, hospital_id).await.unwrap();

        let err = manager
            .advance(receipt.id, ReceiptStatus::Processed, Some(off_duty.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::DoctorUnavailable { .. }));

        let err = manager
            .advance(receipt.id, ReceiptStatus::Processed, Some(elsewhere.id))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::DoctorUnavailable { .. }));

        let err = manager
            .advance(receipt.id, ReceiptStatus::Processed, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::NotFound { entity: "doctor", .. }));

        let processed = manager
            .advance(receipt.id, ReceiptStatus::Processed, Some(doctor.id))
            .await
            .unwrap();
        assert_eq!(processed.doctor_id, Some(doctor.id));
    }

    #[tokio::test]
    async fn test_queues_are_independent_per_hospital() {
        let (manager, first) = setup().await;
        let second = crate::testing::hospital(&manager).await;

        let a = submit(&manager, None).await;
        let b = submit(&manager, None).await;
        assert_eq!(manager.enqueue(a.id, first).await.unwrap(), 1);
        assert_eq!(manager.enqueue(b.id, second).await.unwrap(), 1);

        manager.advance(a.id, ReceiptStatus::Processed, None).await.unwrap();
        let other = manager.queue_snapshot(second).await.unwrap();
        assert_eq!(other[0].queue_position, Some(1));
    }

    #[tokio::test]
    async fn test_density_after_mixed_operations() {
        let (manager, hospital_id) = setup().await;
        let mut ids = Vec::new();
        for _ in 0..8 {
            let receipt = submit(&manager, None).await;
            manager.enqueue(receipt.id, hospital_id).await.unwrap();
            ids.push(receipt.id);
        }

        // 依次移除头部、尾部和中间
        for id in [ids[0], ids[7], ids[3], ids[4]] {
            manager.advance(id, ReceiptStatus::Processed, None).await.unwrap();
            assert_dense(&manager, hospital_id).await;
        }
        manager.enqueue(ids[3], hospital_id).await.unwrap();
        assert_dense(&manager, hospital_id).await;

        let queue = manager.queue_snapshot(hospital_id).await.unwrap();
        let order: Vec<Uuid> = queue.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[5], ids[6], ids[3]]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enqueue_never_shares_position() {
        let (manager, hospital_id) = setup().await;
        let manager = Arc::new(manager);

        let mut ids = Vec::new();
        for _ in 0..32 {
            ids.push(submit(&manager, None).await.id);
        }

        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.enqueue(id, hospital_id).await })
            })
            .collect();

        let mut positions = Vec::new();
        for handle in handles {
            positions.push(handle.await.unwrap().unwrap());
        }
        positions.sort_unstable();
        assert_eq!(positions, (1..=32).collect::<Vec<i32>>());
        assert_dense(&manager, hospital_id).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_advance_keeps_queue_dense() {
        let (manager, hospital_id) = setup().await;
        let manager = Arc::new(manager);

        let mut ids = Vec::new();
        for _ in 0..20 {
            let receipt = submit(&manager, None).await;
            manager.enqueue(receipt.id, hospital_id).await.unwrap();
            ids.push(receipt.id);
        }

        let handles: Vec<_> = ids
            .iter()
            .step_by(2)
            .map(|&id| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager.advance(id, ReceiptStatus::Processed, None).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let remaining = manager.queue_snapshot(hospital_id).await.unwrap();
        assert_eq!(remaining.len(), 10);
        assert_dense(&manager, hospital_id).await;
    }

    #[tokio::test]
    async fn test_hospital_overview() {
        let (manager, hospital_id) = setup().await;
        crate::testing::doctor(&manager, hospital_id, true).await;
        crate::testing::doctor(&manager, hospital_id, false).await;
        let receipt = submit(&manager, None).await;
        manager.enqueue(receipt.id, hospital_id).await.unwrap();

        let overview = manager.hospital_overview(hospital_id).await.unwrap();
        assert_eq!(overview.queue_length, 1);
        assert_eq!(overview.next_in_line, Some(receipt.id));
        assert_eq!(overview.available_doctors, 1);
        assert_eq!(overview.open_alerts, 0);
    }

    #[test]
    fn test_compact_positions_heals_gaps() {
        let hospital_id = Uuid::new_v4();
        let queued: Vec<Receipt> = [1, 3, 4, 7]
            .iter()
            .map(|&p| crate::testing::queued_receipt(hospital_id, p))
            .collect();

        let moved = compact_positions(queued);
        let positions: Vec<Option<i32>> = moved.iter().map(|r| r.queue_position).collect();
        assert_eq!(positions, vec![Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn test_next_position_starts_at_one() {
        assert_eq!(next_position(&[]), 1);
        let hospital_id = Uuid::new_v4();
        let queued = vec![
            crate::testing::queued_receipt(hospital_id, 2),
            crate::testing::queued_receipt(hospital_id, 1),
        ];
        assert_eq!(next_position(&queued), 3);
    }
}
