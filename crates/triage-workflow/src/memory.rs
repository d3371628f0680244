//! 内存存储
//!
//! 用于测试和演示模式。每家医院一把异步互斥锁充当队列锁，
//! 事务内的写入先暂存，提交时整体生效。

use crate::store::{QueueTransaction, TriageStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedMutexGuard, RwLock};
use triage_core::{
    AlertStatus, Appointment, AppointmentStatus, Doctor, EmergencyAlert, Hospital, Receipt,
    ReceiptStatus, Result, TriageError,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreState {
    hospitals: HashMap<Uuid, Hospital>,
    doctors: HashMap<Uuid, Doctor>,
    receipts: HashMap<Uuid, Receipt>,
    appointments: HashMap<Uuid, Appointment>,
    alerts: HashMap<Uuid, EmergencyAlert>,
}

/// 内存分诊存储
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
    queue_locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_lock(&self, hospital_id: Uuid) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .queue_locks
            .lock()
            .map_err(|_| TriageError::Internal("queue lock table poisoned".to_string()))?;
        Ok(locks.entry(hospital_id).or_default().clone())
    }
}

fn conflict(entity: &str, id: Uuid, expected: impl std::fmt::Display, actual: impl std::fmt::Display) -> TriageError {
    TriageError::ConcurrencyConflict(format!(
        "{} {} expected status {} but found {}",
        entity, id, expected, actual
    ))
}

#[async_trait]
impl TriageStore for InMemoryStore {
    async fn insert_hospital(&self, hospital: &Hospital) -> Result<()> {
        let mut state = self.state.write().await;
        state.hospitals.insert(hospital.id, hospital.clone());
        Ok(())
    }

    async fn find_hospital(&self, id: Uuid) -> Result<Option<Hospital>> {
        Ok(self.state.read().await.hospitals.get(&id).cloned())
    }

    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()> {
        let mut state = self.state.write().await;
        state.doctors.insert(doctor.id, doctor.clone());
        Ok(())
    }

    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>> {
        Ok(self.state.read().await.doctors.get(&id).cloned())
    }

    async fn update_doctor(&self, doctor: &Doctor) -> Result<()> {
        let mut state = self.state.write().await;
        match state.doctors.get_mut(&doctor.id) {
            Some(existing) => {
                *existing = doctor.clone();
                Ok(())
            }
            None => Err(TriageError::not_found("doctor", doctor.id)),
        }
    }

    async fn find_doctors_by_hospital(&self, hospital_id: Uuid) -> Result<Vec<Doctor>> {
        let state = self.state.read().await;
        let mut doctors: Vec<Doctor> = state
            .doctors
            .values()
            .filter(|d| d.hospital_id == hospital_id)
            .cloned()
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn insert_receipt(&self, receipt: &Receipt) -> Result<()> {
        let mut state = self.state.write().await;
        state.receipts.insert(receipt.id, receipt.clone());
        Ok(())
    }

    async fn find_receipt(&self, id: Uuid) -> Result<Option<Receipt>> {
        Ok(self.state.read().await.receipts.get(&id).cloned())
    }

    async fn update_receipt(&self, receipt: &Receipt, expected: ReceiptStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let existing = state
            .receipts
            .get_mut(&receipt.id)
            .ok_or_else(|| TriageError::not_found("receipt", receipt.id))?;
        if existing.status != expected {
            return Err(conflict("receipt", receipt.id, expected, existing.status));
        }
        *existing = receipt.clone();
        Ok(())
    }

    async fn find_receipts_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: ReceiptStatus,
    ) -> Result<Vec<Receipt>> {
        let state = self.state.read().await;
        let mut receipts: Vec<Receipt> = state
            .receipts
            .values()
            .filter(|r| r.hospital_id == Some(hospital_id) && r.status == status)
            .cloned()
            .collect();
        sort_by_position(&mut receipts);
        Ok(receipts)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<()> {
        let mut state = self.state.write().await;
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn update_appointment(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let existing = state
            .appointments
            .get_mut(&appointment.id)
            .ok_or_else(|| TriageError::not_found("appointment", appointment.id))?;
        if existing.status != expected {
            return Err(conflict("appointment", appointment.id, expected, existing.status));
        }
        *existing = appointment.clone();
        Ok(())
    }

    async fn find_appointments_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>> {
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.hospital_id == hospital_id && a.status == status)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.preferred_date);
        Ok(appointments)
    }

    async fn insert_alert(&self, alert: &EmergencyAlert) -> Result<()> {
        let mut state = self.state.write().await;
        state.alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn find_alert(&self, id: Uuid) -> Result<Option<EmergencyAlert>> {
        Ok(self.state.read().await.alerts.get(&id).cloned())
    }

    async fn update_alert(&self, alert: &EmergencyAlert, expected: AlertStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let existing = state
            .alerts
            .get_mut(&alert.id)
            .ok_or_else(|| TriageError::not_found("emergency_alert", alert.id))?;
        if existing.status != expected {
            return Err(conflict("emergency_alert", alert.id, expected, existing.status));
        }
        *existing = alert.clone();
        Ok(())
    }

    async fn find_alerts_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: AlertStatus,
    ) -> Result<Vec<EmergencyAlert>> {
        let state = self.state.read().await;
        let mut alerts: Vec<EmergencyAlert> = state
            .alerts
            .values()
            .filter(|a| a.hospital_id == hospital_id && a.status == status)
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.created_at);
        Ok(alerts)
    }

    async fn begin_queue_transaction(&self, hospital_id: Uuid) -> Result<Box<dyn QueueTransaction>> {
        if self.find_hospital(hospital_id).await?.is_none() {
            return Err(TriageError::not_found("hospital", hospital_id));
        }

        let guard = self.queue_lock(hospital_id)?.lock_owned().await;
        tracing::debug!("Acquired queue lock for hospital {}", hospital_id);

        Ok(Box::new(MemoryQueueTransaction {
            state: self.state.clone(),
            hospital_id,
            snapshots: HashMap::new(),
            staged: HashMap::new(),
            _guard: guard,
        }))
    }
}

fn sort_by_position(receipts: &mut [Receipt]) {
    receipts.sort_by(|a, b| {
        let a_pos = a.queue_position.unwrap_or(i32::MAX);
        let b_pos = b.queue_position.unwrap_or(i32::MAX);
        a_pos.cmp(&b_pos).then(a.uploaded_at.cmp(&b.uploaded_at))
    });
}

/// 内存队列事务
///
/// 读到的已提交版本记为快照，提交时若快照已被其他写入改变则整体放弃。
struct MemoryQueueTransaction {
    state: Arc<RwLock<StoreState>>,
    hospital_id: Uuid,
    snapshots: HashMap<Uuid, Receipt>,
    staged: HashMap<Uuid, Receipt>,
    _guard: OwnedMutexGuard<()>,
}

impl MemoryQueueTransaction {
    fn remember(&mut self, receipt: &Receipt) {
        self.snapshots
            .entry(receipt.id)
            .or_insert_with(|| receipt.clone());
    }
}

#[async_trait]
impl QueueTransaction for MemoryQueueTransaction {
    async fn find_receipt(&mut self, id: Uuid) -> Result<Option<Receipt>> {
        if let Some(staged) = self.staged.get(&id) {
            return Ok(Some(staged.clone()));
        }
        let committed = self.state.read().await.receipts.get(&id).cloned();
        if let Some(receipt) = &committed {
            self.remember(receipt);
        }
        Ok(committed)
    }

    async fn queued_receipts(&mut self) -> Result<Vec<Receipt>> {
        let committed: Vec<Receipt> = {
            let state = self.state.read().await;
            state
                .receipts
                .values()
                .filter(|r| r.hospital_id == Some(self.hospital_id) && r.is_queued())
                .cloned()
                .collect()
        };

        let mut queued = Vec::with_capacity(committed.len());
        for receipt in committed {
            self.remember(&receipt);
            if !self.staged.contains_key(&receipt.id) {
                queued.push(receipt);
            }
        }
        queued.extend(
            self.staged
                .values()
                .filter(|r| r.hospital_id == Some(self.hospital_id) && r.is_queued())
                .cloned(),
        );

        sort_by_position(&mut queued);
        Ok(queued)
    }

    async fn update_receipt(&mut self, receipt: &Receipt) -> Result<()> {
        self.staged.insert(receipt.id, receipt.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryQueueTransaction {
            state,
            hospital_id,
            snapshots,
            staged,
            _guard,
        } = *self;
        let mut state = state.write().await;

        for id in staged.keys() {
            if let Some(snapshot) = snapshots.get(id) {
                if state.receipts.get(id) != Some(snapshot) {
                    return Err(TriageError::ConcurrencyConflict(format!(
                        "receipt {} changed outside the queue transaction of hospital {}",
                        id, hospital_id
                    )));
                }
            }
        }

        let count = staged.len();
        state.receipts.extend(staged);

        tracing::debug!("Committed {} receipt writes for hospital {}", count, hospital_id);
        Ok(())
    }
}
