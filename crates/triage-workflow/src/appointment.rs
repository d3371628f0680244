//! 就诊预约
//!
//! 预约按日期安排，不参与队列排序。

use crate::queue::TriageQueueManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_core::{Appointment, AppointmentStatus, Result, TriageError};
use uuid::Uuid;

/// 新预约
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    pub preferred_date: DateTime<Utc>,
    pub reason: Option<String>,
}

impl TriageQueueManager {
    /// 申请预约
    pub async fn request_appointment(&self, request: NewAppointment) -> Result<Appointment> {
        self.require_hospital(request.hospital_id).await?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            hospital_id: request.hospital_id,
            doctor_id: None,
            status: AppointmentStatus::Pending,
            preferred_date: request.preferred_date,
            scheduled_date: None,
            reason: request.reason,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_appointment(&appointment).await?;

        tracing::info!(
            "Appointment {} requested at hospital {} for {}",
            appointment.id,
            appointment.hospital_id,
            appointment.preferred_date
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment> {
        self.store
            .find_appointment(appointment_id)
            .await?
            .ok_or_else(|| TriageError::not_found("appointment", appointment_id))
    }

    /// 确认预约
    ///
    /// 未指定时间时按患者期望日期安排；可同时分配医生。
    pub async fn confirm_appointment(
        &self,
        appointment_id: Uuid,
        scheduled_date: Option<DateTime<Utc>>,
        doctor_id: Option<Uuid>,
    ) -> Result<Appointment> {
        let mut appointment = self.get_appointment(appointment_id).await?;
        self.appointment_machine
            .check(appointment.status, AppointmentStatus::Confirmed)?;

        if let Some(doctor_id) = doctor_id {
            self.ensure_doctor_eligible(doctor_id, Some(appointment.hospital_id))
                .await?;
            appointment.doctor_id = Some(doctor_id);
        }
        appointment.scheduled_date = Some(scheduled_date.unwrap_or(appointment.preferred_date));

        self.store_appointment_transition(appointment, AppointmentStatus::Confirmed)
            .await
    }

    /// 取消预约
    pub async fn cancel_appointment(&self, appointment_id: Uuid) -> Result<Appointment> {
        let appointment = self.get_appointment(appointment_id).await?;
        self.appointment_machine
            .check(appointment.status, AppointmentStatus::Cancelled)?;
        self.store_appointment_transition(appointment, AppointmentStatus::Cancelled)
            .await
    }

    /// 完成预约
    pub async fn complete_appointment(&self, appointment_id: Uuid) -> Result<Appointment> {
        let appointment = self.get_appointment(appointment_id).await?;
        self.appointment_machine
            .check(appointment.status, AppointmentStatus::Completed)?;
        self.store_appointment_transition(appointment, AppointmentStatus::Completed)
            .await
    }

    /// 医院某状态下的预约，按期望日期排序
    pub async fn list_appointments(
        &self,
        hospital_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>> {
        self.require_hospital(hospital_id).await?;
        self.store
            .find_appointments_by_hospital_and_status(hospital_id, status)
            .await
    }

    async fn store_appointment_transition(
        &self,
        mut appointment: Appointment,
        target: AppointmentStatus,
    ) -> Result<Appointment> {
        let from = appointment.status;
        appointment.status = target;
        appointment.updated_at = Utc::now();
        self.store.update_appointment(&appointment, from).await?;

        tracing::info!("Appointment {} moved from {} to {}", appointment.id, from, target);
        Ok(appointment)
    }
}
