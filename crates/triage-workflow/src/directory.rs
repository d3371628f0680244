//! 医院与医生目录
//!
//! 医院和医生只作为查询对象被分诊单、预约和警报引用。

use crate::queue::TriageQueueManager;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use triage_core::{Doctor, Hospital, Result, TriageError};
use uuid::Uuid;

/// 新医院
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHospital {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// 新医生
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDoctor {
    pub hospital_id: Uuid,
    pub name: String,
    pub specialization: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl TriageQueueManager {
    /// 注册医院
    pub async fn register_hospital(&self, request: NewHospital) -> Result<Hospital> {
        if request.name.trim().is_empty() {
            return Err(TriageError::Validation("hospital name must not be empty".to_string()));
        }

        let hospital = Hospital {
            id: Uuid::new_v4(),
            name: request.name,
            address: request.address,
            phone: request.phone,
            created_at: Utc::now(),
        };
        self.store.insert_hospital(&hospital).await?;

        tracing::info!("Registered hospital {} ({})", hospital.id, hospital.name);
        Ok(hospital)
    }

    /// 获取医院，不存在时返回 NotFound
    pub async fn require_hospital(&self, hospital_id: Uuid) -> Result<Hospital> {
        self.store
            .find_hospital(hospital_id)
            .await?
            .ok_or_else(|| TriageError::not_found("hospital", hospital_id))
    }

    /// 注册医生
    pub async fn register_doctor(&self, request: NewDoctor) -> Result<Doctor> {
        if request.name.trim().is_empty() {
            return Err(TriageError::Validation("doctor name must not be empty".to_string()));
        }
        self.require_hospital(request.hospital_id).await?;

        let doctor = Doctor {
            id: Uuid::new_v4(),
            hospital_id: request.hospital_id,
            name: request.name,
            specialization: request.specialization,
            available: request.available,
            created_at: Utc::now(),
        };
        self.store.insert_doctor(&doctor).await?;

        tracing::info!("Registered doctor {} at hospital {}", doctor.id, doctor.hospital_id);
        Ok(doctor)
    }

    /// 更新医生可用状态
    pub async fn set_doctor_availability(&self, doctor_id: Uuid, available: bool) -> Result<Doctor> {
        let mut doctor = self
            .store
            .find_doctor(doctor_id)
            .await?
            .ok_or_else(|| TriageError::not_found("doctor", doctor_id))?;

        doctor.available = available;
        self.store.update_doctor(&doctor).await?;

        tracing::info!("Doctor {} availability set to {}", doctor_id, available);
        Ok(doctor)
    }

    /// 医院的医生列表
    pub async fn list_doctors(&self, hospital_id: Uuid) -> Result<Vec<Doctor>> {
        self.require_hospital(hospital_id).await?;
        self.store.find_doctors_by_hospital(hospital_id).await
    }

    /// 校验医生可被分配：存在、可用、且属于指定医院
    pub(crate) async fn ensure_doctor_eligible(
        &self,
        doctor_id: Uuid,
        hospital_id: Option<Uuid>,
    ) -> Result<Doctor> {
        let doctor = self
            .store
            .find_doctor(doctor_id)
            .await?
            .ok_or_else(|| TriageError::not_found("doctor", doctor_id))?;

        let unavailable = |reason: String| TriageError::DoctorUnavailable { doctor_id, reason };

        match hospital_id {
            None => Err(unavailable("no hospital assigned".to_string())),
            Some(hospital_id) if doctor.hospital_id != hospital_id => Err(unavailable(format!(
                "doctor belongs to hospital {}, not {}",
                doctor.hospital_id, hospital_id
            ))),
            Some(_) if !doctor.available => Err(unavailable("doctor is not available".to_string())),
            Some(_) => Ok(doctor),
        }
    }
}
