//! 数据库模型

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use triage_core::models::*;
use triage_core::TriageError;
use uuid::Uuid;

// 数据库表模型 - 使用FromRow trait用于SQL查询，状态列以字符串存储

/// 数据库医院表
#[derive(Debug, FromRow)]
pub struct DbHospital {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbHospital> for Hospital {
    fn from(row: DbHospital) -> Self {
        Hospital {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

/// 数据库医生表
#[derive(Debug, FromRow)]
pub struct DbDoctor {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub name: String,
    pub specialization: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DbDoctor> for Doctor {
    fn from(row: DbDoctor) -> Self {
        Doctor {
            id: row.id,
            hospital_id: row.hospital_id,
            name: row.name,
            specialization: row.specialization,
            available: row.available,
            created_at: row.created_at,
        }
    }
}

/// 数据库分诊单表
#[derive(Debug, FromRow)]
pub struct DbReceipt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub condition: Option<String>,
    pub severity: Option<i32>,
    pub hospital_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: String,
    pub queue_position: Option<i32>,
    pub ai_analysis: Option<String>,
}

impl TryFrom<DbReceipt> for Receipt {
    type Error = TriageError;

    fn try_from(row: DbReceipt) -> Result<Self, Self::Error> {
        Ok(Receipt {
            id: row.id,
            user_id: row.user_id,
            image_url: row.image_url,
            uploaded_at: row.uploaded_at,
            processed_at: row.processed_at,
            condition: row.condition,
            severity: row.severity,
            hospital_id: row.hospital_id,
            doctor_id: row.doctor_id,
            status: row.status.parse()?,
            queue_position: row.queue_position,
            ai_analysis: row.ai_analysis,
        })
    }
}

/// 数据库预约表
#[derive(Debug, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub status: String,
    pub preferred_date: DateTime<Utc>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbAppointment> for Appointment {
    type Error = TriageError;

    fn try_from(row: DbAppointment) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: row.id,
            user_id: row.user_id,
            hospital_id: row.hospital_id,
            doctor_id: row.doctor_id,
            status: row.status.parse()?,
            preferred_date: row.preferred_date,
            scheduled_date: row.scheduled_date,
            reason: row.reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 数据库紧急警报表
#[derive(Debug, FromRow)]
pub struct DbEmergencyAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    pub status: String,
    pub patient_info: serde_json::Value,
    pub medical_history: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbEmergencyAlert> for EmergencyAlert {
    type Error = TriageError;

    fn try_from(row: DbEmergencyAlert) -> Result<Self, Self::Error> {
        Ok(EmergencyAlert {
            id: row.id,
            user_id: row.user_id,
            hospital_id: row.hospital_id,
            status: row.status.parse()?,
            patient_info: row.patient_info,
            medical_history: row.medical_history,
            created_at: row.created_at,
            responded_at: row.responded_at,
        })
    }
}

/// 批量转换查询结果
pub fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, TriageError>
where
    T: TryFrom<R, Error = TriageError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> DbReceipt {
        DbReceipt {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            image_url: "uploads/a.png".to_string(),
            uploaded_at: Utc::now(),
            processed_at: None,
            condition: None,
            severity: Some(2),
            hospital_id: None,
            doctor_id: None,
            status: status.to_string(),
            queue_position: None,
            ai_analysis: Some("{\"risk\":\"low\"}".to_string()),
        }
    }

    #[test]
    fn test_receipt_row_conversion() {
        let receipt = Receipt::try_from(row("PROCESSED")).unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Processed);
        assert_eq!(receipt.severity, Some(2));
    }

    #[test]
    fn test_corrupt_status_is_rejected() {
        assert!(Receipt::try_from(row("UNKNOWN")).is_err());
        let rows = vec![row("QUEUED"), row("bogus")];
        assert!(convert_rows::<DbReceipt, Receipt>(rows).is_err());
    }
}
