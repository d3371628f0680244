//! PostgreSQL 分诊存储
//!
//! 队列事务以 `SELECT ... FOR NO KEY UPDATE` 锁住医院行作为该医院的队列锁，
//! 不阻塞外键检查所需的 KEY SHARE 锁。事务内读取的分诊单加 `FOR UPDATE` 行锁。

use crate::connection::DatabasePool;
use crate::models::*;
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use triage_core::{
    AlertStatus, Appointment, AppointmentStatus, Doctor, EmergencyAlert, Hospital, Receipt,
    ReceiptStatus, Result, TriageError,
};
use triage_workflow::{QueueTransaction, TriageStore};
use uuid::Uuid;

const UPDATE_RECEIPT: &str = r#"
    UPDATE receipts
    SET processed_at = $2, condition = $3, severity = $4, hospital_id = $5, doctor_id = $6,
        status = $7, queue_position = $8, ai_analysis = $9
    WHERE id = $1
"#;

/// 队列锁：与外键检查的 KEY SHARE 兼容，同一医院的队列事务互斥
const LOCK_HOSPITAL: &str = "SELECT id FROM hospitals WHERE id = $1 FOR NO KEY UPDATE";

/// PostgreSQL 分诊存储
#[derive(Debug, Clone)]
pub struct PgTriageStore {
    pool: DatabasePool,
}

impl PgTriageStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// 比较并交换更新失败时，区分记录不存在与状态已被修改
    async fn cas_failure(&self, table: &'static str, entity: &'static str, id: Uuid, expected: &str) -> TriageError {
        let sql = format!("SELECT status FROM {} WHERE id = $1", table);
        match sqlx::query_scalar::<_, String>(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
        {
            Ok(Some(actual)) => TriageError::ConcurrencyConflict(format!(
                "{} {} expected status {} but found {}",
                entity, id, expected, actual
            )),
            Ok(None) => TriageError::not_found(entity, id),
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl TriageStore for PgTriageStore {
    async fn insert_hospital(&self, hospital: &Hospital) -> Result<()> {
        sqlx::query(
            "INSERT INTO hospitals (id, name, address, phone, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(hospital.id)
        .bind(&hospital.name)
        .bind(&hospital.address)
        .bind(&hospital.phone)
        .bind(hospital.created_at)
        .execute(self.pool.pool())
        .await?;
        Ok(())
    }

    async fn find_hospital(&self, id: Uuid) -> Result<Option<Hospital>> {
        let row = sqlx::query_as::<_, DbHospital>("SELECT * FROM hospitals WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;
        Ok(row.map(Hospital::from))
    }

    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO doctors (id, hospital_id, name, specialization, available, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(doctor.id)
        .bind(doctor.hospital_id)
        .bind(&doctor.name)
        .bind(&doctor.specialization)
        .bind(doctor.available)
        .bind(doctor.created_at)
        .execute(self.pool.pool())
        .await?;
        Ok(())
    }

    async fn find_doctor(&self, id: Uuid) -> Result<Option<Doctor>> {
        let row = sqlx::query_as::<_, DbDoctor>("SELECT * FROM doctors WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;
        Ok(row.map(Doctor::from))
    }

    async fn update_doctor(&self, doctor: &Doctor) -> Result<()> {
        let result = sqlx::query(
            "UPDATE doctors SET name = $2, specialization = $3, available = $4 WHERE id = $1",
        )
        .bind(doctor.id)
        .bind(&doctor.name)
        .bind(&doctor.specialization)
        .bind(doctor.available)
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(TriageError::not_found("doctor", doctor.id));
        }
        Ok(())
    }

    async fn find_doctors_by_hospital(&self, hospital_id: Uuid) -> Result<Vec<Doctor>> {
        let rows = sqlx::query_as::<_, DbDoctor>(
            "SELECT * FROM doctors WHERE hospital_id = $1 ORDER BY name",
        )
        .bind(hospital_id)
        .fetch_all(self.pool.pool())
        .await?;
        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    async fn insert_receipt(&self, receipt: &Receipt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO receipts (id, user_id, image_url, uploaded_at, processed_at, condition,
                severity, hospital_id, doctor_id, status, queue_position, ai_analysis)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(receipt.id)
        .bind(receipt.user_id)
        .bind(&receipt.image_url)
        .bind(receipt.uploaded_at)
        .bind(receipt.processed_at)
        .bind(&receipt.condition)
        .bind(receipt.severity)
        .bind(receipt.hospital_id)
        .bind(receipt.doctor_id)
        .bind(receipt.status.as_str())
        .bind(receipt.queue_position)
        .bind(&receipt.ai_analysis)
        .execute(self.pool.pool())
        .await?;
        Ok(())
    }

    async fn find_receipt(&self, id: Uuid) -> Result<Option<Receipt>> {
        let row = sqlx::query_as::<_, DbReceipt>("SELECT * FROM receipts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;
        row.map(Receipt::try_from).transpose()
    }

    async fn update_receipt(&self, receipt: &Receipt, expected: ReceiptStatus) -> Result<()> {
        let sql = format!("{} AND status = $10", UPDATE_RECEIPT);
        let result = bind_receipt(sqlx::query(&sql), receipt)
            .bind(expected.as_str())
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .cas_failure("receipts", "receipt", receipt.id, expected.as_str())
                .await);
        }
        Ok(())
    }

    async fn find_receipts_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: ReceiptStatus,
    ) -> Result<Vec<Receipt>> {
        let rows = sqlx::query_as::<_, DbReceipt>(
            r#"
            SELECT * FROM receipts
            WHERE hospital_id = $1 AND status = $2
            ORDER BY queue_position NULLS LAST, uploaded_at
            "#,
        )
        .bind(hospital_id)
        .bind(status.as_str())
        .fetch_all(self.pool.pool())
        .await?;
        convert_rows(rows)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments (id, user_id, hospital_id, doctor_id, status, preferred_date,
                scheduled_date, reason, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.user_id)
        .bind(appointment.hospital_id)
        .bind(appointment.doctor_id)
        .bind(appointment.status.as_str())
        .bind(appointment.preferred_date)
        .bind(appointment.scheduled_date)
        .bind(&appointment.reason)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(self.pool.pool())
        .await?;
        Ok(())
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, DbAppointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;
        row.map(Appointment::try_from).transpose()
    }

    async fn update_appointment(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET doctor_id = $2, status = $3, scheduled_date = $4, reason = $5, updated_at = $6
            WHERE id = $1 AND status = $7
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.doctor_id)
        .bind(appointment.status.as_str())
        .bind(appointment.scheduled_date)
        .bind(&appointment.reason)
        .bind(appointment.updated_at)
        .bind(expected.as_str())
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .cas_failure("appointments", "appointment", appointment.id, expected.as_str())
                .await);
        }
        Ok(())
    }

    async fn find_appointments_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, DbAppointment>(
            "SELECT * FROM appointments WHERE hospital_id = $1 AND status = $2 ORDER BY preferred_date",
        )
        .bind(hospital_id)
        .bind(status.as_str())
        .fetch_all(self.pool.pool())
        .await?;
        convert_rows(rows)
    }

    async fn insert_alert(&self, alert: &EmergencyAlert) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO emergency_alerts (id, user_id, hospital_id, status, patient_info,
                medical_history, created_at, responded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(alert.id)
        .bind(alert.user_id)
        .bind(alert.hospital_id)
        .bind(alert.status.as_str())
        .bind(&alert.patient_info)
        .bind(&alert.medical_history)
        .bind(alert.created_at)
        .bind(alert.responded_at)
        .execute(self.pool.pool())
        .await?;
        Ok(())
    }

    async fn find_alert(&self, id: Uuid) -> Result<Option<EmergencyAlert>> {
        let row =
            sqlx::query_as::<_, DbEmergencyAlert>("SELECT * FROM emergency_alerts WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool.pool())
                .await?;
        row.map(EmergencyAlert::try_from).transpose()
    }

    async fn update_alert(&self, alert: &EmergencyAlert, expected: AlertStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE emergency_alerts SET status = $2, responded_at = $3 WHERE id = $1 AND status = $4",
        )
        .bind(alert.id)
        .bind(alert.status.as_str())
        .bind(alert.responded_at)
        .bind(expected.as_str())
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .cas_failure("emergency_alerts", "emergency_alert", alert.id, expected.as_str())
                .await);
        }
        Ok(())
    }

    async fn find_alerts_by_hospital_and_status(
        &self,
        hospital_id: Uuid,
        status: AlertStatus,
    ) -> Result<Vec<EmergencyAlert>> {
        let rows = sqlx::query_as::<_, DbEmergencyAlert>(
            "SELECT * FROM emergency_alerts WHERE hospital_id = $1 AND status = $2 ORDER BY created_at",
        )
        .bind(hospital_id)
        .bind(status.as_str())
        .fetch_all(self.pool.pool())
        .await?;
        convert_rows(rows)
    }

    async fn begin_queue_transaction(&self, hospital_id: Uuid) -> Result<Box<dyn QueueTransaction>> {
        let mut tx = self.pool.pool().begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar(LOCK_HOSPITAL)
                .bind(hospital_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(TriageError::not_found("hospital", hospital_id));
        }

        tracing::debug!("Acquired queue lock for hospital {}", hospital_id);
        Ok(Box::new(PgQueueTransaction { tx, hospital_id }))
    }
}

fn bind_receipt<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    receipt: &'q Receipt,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(receipt.id)
        .bind(receipt.processed_at)
        .bind(&receipt.condition)
        .bind(receipt.severity)
        .bind(receipt.hospital_id)
        .bind(receipt.doctor_id)
        .bind(receipt.status.as_str())
        .bind(receipt.queue_position)
        .bind(&receipt.ai_analysis)
}

/// PostgreSQL 队列事务，未提交即丢弃时由 sqlx 回滚
struct PgQueueTransaction {
    tx: Transaction<'static, Postgres>,
    hospital_id: Uuid,
}

#[async_trait]
impl QueueTransaction for PgQueueTransaction {
    async fn find_receipt(&mut self, id: Uuid) -> Result<Option<Receipt>> {
        let row = sqlx::query_as::<_, DbReceipt>("SELECT * FROM receipts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(Receipt::try_from).transpose()
    }

    async fn queued_receipts(&mut self) -> Result<Vec<Receipt>> {
        let rows = sqlx::query_as::<_, DbReceipt>(
            r#"
            SELECT * FROM receipts
            WHERE hospital_id = $1 AND status = 'QUEUED'
            ORDER BY queue_position NULLS LAST, uploaded_at
            FOR UPDATE
            "#,
        )
        .bind(self.hospital_id)
        .fetch_all(&mut *self.tx)
        .await?;
        convert_rows(rows)
    }

    async fn update_receipt(&mut self, receipt: &Receipt) -> Result<()> {
        let result = bind_receipt(sqlx::query(UPDATE_RECEIPT), receipt)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TriageError::not_found("receipt", receipt.id));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let PgQueueTransaction { tx, hospital_id } = *self;
        tx.commit().await?;
        tracing::debug!("Released queue lock for hospital {}", hospital_id);
        Ok(())
    }
}
