//! 紧急警报处理
//!
//! 警报状态严格按 PENDING → ACKNOWLEDGED → RESPONDED → CLOSED 推进。
//! 通知投递不在此处处理。

use crate::queue::TriageQueueManager;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use triage_core::{AlertStatus, EmergencyAlert, Result, TriageError};
use uuid::Uuid;

/// 新紧急警报
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmergencyAlert {
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    #[serde(default)]
    pub patient_info: serde_json::Value,
    pub medical_history: Option<serde_json::Value>,
}

impl TriageQueueManager {
    /// 发起紧急警报
    pub async fn raise_alert(&self, request: NewEmergencyAlert) -> Result<EmergencyAlert> {
        self.require_hospital(request.hospital_id).await?;

        let alert = EmergencyAlert {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            hospital_id: request.hospital_id,
            status: AlertStatus::Pending,
            patient_info: request.patient_info,
            medical_history: request.medical_history,
            created_at: Utc::now(),
            responded_at: None,
        };
        self.store.insert_alert(&alert).await?;

        tracing::warn!(
            "Emergency alert {} raised by user {} at hospital {}",
            alert.id,
            alert.user_id,
            alert.hospital_id
        );
        Ok(alert)
    }

    pub async fn get_alert(&self, alert_id: Uuid) -> Result<EmergencyAlert> {
        self.store
            .find_alert(alert_id)
            .await?
            .ok_or_else(|| TriageError::not_found("emergency_alert", alert_id))
    }

    /// 确认警报
    pub async fn acknowledge_alert(&self, alert_id: Uuid) -> Result<EmergencyAlert> {
        self.advance_alert(alert_id, AlertStatus::Acknowledged).await
    }

    /// 响应警报，记录响应时间
    pub async fn respond_to_alert(&self, alert_id: Uuid) -> Result<EmergencyAlert> {
        self.advance_alert(alert_id, AlertStatus::Responded).await
    }

    /// 关闭警报
    pub async fn close_alert(&self, alert_id: Uuid) -> Result<EmergencyAlert> {
        self.advance_alert(alert_id, AlertStatus::Closed).await
    }

    /// 医院某状态下的警报，按创建时间排序
    pub async fn list_alerts(&self, hospital_id: Uuid, status: AlertStatus) -> Result<Vec<EmergencyAlert>> {
        self.require_hospital(hospital_id).await?;
        self.store
            .find_alerts_by_hospital_and_status(hospital_id, status)
            .await
    }

    async fn advance_alert(&self, alert_id: Uuid, target: AlertStatus) -> Result<EmergencyAlert> {
        let mut alert = self.get_alert(alert_id).await?;
        let from = alert.status;
        self.alert_machine.check(from, target)?;

        alert.status = target;
        if target == AlertStatus::Responded {
            alert.responded_at = Some(Utc::now());
        }
        self.store.update_alert(&alert, from).await?;

        tracing::info!("Emergency alert {} moved from {} to {}", alert_id, from, target);
        Ok(alert)
    }
}
