//! 核心数据模型定义

use crate::error::TriageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 医院
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 医生
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub name: String,
    pub specialization: Option<String>,
    pub available: bool, // 只有可用的医生才能被分配
    pub created_at: DateTime<Utc>,
}

/// 分诊单状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    Pending,   // 已上传，待分诊
    Processed, // 已处理
    Queued,    // 排队中
    Completed, // 已完成
}

/// 患者提交的病情单据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub condition: Option<String>,
    pub severity: Option<i32>,
    pub hospital_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: ReceiptStatus,
    pub queue_position: Option<i32>, // 仅在 QUEUED 状态下有意义
    pub ai_analysis: Option<String>, // 外部服务生成，原样保存
}

impl Receipt {
    pub fn is_queued(&self) -> bool {
        self.status == ReceiptStatus::Queued
    }
}

/// 预约状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,   // 已申请
    Confirmed, // 已确认
    Completed, // 已完成
    Cancelled, // 已取消
}

/// 就诊预约
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub status: AppointmentStatus,
    pub preferred_date: DateTime<Utc>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 紧急警报状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Pending,      // 待处理
    Acknowledged, // 已确认
    Responded,    // 已响应
    Closed,       // 已关闭
}

/// 紧急警报
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmergencyAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    pub status: AlertStatus,
    /// 结构不受约束的患者信息
    pub patient_info: serde_json::Value,
    pub medical_history: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// 为状态枚举生成字符串编解码
macro_rules! status_codec {
    ($ty:ident, $label:literal, { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $ty {
            /// 数据库和接口中使用的编码
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $code,)+
                }
            }

            pub fn all() -> Vec<$ty> {
                vec![$($ty::$variant,)+]
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = TriageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($ty::$variant),)+
                    other => Err(TriageError::Validation(format!(
                        "unknown {} status: {}", $label, other
                    ))),
                }
            }
        }
    };
}

status_codec!(ReceiptStatus, "receipt", {
    Pending => "PENDING",
    Processed => "PROCESSED",
    Queued => "QUEUED",
    Completed => "COMPLETED",
});

status_codec!(AppointmentStatus, "appointment", {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
});

status_codec!(AlertStatus, "alert", {
    Pending => "PENDING",
    Acknowledged => "ACKNOWLEDGED",
    Responded => "RESPONDED",
    Closed => "CLOSED",
});
