//! HTTP处理器

use crate::error::ApiResult;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use triage_core::{AlertStatus, AppointmentStatus, ReceiptStatus, TriageError};
use triage_workflow::{
    NewAppointment, NewDoctor, NewEmergencyAlert, NewHospital, NewReceipt, TriageQueueManager,
};
use uuid::Uuid;

pub type AppState = Arc<TriageQueueManager>;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "Triage Queue API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "api": "/api/v1"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 列表查询参数
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    /// 解析状态参数，缺省为 PENDING
    fn parse_or<S>(&self, default: S) -> Result<S, TriageError>
    where
        S: FromStr<Err = TriageError>,
    {
        match self.status.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(default),
        }
    }
}

// ---- 医院与医生 ----

pub async fn create_hospital(
    State(manager): State<AppState>,
    Json(request): Json<NewHospital>,
) -> ApiResult<impl IntoResponse> {
    let hospital = manager.register_hospital(request).await?;
    Ok((StatusCode::CREATED, Json(hospital)))
}

pub async fn hospital_overview(
    State(manager): State<AppState>,
    Path(hospital_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.hospital_overview(hospital_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct DoctorRequest {
    pub name: String,
    pub specialization: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

pub async fn create_doctor(
    State(manager): State<AppState>,
    Path(hospital_id): Path<Uuid>,
    Json(request): Json<DoctorRequest>,
) -> ApiResult<impl IntoResponse> {
    let doctor = manager
        .register_doctor(NewDoctor {
            hospital_id,
            name: request.name,
            specialization: request.specialization,
            available: request.available,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

pub async fn list_doctors(
    State(manager): State<AppState>,
    Path(hospital_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.list_doctors(hospital_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

pub async fn set_doctor_availability(
    State(manager): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<AvailabilityRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        manager
            .set_doctor_availability(doctor_id, request.available)
            .await?,
    ))
}

// ---- 分诊单与队列 ----

pub async fn submit_receipt(
    State(manager): State<AppState>,
    Json(request): Json<NewReceipt>,
) -> ApiResult<impl IntoResponse> {
    let receipt = manager.submit_receipt(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_receipt(
    State(manager): State<AppState>,
    Path(receipt_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.get_receipt(receipt_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub status: String,
    pub doctor_id: Option<Uuid>,
}

pub async fn advance_receipt(
    State(manager): State<AppState>,
    Path(receipt_id): Path<Uuid>,
    Json(request): Json<AdvanceRequest>,
) -> ApiResult<impl IntoResponse> {
    let status: ReceiptStatus = request.status.parse()?;
    Ok(Json(
        manager
            .advance(receipt_id, status, request.doctor_id)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub receipt_id: Uuid,
}

pub async fn enqueue(
    State(manager): State<AppState>,
    Path(hospital_id): Path<Uuid>,
    Json(request): Json<EnqueueRequest>,
) -> ApiResult<impl IntoResponse> {
    let position = manager.enqueue(request.receipt_id, hospital_id).await?;
    Ok(Json(json!({
        "receipt_id": request.receipt_id,
        "hospital_id": hospital_id,
        "queue_position": position,
    })))
}

pub async fn queue_snapshot(
    State(manager): State<AppState>,
    Path(hospital_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.queue_snapshot(hospital_id).await?))
}

/// 队首分诊单；队列为空时返回 204
pub async fn next_in_queue(
    State(manager): State<AppState>,
    Path(hospital_id): Path<Uuid>,
) -> ApiResult<axum::response::Response> {
    let response = match manager.dequeue_next(hospital_id).await? {
        Some(receipt) => Json(receipt).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

// ---- 预约 ----

pub async fn request_appointment(
    State(manager): State<AppState>,
    Json(request): Json<NewAppointment>,
) -> ApiResult<impl IntoResponse> {
    let appointment = manager.request_appointment(request).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmRequest {
    pub scheduled_date: Option<DateTime<Utc>>,
    pub doctor_id: Option<Uuid>,
}

pub async fn confirm_appointment(
    State(manager): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    // 只有空请求体才按默认处理，格式错误的请求体必须拒绝
    let request: ConfirmRequest = if body.is_empty() {
        ConfirmRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            TriageError::Validation(format!("invalid confirm request body: {}", e))
        })?
    };
    Ok(Json(
        manager
            .confirm_appointment(appointment_id, request.scheduled_date, request.doctor_id)
            .await?,
    ))
}

pub async fn cancel_appointment(
    State(manager): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.cancel_appointment(appointment_id).await?))
}

pub async fn complete_appointment(
    State(manager): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.complete_appointment(appointment_id).await?))
}

pub async fn list_appointments(
    State(manager): State<AppState>,
    Path(hospital_id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = query.parse_or(AppointmentStatus::Pending)?;
    Ok(Json(manager.list_appointments(hospital_id, status).await?))
}

// ---- 紧急警报 ----

pub async fn raise_alert(
    State(manager): State<AppState>,
    Json(request): Json<NewEmergencyAlert>,
) -> ApiResult<impl IntoResponse> {
    let alert = manager.raise_alert(request).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn acknowledge_alert(
    State(manager): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.acknowledge_alert(alert_id).await?))
}

pub async fn respond_to_alert(
    State(manager): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.respond_to_alert(alert_id).await?))
}

pub async fn close_alert(
    State(manager): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(manager.close_alert(alert_id).await?))
}

pub async fn list_alerts(
    State(manager): State<AppState>,
    Path(hospital_id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = query.parse_or(AlertStatus::Pending)?;
    Ok(Json(manager.list_alerts(hospital_id, status).await?))
}
