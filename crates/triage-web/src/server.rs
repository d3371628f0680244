//! Web服务器

use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use triage_workflow::TriageQueueManager;

use crate::handlers::{self, AppState};

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, manager: Arc<TriageQueueManager>) -> Self {
        Self {
            addr,
            app: create_router(manager),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start web server: {}", e))?;

        Ok(())
    }
}

/// 构建完整路由
pub fn create_router(manager: Arc<TriageQueueManager>) -> Router {
    Router::new()
        .route("/", get(handlers::api_root))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes())
        .with_state(manager)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// API v1 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        // 医院与医生
        .route("/hospitals", post(handlers::create_hospital))
        .route("/hospitals/:id/overview", get(handlers::hospital_overview))
        .route(
            "/hospitals/:id/doctors",
            get(handlers::list_doctors).post(handlers::create_doctor),
        )
        .route("/doctors/:id/availability", put(handlers::set_doctor_availability))
        // 分诊队列
        .route("/receipts", post(handlers::submit_receipt))
        .route("/receipts/:id", get(handlers::get_receipt))
        .route("/receipts/:id/advance", post(handlers::advance_receipt))
        .route(
            "/hospitals/:id/queue",
            get(handlers::queue_snapshot).post(handlers::enqueue),
        )
        .route("/hospitals/:id/queue/next", get(handlers::next_in_queue))
        // 预约
        .route("/appointments", post(handlers::request_appointment))
        .route("/appointments/:id/confirm", post(handlers::confirm_appointment))
        .route("/appointments/:id/cancel", post(handlers::cancel_appointment))
        .route("/appointments/:id/complete", post(handlers::complete_appointment))
        .route("/hospitals/:id/appointments", get(handlers::list_appointments))
        // 紧急警报
        .route("/alerts", post(handlers::raise_alert))
        .route("/alerts/:id/acknowledge", post(handlers::acknowledge_alert))
        .route("/alerts/:id/respond", post(handlers::respond_to_alert))
        .route("/alerts/:id/close", post(handlers::close_alert))
        .route("/hospitals/:id/alerts", get(handlers::list_alerts))
}
