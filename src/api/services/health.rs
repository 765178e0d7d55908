use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use tracing::{debug, error, trace};

use crate::checker::{CheckerScheduler, SchedulerState, TickReport};
use crate::storage::SeaOrmStorage;
use crate::utils::TimeParser;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub uptime_human: String,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
    pub checker: HealthCheckerStatus,
}

#[derive(Debug, Serialize)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 检查器状态；未启用时只有 `enabled: false`
#[derive(Debug, Serialize)]
pub struct HealthCheckerStatus {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SchedulerState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_report: Option<TickReport>,
}

impl HealthCheckerStatus {
    fn from_scheduler(scheduler: Option<&CheckerScheduler>) -> Self {
        match scheduler {
            Some(scheduler) => Self {
                enabled: true,
                state: Some(scheduler.state()),
                last_report: scheduler.last_report(),
            },
            None => Self {
                enabled: false,
                state: None,
                last_report: None,
            },
        }
    }
}

/// Health Service
///
/// 存储不健康时返回 503；检查器状态只做展示，不影响整体健康结论
/// （检查器是可选的后台功能）。
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        storage: web::Data<Arc<SeaOrmStorage>>,
        app_start_time: web::Data<AppStartTime>,
        checker: Option<web::Data<Arc<CheckerScheduler>>>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let backend = storage.backend_name().to_string();
        let storage_status =
            match tokio::time::timeout(Duration::from_secs(5), storage.get_db().ping()).await {
                Ok(Ok(())) => HealthStorageCheck {
                    status: "healthy".to_string(),
                    backend,
                    error: None,
                },
                Ok(Err(e)) => {
                    error!("Storage health check failed: {}", e);
                    HealthStorageCheck {
                        status: "unhealthy".to_string(),
                        backend,
                        error: Some(format!("database error: {}", e)),
                    }
                }
                Err(_) => {
                    error!("Storage health check timeout");
                    HealthStorageCheck {
                        status: "unhealthy".to_string(),
                        backend,
                        error: Some("timeout".to_string()),
                    }
                }
            };

        let checker_status =
            HealthCheckerStatus::from_scheduler(checker.as_ref().map(|c| c.get_ref().as_ref()));

        let now = chrono::Utc::now();
        let uptime_human = TimeParser::format_duration_human(app_start_time.start_datetime, now);
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let is_healthy = storage_status.status == "healthy";

        let health_data = HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            timestamp: now.to_rfc3339(),
            uptime: uptime_seconds,
            uptime_human,
            checks: HealthChecks {
                storage: storage_status,
                checker: checker_status,
            },
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        debug!(
            "Health check completed in {:?}, status: {}",
            start_time.elapsed(),
            health_data.status
        );

        let response_status = if is_healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        HttpResponse::build(response_status).json(health_data)
    }

    // 简单的就绪检查，只返回 200 状态码
    pub async fn readiness_check() -> impl Responder {
        trace!("Received readiness check request");

        HttpResponse::Ok()
            .append_header(("Content-Type", "text/plain"))
            .body("OK")
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置，挂载在 `/health` 下
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
