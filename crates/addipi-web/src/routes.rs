//! Web routes.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use addipi_scheduler::{JobStatus, JobStore};

use crate::WebError;

/// Shared state for the web server.
pub struct AppState {
    store: Arc<dyn JobStore>,
}

/// Create the web router.
pub fn create_router(store: Arc<dyn JobStore>) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/", get(index))
        .route("/printer/health", get(health))
        .route("/printer/metrics", get(metrics))
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    "Addipi Printer Service is running"
}

/// Process liveness only; never consults the store or the scheduler.
async fn health() -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// Queue-depth counters for dashboards.
async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, WebError> {
    let queued = state.store.count_by_status(JobStatus::Scheduled).await?;
    let printing = state.store.count_by_status(JobStatus::Printing).await?;
    let failed = state.store.count_by_status(JobStatus::Failed).await?;

    Ok(Json(json!({
        "queued": queued,
        "printing": printing,
        "failed": failed,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::DateTime;
    use tower::ServiceExt;

    use addipi_scheduler::{Job, StoreError};

    /// Store double: fixed counts, or hard failure.
    struct StubStore {
        counts: Option<(u64, u64, u64)>,
    }

    #[async_trait]
    impl JobStore for StubStore {
        async fn query_due_jobs(
            &self,
            _now: DateTime<Utc>,
        ) -> Result<Vec<Job>, StoreError> {
            Err(StoreError::Unavailable("stub".to_string()))
        }

        async fn mark_job(&self, _job: &Job, _status: JobStatus) -> Result<Job, StoreError> {
            Err(StoreError::Unavailable("stub".to_string()))
        }

        async fn count_by_status(&self, status: JobStatus) -> Result<u64, StoreError> {
            let (queued, printing, failed) = self
                .counts
                .ok_or_else(|| StoreError::Unavailable("stub".to_string()))?;
            Ok(match status {
                JobStatus::Scheduled => queued,
                JobStatus::Printing => printing,
                JobStatus::Failed => failed,
                JobStatus::Done => 0,
            })
        }
    }

    fn router(counts: Option<(u64, u64, u64)>) -> Router {
        create_router(Arc::new(StubStore { counts }))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_index_banner() {
        let response = router(None)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8(bytes.to_vec())
            .unwrap()
            .contains("Addipi Printer Service"));
    }

    #[tokio::test]
    async fn test_health_reports_ok_and_current_time() {
        // A dead store must not affect liveness.
        let before = Utc::now();
        let (status, body) = get_json(router(None), "/printer/health").await;
        let after = Utc::now();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);

        let time: DateTime<Utc> = body["time"].as_str().unwrap().parse().unwrap();
        assert!(time >= before - chrono::Duration::seconds(1));
        assert!(time <= after + chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_metrics_counts_by_status() {
        let (status, body) = get_json(router(Some((12, 2, 3))), "/printer/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["queued"], 12);
        assert_eq!(body["printing"], 2);
        assert_eq!(body["failed"], 3);
    }

    #[tokio::test]
    async fn test_metrics_maps_store_failure_to_503() {
        let (status, body) = get_json(router(None), "/printer/metrics").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ok"], false);
    }
}
