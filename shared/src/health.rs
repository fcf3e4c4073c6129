use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Router};
use tracing::{info, instrument};

use crate::{HealthResponse, ServiceIdentity};

/// `GET /health`, reporting the service name and environment.
pub fn router(identity: ServiceIdentity) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(Arc::new(identity))
}

#[instrument(name = "health_endpoint", skip_all)]
async fn health_check(State(identity): State<Arc<ServiceIdentity>>) -> Json<HealthResponse> {
    info!(environment = %identity.environment, "Health check , {}", identity.environment);
    info!("Health check completed successfully");
    Json(HealthResponse::ok(&identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn reports_identity() {
        let app = router(ServiceIdentity {
            service_name: "order-service".to_string(),
            environment: "test".to_string(),
        });

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "status": "ok",
                "environment": "test",
                "service_name": "order-service",
            })
        );
    }
}
