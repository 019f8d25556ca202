use axum::{
    Json,
    extract::{MatchedPath, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::auth::AuthenticatedUser;
use super::{ApiError, AppState, HealthDto};

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthDto>, ApiError> {
    state.store().ping().await?;

    Ok(Json(HealthDto {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}

/// What gets logged about a request before it is handled.
struct RequestLine {
    id: String,
    method: String,
    path: String,
    /// Route template such as `/Post/{id}`; keeps metric labels bounded.
    route: Option<String>,
    user_agent: String,
}

impl RequestLine {
    fn from_request(req: &Request) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            route: req
                .extensions()
                .get::<MatchedPath>()
                .map(|mp| mp.as_str().to_string()),
            user_agent: req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("unknown")
                .to_string(),
        }
    }

    fn metrics_path(&self) -> &str {
        self.route.as_deref().unwrap_or(&self.path)
    }
}

fn outcome_for(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "client_error"
    } else {
        "success"
    }
}

/// Caller id left on the response by the auth middleware, if the route was
/// protected and the token checked out.
fn caller_of(response: &Response) -> Option<i32> {
    response
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|AuthenticatedUser(id)| *id)
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let line = RequestLine::from_request(&req);

    let span = info_span!(
        "request",
        request_id = %line.id,
        method = %line.method,
        path = %line.path,
        route = line.route.clone(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status();
        let user_id = caller_of(&response);

        let labels = [
            ("method", line.method.clone()),
            ("path", line.metrics_path().to_string()),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        info!(
            event = "http_request_finished",
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            status_code = status.as_u16(),
            user_id,
            user_agent = %line.user_agent,
            outcome = outcome_for(status),
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_follow_status_class() {
        assert_eq!(outcome_for(StatusCode::OK), "success");
        assert_eq!(outcome_for(StatusCode::NO_CONTENT), "success");
        assert_eq!(outcome_for(StatusCode::CONFLICT), "client_error");
        assert_eq!(outcome_for(StatusCode::UNPROCESSABLE_ENTITY), "client_error");
        assert_eq!(outcome_for(StatusCode::INTERNAL_SERVER_ERROR), "error");
    }

    #[test]
    fn caller_is_read_from_response_extensions() {
        let mut response = StatusCode::OK.into_response();
        assert_eq!(caller_of(&response), None);

        response.extensions_mut().insert(AuthenticatedUser(7));
        assert_eq!(caller_of(&response), Some(7));
    }
}
