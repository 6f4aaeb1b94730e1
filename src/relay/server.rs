use crate::api::api_error::APIError;
use crate::config::SharedConfig;
use crate::relay::{Bridge, Notice};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use std::future::Future;
use std::sync::Arc;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub fn new(config: SharedConfig, bridge: Arc<Bridge>) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&config.relay_bind_addr)
        .serve(routes(&config, bridge).into_make_service())
}

fn routes(config: &SharedConfig, bridge: Arc<Bridge>) -> Router {
    Router::new()
        .route("/notice", post(notice))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.relay_timeout))
        .with_state(bridge)
}

async fn notice(
    State(bridge): State<Arc<Bridge>>,
    WithRejection(Json(notice), _): WithRejection<Json<Notice>, APIError>,
) -> Result<StatusCode, APIError> {
    bridge.handle(&notice).await?;
    Ok(StatusCode::NO_CONTENT)
}
