use crate::access::Grant;
use crate::api::api_error::APIError;
use crate::api::auth::AuthUser;
use crate::api::model::{ChallengeForm, GrantForm, UserForm};
use crate::api::server::AppState;
use crate::config::SharedConfig;
use crate::error::Error;
use crate::fqdn::{self, Fqdn};
use crate::notify::Notifier;
use crate::relation::request::{self, Intent, Status};
use crate::user_store::{DynUserStore, UserStore};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::sync::Arc;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the public API router.
pub fn router(config: SharedConfig, users: DynUserStore, notifier: Arc<Notifier>) -> Router {
    let state = AppState {
        config,
        users,
        notifier,
    };
    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/api/v1/present", post(present))
        .route("/api/v1/cleanup", post(cleanup))
        .route("/api/v1/users", post(put_user))
        .route("/api/v1/grants", post(allow_domains).delete(revoke_domains))
        .route("/api/v1/domains/:username", get(list_domains))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn present(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(form), _): WithRejection<Json<ChallengeForm>, APIError>,
) -> Result<StatusCode, APIError> {
    challenge(state, user, form, Intent::Present).await
}

async fn cleanup(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(form), _): WithRejection<Json<ChallengeForm>, APIError>,
) -> Result<StatusCode, APIError> {
    challenge(state, user, form, Intent::Cleanup).await
}

async fn challenge(
    state: AppState,
    user: AuthUser,
    form: ChallengeForm,
    intent: Intent,
) -> Result<StatusCode, APIError> {
    form.validate()?;
    let fqdn = fqdn::normalize(&form.fqdn);

    let grants = state.users.read().await.grants_for(&user.username).await;
    let request = request::submit(&state.config.namespace, &grants, &fqdn, &form.value, intent);
    if request.status == Some(Status::PermissionDenied) {
        tracing::debug!("rejected request from {} for \"{fqdn}\"", user.username);
        return Err(Error::AuthForbidden {
            user: user.username,
            fqdn,
        }
        .into());
    }

    match intent {
        Intent::Present => state.notifier.write(&fqdn, &form.value).await,
        Intent::Cleanup => state.notifier.remove(&fqdn).await,
    }?;
    tracing::info!(
        "accepted request {} from {} for \"{fqdn}\"",
        request.uuid,
        user.username
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn put_user(
    State(state): State<AppState>,
    caller: AuthUser,
    WithRejection(Json(form), _): WithRejection<Json<UserForm>, APIError>,
) -> Result<StatusCode, APIError> {
    require_admin(&caller)?;
    state
        .users
        .write()
        .await
        .put_user(&form.username, &form.password, form.admin)
        .await?;
    tracing::info!("stored user \"{}\"", form.username);
    Ok(StatusCode::NO_CONTENT)
}

async fn allow_domains(
    State(state): State<AppState>,
    caller: AuthUser,
    WithRejection(Json(form), _): WithRejection<Json<GrantForm>, APIError>,
) -> Result<StatusCode, APIError> {
    require_admin(&caller)?;
    let mut users = state.users.write().await;
    for domain in &form.domains {
        let domain: Fqdn = domain.parse()?;
        users
            .grant(
                &form.username,
                Grant {
                    domain,
                    access_level: form.access_level,
                },
            )
            .await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn revoke_domains(
    State(state): State<AppState>,
    caller: AuthUser,
    WithRejection(Json(form), _): WithRejection<Json<GrantForm>, APIError>,
) -> Result<StatusCode, APIError> {
    require_admin(&caller)?;
    let mut users = state.users.write().await;
    for domain in &form.domains {
        let domain: Fqdn = domain.parse()?;
        users
            .revoke(
                &form.username,
                &Grant {
                    domain,
                    access_level: form.access_level,
                },
            )
            .await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_domains(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(username): Path<String>,
) -> Result<Json<Vec<Grant>>, APIError> {
    require_admin(&caller)?;
    Ok(Json(state.users.read().await.grants_for(&username).await))
}

fn require_admin(user: &AuthUser) -> Result<(), APIError> {
    if user.admin {
        Ok(())
    } else {
        Err(Error::AdminRequired(user.username.clone()).into())
    }
}
