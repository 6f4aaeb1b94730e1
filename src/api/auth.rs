//! HTTP Basic authentication against the user store.

use crate::api::api_error::APIError;
use crate::api::server::AppState;
use crate::error::Error;
use crate::user_store::UserStore;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose;
use base64::{alphabet, engine, Engine};
use lazy_static::lazy_static;

lazy_static! {
    static ref BASE64_ENGINE: engine::GeneralPurpose =
        engine::GeneralPurpose::new(&alphabet::STANDARD, general_purpose::PAD);
}

/// The authenticated caller. Extraction fails with HTTP 401 when the
/// `Authorization: Basic` header is missing, malformed, or carries
/// credentials the user store rejects.
#[derive(Debug, Clone)]
pub(super) struct AuthUser {
    pub username: String,
    pub admin: bool,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = APIError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, APIError> {
        let (username, password) = parse_basic_credentials(parts).ok_or(Error::AuthRequired)?;
        let users = state.users.read().await;
        if !users.verify_credentials(&username, &password).await {
            tracing::debug!("rejected credentials for \"{username}\"");
            return Err(Error::AuthRequired.into());
        }
        let admin = users.is_admin(&username).await;
        Ok(AuthUser { username, admin })
    }
}

fn parse_basic_credentials(parts: &Parts) -> Option<(String, String)> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, payload) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64_ENGINE.decode(payload.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
