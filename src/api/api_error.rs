use crate::error::Error;
use crate::notify::NotifyError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub(crate) struct APIError(anyhow::Error);

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let any_err = self.0;
        let status = match any_err.downcast_ref::<Error>() {
            Some(Error::AuthRequired) => StatusCode::UNAUTHORIZED,
            Some(Error::AuthForbidden { .. } | Error::AdminRequired(_)) => StatusCode::FORBIDDEN,
            Some(Error::InvalidFqdn(_) | Error::Record(_) | Error::StatuslessRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            Some(Error::UnknownUser(_) | Error::UnknownGrant { .. }) => StatusCode::NOT_FOUND,
            Some(Error::Notify(err)) => notify_status(err),
            Some(Error::JsonExtractorRejection(err)) => json_rejection_status(err),
            _ => match any_err.downcast_ref::<NotifyError>() {
                Some(err) => notify_status(err),
                None => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        let body = Json(json!({
            "error": format!("{any_err}"),
        }));
        (status, body).into_response()
    }
}

// Each delivery failure maps to its own status so callers can pick a retry
// policy: a timeout is retryable, a missing notify program is not.
fn notify_status(err: &NotifyError) -> StatusCode {
    match err {
        NotifyError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
        NotifyError::Unsuccessful { .. } => StatusCode::BAD_GATEWAY,
        NotifyError::ProgramNotFound(_) | NotifyError::IO(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_rejection_status(err: &JsonRejection) -> StatusCode {
    match err {
        JsonRejection::JsonDataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        JsonRejection::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
