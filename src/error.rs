//! Error types.

use crate::notify::NotifyError;
use crate::record::RecordError;
use axum::extract::rejection::JsonRejection;
use std::net::IpAddr;
use uuid::Uuid;

/// Error enumerates the possible acmegate error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a request carries no usable `Authorization: Basic`
    /// credentials, or credentials the [user store][crate::user_store]
    /// rejects. Surfaced to HTTP callers as a 401.
    #[error("authentication required")]
    AuthRequired,

    /// Returned when an authenticated user holds no grant covering the
    /// FQDN they are trying to mutate. Missing users and missing grants
    /// are deliberately indistinguishable from unauthorized ones.
    #[error("the user {user} does not have permission to manage \"{fqdn}\"")]
    AuthForbidden { user: String, fqdn: String },

    /// Returned when a non-admin user calls an administrative endpoint.
    #[error("the user {0} does not have administrative access")]
    AdminRequired(String),

    /// Returned when a name does not satisfy the FQDN grammar used by the
    /// [user store][crate::user_store], or can't be split into a host
    /// label and domain.
    #[error("not a valid FQDN: \"{0}\"")]
    InvalidFqdn(String),

    /// Returned when record fields fail [validation][crate::record].
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Returned when a record request has neither a record nor a status. A
    /// response-only entry cannot be statusless.
    #[error("record request {0} has neither a record nor a status")]
    StatuslessRequest(Uuid),

    /// Returned by administrative grant operations naming a user that does
    /// not exist.
    #[error("unknown user \"{0}\"")]
    UnknownUser(String),

    /// Returned when revoking a grant the user does not hold.
    #[error("user \"{user}\" holds no grant for \"{domain}\"")]
    UnknownGrant { user: String, domain: String },

    /// Returned when signaling the DNS authority fails; see
    /// [`NotifyError`] for the distinguishable kinds.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Returned when clients `POST` invalid JSON.
    #[error(transparent)]
    JsonExtractorRejection(#[from] JsonRejection),

    /// Returned when a listener bind address is not a loopback address, or
    /// an address within a private network space. Both the API and the
    /// relay listener are meant to sit behind network-level authentication
    /// (the relay accepts node-local notices only).
    #[error("bind address ({0}) must be a loopback or private IP")]
    InsecureBind(IpAddr),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when JSON processing fails: loading a config or state
    /// file, or a malformed `dns_entries` batch on the relation channel.
    /// A batch-level failure aborts the whole operation; single bad
    /// entries are dropped during decode instead.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}
