//! ACME Gate
//!
//! An HTTP front door for [RFC-8555][RFC-8555] [DNS-01] challenge records.
//! Authenticated users request creation and removal of TXT challenge
//! records for the domains they are permitted to manage; accepted requests
//! are signaled to a primary DNS service, whose notices this service folds
//! into a shared key-value relation channel as deduplicated, idempotent
//! [record requests][relation::request].
//!
//! Permissions are hierarchical: an `exact` grant covers one FQDN, a
//! `subtree` grant covers every name below an FQDN but not the FQDN
//! itself. See the [access] module for the evaluation rules and [api] for
//! the HTTP endpoints.
//!
//! [RFC-8555]: https://www.rfc-editor.org/rfc/rfc8555
//! [DNS-01]: https://www.rfc-editor.org/rfc/rfc8555#section-8.4
//!
#![warn(clippy::pedantic)]

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod fqdn;
pub mod notify;
pub mod record;
pub mod relation;
pub mod relay;
pub mod user_store;

pub use api::new as new_api;
pub use config::{Config, SharedConfig};
pub use relay::new as new_relay;
