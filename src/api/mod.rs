//! HTTP API for requesting DNS-01 challenge record changes.
//!
//! All endpoints except `/healthcheck` require HTTP Basic authentication
//! against the [user store][crate::user_store]. Requests without valid
//! credentials receive HTTP 401.
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the
//!   service is operational.
//!
//! ## `/api/v1/present` (POST)
//!
//!   Expects a JSON request body of the form:
//!
//!   ```json
//!   { "fqdn": "_acme-challenge.www.example.com", "value": "tok123" }
//!   ```
//!
//!   Where `fqdn` is the challenge record name and `value` the ACME DNS-01
//!   authorization value to serve for it. The authenticated user must hold
//!   a grant covering the FQDN (with the challenge prefix stripped): an
//!   `exact` grant on the name itself, or a `subtree` grant on one of its
//!   ancestors. Returns HTTP 204 (No Content) after the DNS authority has
//!   been notified; HTTP 403 (Forbidden) when no grant matches.
//!
//! ## `/api/v1/cleanup` (POST)
//!
//!   Same request body and permission checks as `/api/v1/present`. Returns
//!   HTTP 204 after requesting removal of the challenge record.
//!
//! ## `/api/v1/users` (POST, admin)
//!
//!   `{ "username": "alice", "password": "...", "admin": false }`
//!   creates a user or updates an existing user's password and admin flag.
//!
//! ## `/api/v1/grants` (POST/DELETE, admin)
//!
//!   `{ "username": "alice", "domains": ["example.com"], "access_level":
//!   "subtree" }` grants (POST) or revokes (DELETE) domain permissions.
//!   Unknown users and unheld grants return HTTP 404.
//!
//! ## `/api/v1/domains/:username` (GET, admin)
//!
//!   Lists the grants held by a user.

pub(crate) mod api_error;
mod auth;
mod model;
mod routes;
pub mod server;

pub use routes::router;
pub use server::new;
