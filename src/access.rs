//! Access control for DNS record mutation.
//!
//! Users hold [`Grant`]s over domains at one of two levels: an
//! [`AccessLevel::Exact`] grant authorizes the granted FQDN and nothing
//! else, while an [`AccessLevel::Subtree`] grant authorizes every strict
//! sub-label of the granted FQDN but not the FQDN itself. Any matching
//! grant authorizes a request; grants only ever add permission, so
//! evaluation order is immaterial.

use crate::fqdn::{self, Fqdn};
use serde::{Deserialize, Serialize};

/// Scope of a [`Grant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Authority over exactly the granted FQDN.
    Exact,
    /// Authority over every strict sub-label of the granted FQDN
    /// (`*.domain`, not `domain` itself).
    Subtree,
}

/// Permission for one user over one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub domain: Fqdn,
    pub access_level: AccessLevel,
}

/// Decide whether the holder of `grants` may mutate a record at `fqdn`.
///
/// `fqdn` is expected in normalized form (lowercase, no trailing dot). The
/// `_acme-challenge.` prefix is stripped before comparison so a grant on
/// `example.com` covers its challenge record. Missing users are
/// indistinguishable from unauthorized ones: an empty grant set denies.
pub fn authorize(grants: &[Grant], fqdn: &str) -> bool {
    let bare = fqdn::strip_challenge_prefix(fqdn);
    grants.iter().any(|grant| match grant.access_level {
        AccessLevel::Exact => bare == grant.domain.as_str(),
        AccessLevel::Subtree => bare
            .strip_suffix(grant.domain.as_str())
            .map_or(false, |head| head.ends_with('.') && head.len() > 1),
    })
}
