//! Fully-qualified domain name handling.
//!
//! Domains managed by the [user store][crate::user_store] must satisfy a
//! strict FQDN grammar: dot-separated labels of 1-63 characters drawn from
//! `[a-z0-9-]` with no leading or trailing hyphen, a purely alphabetic
//! 2-63 character TLD, and an overall length of 4-253 characters. A single
//! trailing dot is accepted and normalized away, and names are lowercased
//! before storage or comparison.
//!
//! Challenge names submitted by ACME clients (e.g.
//! `_acme-challenge.example.com`) are *not* valid FQDNs under this grammar
//! because of the underscore label. They are normalized with [`normalize`]
//! and matched against store domains only after [`strip_challenge_prefix`].

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved label prefix for ACME DNS-01 challenge records.
pub const CHALLENGE_PREFIX: &str = "_acme-challenge.";

const MIN_LEN: usize = 4;
const MAX_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const MIN_TLD_LEN: usize = 2;

/// A validated, normalized (lowercase, no trailing dot) domain name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fqdn(String);

impl Fqdn {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Fqdn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize(s);
        if name.len() < MIN_LEN || name.len() > MAX_LEN {
            return Err(Error::InvalidFqdn(s.to_string()));
        }
        let labels: Vec<&str> = name.split('.').collect();
        if labels.len() < 2 {
            return Err(Error::InvalidFqdn(s.to_string()));
        }
        for label in &labels {
            if !valid_label(label) {
                return Err(Error::InvalidFqdn(s.to_string()));
            }
        }
        // The TLD is alphabetic only and at least two characters.
        let tld = labels[labels.len() - 1];
        if tld.len() < MIN_TLD_LEN || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidFqdn(s.to_string()));
        }
        Ok(Fqdn(name))
    }
}

impl TryFrom<String> for Fqdn {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Fqdn> for String {
    fn from(fqdn: Fqdn) -> Self {
        fqdn.0
    }
}

impl fmt::Display for Fqdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fqdn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Lowercase a name and strip surrounding whitespace and one trailing dot.
pub fn normalize(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_suffix('.').unwrap_or(name);
    name.to_ascii_lowercase()
}

/// Strip the ACME challenge prefix, if present, to obtain the bare name.
pub fn strip_challenge_prefix(fqdn: &str) -> &str {
    fqdn.strip_prefix(CHALLENGE_PREFIX).unwrap_or(fqdn)
}

/// Split a name into its first label and the remainder.
///
/// Returns `None` when the name has no dot or either side is empty, e.g.
/// for a bare TLD or a leading/trailing dot.
pub fn split_first_label(fqdn: &str) -> Option<(&str, &str)> {
    match fqdn.split_once('.') {
        Some((label, rest)) if !label.is_empty() && !rest.is_empty() => Some((label, rest)),
        _ => None,
    }
}
