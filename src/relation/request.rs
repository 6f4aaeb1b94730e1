//! Record requests and the reconciliation request set.
//!
//! A [`RecordRequest`] is the correlation envelope exchanged with the DNS
//! authority: an optional [`Record`] plus a processing [`Status`], keyed by
//! a UUID. Identity is derived deterministically (UUIDv5) from the record's
//! canonical field tuple, or from `(fqdn, value)` for challenge-style
//! requests, under a per-deployment namespace, so a retried submission
//! merges into the existing entry instead of duplicating it.

use crate::access::{authorize, Grant};
use crate::error::Error;
use crate::fqdn;
use crate::record::{Record, RecordClass, RecordType, CHALLENGE_TTL};
use indexmap::IndexMap;
use std::fmt;
use uuid::Uuid;

/// Processing status of a record request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Approved,
    PermissionDenied,
    Conflict,
    InvalidData,
    Failure,
    Unknown,
    Pending,
}

impl Status {
    /// Parse a status string, mapping anything unrecognized to
    /// [`Status::Unknown`].
    ///
    /// The authority side may run an older or newer protocol revision, so
    /// this never fails, unlike [`RecordType`] parsing, which rejects
    /// unknown values outright.
    pub fn parse(s: &str) -> Status {
        match s {
            "approved" => Status::Approved,
            "permission_denied" => Status::PermissionDenied,
            "conflict" => Status::Conflict,
            "invalid_data" => Status::InvalidData,
            "failure" => Status::Failure,
            "pending" => Status::Pending,
            _ => Status::Unknown,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Approved => "approved",
            Status::PermissionDenied => "permission_denied",
            Status::Conflict => "conflict",
            Status::InvalidData => "invalid_data",
            Status::Failure => "failure",
            Status::Unknown => "unknown",
            Status::Pending => "pending",
        })
    }
}

/// What the caller wants done with a challenge record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Present,
    Cleanup,
}

/// Derive the identity of a full record request from its canonical tuple.
pub fn record_uuid(namespace: &Uuid, record: &Record) -> Uuid {
    let canonical = format!(
        "{} {} {} {} {} {}",
        record.host_label,
        record.domain,
        record.ttl,
        record.record_class,
        record.record_type,
        record.record_data
    );
    Uuid::new_v5(namespace, canonical.as_bytes())
}

/// Derive the identity of a challenge-style request from `(fqdn, value)`.
pub fn challenge_uuid(namespace: &Uuid, fqdn: &str, value: &str) -> Uuid {
    Uuid::new_v5(namespace, format!("{fqdn} {value}").as_bytes())
}

/// Correlation envelope for one requested DNS record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRequest {
    pub uuid: Uuid,
    pub status: Option<Status>,
    pub description: Option<String>,
    pub record: Option<Record>,
}

impl RecordRequest {
    /// Build a request, enforcing that a response-only entry (no record)
    /// carries a status.
    pub fn new(
        uuid: Uuid,
        record: Option<Record>,
        status: Option<Status>,
        description: Option<String>,
    ) -> Result<Self, Error> {
        if record.is_none() && status.is_none() {
            return Err(Error::StatuslessRequest(uuid));
        }
        Ok(RecordRequest {
            uuid,
            status,
            description,
            record,
        })
    }

    /// Build a pending TXT challenge request for `fqdn` with the fixed
    /// challenge TTL, deriving host label and domain from the first dot.
    pub fn challenge(namespace: &Uuid, fqdn: &str, value: &str) -> Result<Self, Error> {
        let (host_label, domain) = fqdn::split_first_label(fqdn)
            .ok_or_else(|| Error::InvalidFqdn(fqdn.to_string()))?;
        let record = Record::new(
            domain,
            host_label,
            CHALLENGE_TTL,
            RecordClass::In,
            RecordType::Txt,
            value,
        )?;
        Ok(RecordRequest {
            uuid: challenge_uuid(namespace, fqdn, value),
            status: Some(Status::Pending),
            description: None,
            record: Some(record),
        })
    }

    /// The FQDN addressed by this request's record, if it has one.
    pub fn fqdn(&self) -> Option<String> {
        self.record.as_ref().map(Record::fqdn)
    }
}

/// Turn a present/cleanup intent into a record request.
///
/// Runs the access control evaluator first; a denial is encoded as data
/// (`permission_denied`, no record) rather than an error, and must never be
/// written to the relation channel. A cleanup produces a record-less
/// tombstone carrying the same deterministic identity the matching present
/// produced, so the caller can correlate the removal.
pub fn submit(
    namespace: &Uuid,
    grants: &[Grant],
    fqdn: &str,
    value: &str,
    intent: Intent,
) -> RecordRequest {
    let uuid = challenge_uuid(namespace, fqdn, value);
    if !authorize(grants, fqdn) {
        return RecordRequest {
            uuid,
            status: Some(Status::PermissionDenied),
            description: Some(format!("not permitted to manage {fqdn}")),
            record: None,
        };
    }
    match intent {
        Intent::Present => match RecordRequest::challenge(namespace, fqdn, value) {
            Ok(request) => request,
            Err(err) => RecordRequest {
                uuid,
                status: Some(Status::InvalidData),
                description: Some(err.to_string()),
                record: None,
            },
        },
        Intent::Cleanup => RecordRequest {
            uuid,
            status: Some(Status::Pending),
            description: Some(format!("remove {fqdn}")),
            record: None,
        },
    }
}

/// Ordered set of record requests keyed by UUID.
///
/// Incoming entries with a known UUID are merged field-by-field (non-null
/// overlays null), supporting the two channel sides independently owning
/// different fields of the same logical entry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RequestSet {
    entries: IndexMap<Uuid, RecordRequest>,
}

impl RequestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, uuid: &Uuid) -> Option<&RecordRequest> {
        self.entries.get(uuid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordRequest> {
        self.entries.values()
    }

    /// Merge incoming entries: insert new UUIDs, overlay existing ones.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = RecordRequest>) {
        for request in incoming {
            match self.entries.get_mut(&request.uuid) {
                Some(existing) => overlay(existing, request),
                None => {
                    self.entries.insert(request.uuid, request);
                }
            }
        }
    }

    /// Remove every entry whose record addresses `fqdn`.
    ///
    /// Record-less (response-only) entries are kept: they carry no FQDN to
    /// match against. Returns the number of removed entries.
    pub fn remove_fqdn(&mut self, fqdn: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, request| request.fqdn().as_deref() != Some(fqdn));
        before - self.entries.len()
    }
}

impl FromIterator<RecordRequest> for RequestSet {
    fn from_iter<I: IntoIterator<Item = RecordRequest>>(iter: I) -> Self {
        let mut set = RequestSet::new();
        set.merge(iter);
        set
    }
}

// The mergeable fields, spelled out: record is typically owned by the
// requester side, status and description by the authority side.
fn overlay(existing: &mut RecordRequest, incoming: RecordRequest) {
    if incoming.record.is_some() {
        existing.record = incoming.record;
    }
    if incoming.status.is_some() {
        existing.status = incoming.status;
    }
    if incoming.description.is_some() {
        existing.description = incoming.description;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessLevel;

    const NS: Uuid = Uuid::from_u128(0x6ba7_b810_9dad_11d1_80b4_00c0_4fd4_30c8);

    fn grants(domain: &str, access_level: AccessLevel) -> Vec<Grant> {
        vec![Grant {
            domain: domain.parse().unwrap(),
            access_level,
        }]
    }

    #[test]
    fn identical_submissions_share_an_identity() {
        let a = challenge_uuid(&NS, "_acme-challenge.example.com", "tok123");
        let b = challenge_uuid(&NS, "_acme-challenge.example.com", "tok123");
        assert_eq!(a, b);
        assert_ne!(a, challenge_uuid(&NS, "_acme-challenge.example.com", "tok124"));

        let other_ns = Uuid::from_u128(42);
        assert_ne!(a, challenge_uuid(&other_ns, "_acme-challenge.example.com", "tok123"));
    }

    #[test]
    fn record_uuid_is_stable_over_the_canonical_tuple() {
        let record = Record::new(
            "example.com",
            "_acme-challenge",
            600,
            RecordClass::In,
            RecordType::Txt,
            "tok123",
        )
        .unwrap();
        assert_eq!(record_uuid(&NS, &record), record_uuid(&NS, &record.clone()));
    }

    #[test]
    fn response_entries_require_a_status() {
        let uuid = Uuid::from_u128(1);
        assert!(matches!(
            RecordRequest::new(uuid, None, None, None),
            Err(Error::StatuslessRequest(_))
        ));
        assert!(RecordRequest::new(uuid, None, Some(Status::Approved), None).is_ok());
    }

    #[test]
    fn submit_encodes_denial_as_data() {
        let request = submit(
            &NS,
            &grants("example.com", AccessLevel::Exact),
            "other.com",
            "tok",
            Intent::Present,
        );
        assert_eq!(request.status, Some(Status::PermissionDenied));
        assert!(request.record.is_none());
    }

    #[test]
    fn submit_present_builds_a_pending_challenge() {
        let request = submit(
            &NS,
            &grants("example.com", AccessLevel::Exact),
            "_acme-challenge.example.com",
            "tok123",
            Intent::Present,
        );
        assert_eq!(request.status, Some(Status::Pending));
        let record = request.record.unwrap();
        assert_eq!(record.host_label, "_acme-challenge");
        assert_eq!(record.domain, "example.com");
        assert_eq!(record.ttl, CHALLENGE_TTL);
        assert_eq!(record.record_type, RecordType::Txt);
        assert_eq!(
            request.uuid,
            challenge_uuid(&NS, "_acme-challenge.example.com", "tok123")
        );
    }

    #[test]
    fn submit_cleanup_builds_a_recordless_tombstone() {
        let request = submit(
            &NS,
            &grants("example.com", AccessLevel::Exact),
            "_acme-challenge.example.com",
            "tok123",
            Intent::Cleanup,
        );
        assert_eq!(request.status, Some(Status::Pending));
        assert!(request.record.is_none());
        assert_eq!(
            request.uuid,
            challenge_uuid(&NS, "_acme-challenge.example.com", "tok123")
        );
    }

    #[test]
    fn submit_invalid_record_data_is_encoded_as_data() {
        // Authorized, but an empty challenge value cannot form a record.
        let request = submit(
            &NS,
            &grants("example.com", AccessLevel::Subtree),
            "x.example.com",
            "",
            Intent::Present,
        );
        assert_eq!(request.status, Some(Status::InvalidData));
        assert!(request.record.is_none());
    }

    #[test]
    fn merge_overlays_non_null_fields() {
        let mut set = RequestSet::new();
        let request = RecordRequest::challenge(&NS, "_acme-challenge.example.com", "tok").unwrap();
        let uuid = request.uuid;
        set.merge([request]);
        assert_eq!(set.len(), 1);

        // Authority answers with a status-only entry sharing the UUID.
        set.merge([RecordRequest {
            uuid,
            status: Some(Status::Approved),
            description: Some("done".to_string()),
            record: None,
        }]);
        assert_eq!(set.len(), 1);
        let merged = set.get(&uuid).unwrap();
        assert_eq!(merged.status, Some(Status::Approved));
        assert_eq!(merged.description.as_deref(), Some("done"));
        assert!(merged.record.is_some(), "record survives a status overlay");
    }

    #[test]
    fn duplicate_submissions_collapse() {
        let mut set = RequestSet::new();
        set.merge([
            RecordRequest::challenge(&NS, "_acme-challenge.example.com", "tok").unwrap(),
            RecordRequest::challenge(&NS, "_acme-challenge.example.com", "tok").unwrap(),
        ]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn removal_is_selective_by_fqdn() {
        let mut set = RequestSet::new();
        set.merge([
            RecordRequest::challenge(&NS, "foo.example.com", "a").unwrap(),
            RecordRequest::challenge(&NS, "bar.example.com", "b").unwrap(),
        ]);
        assert_eq!(set.remove_fqdn("foo.example.com"), 1);
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.iter().next().unwrap().fqdn().as_deref(),
            Some("bar.example.com")
        );
    }

    #[test]
    fn status_parse_never_fails() {
        assert_eq!(Status::parse("approved"), Status::Approved);
        assert_eq!(Status::parse("pending"), Status::Pending);
        assert_eq!(Status::parse("permission_denied"), Status::PermissionDenied);
        assert_eq!(Status::parse("nonsense"), Status::Unknown);
        assert_eq!(Status::parse(""), Status::Unknown);
    }
}
