//! Wire codec for the `dns_entries` relation key.
//!
//! The relation channel is a flat string-keyed map, so the whole request
//! set travels as one JSON array under [`DNS_ENTRIES_KEY`], and every field
//! inside an entry is rendered as a string (TTLs included). Decoding is
//! tolerant per entry (ecosystem noise such as phantom relations or
//! partially-written data must never take down the sibling entries), but a
//! malformed batch is a hard error.

use crate::error::Error;
use crate::record::{Record, RecordClass, RecordError, RecordType};
use crate::relation::request::{RecordRequest, RequestSet, Status};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Relation key holding the JSON-encoded entry list.
pub const DNS_ENTRIES_KEY: &str = "dns_entries";

/// Which side's view of an entry to serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Requester view: record fields, plus status and description when set.
    Request,
    /// Authority view: status and description only.
    Response,
}

/// Flat wire form of a single entry. Unknown fields are ignored on decode;
/// partial entries (e.g. a status-only answer) are expected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Serialize a request set to its relation representation.
pub fn encode(set: &RequestSet, projection: Projection) -> Result<HashMap<String, String>, Error> {
    let entries: Vec<WireEntry> = set
        .iter()
        .filter_map(|request| wire_entry(request, projection))
        .collect();
    let mut kv = HashMap::new();
    kv.insert(DNS_ENTRIES_KEY.to_string(), serde_json::to_string(&entries)?);
    Ok(kv)
}

fn wire_entry(request: &RecordRequest, projection: Projection) -> Option<WireEntry> {
    let mut entry = WireEntry {
        uuid: Some(request.uuid),
        ..WireEntry::default()
    };
    match projection {
        Projection::Request => {
            if let Some(record) = &request.record {
                entry.domain = Some(record.domain.clone());
                entry.host_label = Some(record.host_label.clone());
                entry.ttl = Some(record.ttl.to_string());
                entry.record_class = Some(record.record_class.to_string());
                entry.record_type = Some(record.record_type.to_string());
                entry.record_data = Some(record.record_data.to_string());
            }
            entry.status = request.status.map(|status| status.to_string());
            entry.description = request.description.clone();
        }
        Projection::Response => {
            // An entry with no status is not an answer; there is nothing
            // for the authority side to say about it.
            entry.status = Some(request.status?.to_string());
            entry.description = request.description.clone();
        }
    }
    Some(entry)
}

/// Deserialize a request set from relation data.
///
/// A missing `dns_entries` key yields an empty set. Malformed JSON for the
/// whole batch is an error; a malformed entry is logged and dropped. Raw
/// entries sharing a UUID are merged field-by-field (last write wins)
/// before validation, supporting the two-phase channel where record fields
/// and status fields arrive as separate partial blobs.
pub fn decode(kv: &HashMap<String, String>) -> Result<RequestSet, Error> {
    let Some(raw) = kv.get(DNS_ENTRIES_KEY) else {
        return Ok(RequestSet::new());
    };
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;

    // Group raw entries by UUID before validating.
    let mut grouped: IndexMap<Uuid, WireEntry> = IndexMap::new();
    for value in values {
        let entry: WireEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("dropping malformed relation entry: {err}");
                continue;
            }
        };
        let Some(uuid) = entry.uuid else {
            tracing::warn!("dropping relation entry without a UUID");
            continue;
        };
        match grouped.get_mut(&uuid) {
            Some(existing) => overlay(existing, entry),
            None => {
                grouped.insert(uuid, entry);
            }
        }
    }

    let mut set = RequestSet::new();
    for (uuid, entry) in grouped {
        // An entry whose record fields do not validate is retried as a
        // pure status entry before being given up on.
        let record = match wire_record(&entry) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!("relation entry {uuid} has no usable record: {err}");
                None
            }
        };
        let status = entry.status.as_deref().map(Status::parse);
        match RecordRequest::new(uuid, record, status, entry.description) {
            Ok(request) => set.merge([request]),
            Err(err) => tracing::warn!("dropping relation entry: {err}"),
        }
    }
    Ok(set)
}

// Last-write-wins per field, in iteration order of the raw entries.
fn overlay(existing: &mut WireEntry, incoming: WireEntry) {
    let WireEntry {
        uuid: _,
        domain,
        host_label,
        ttl,
        record_class,
        record_type,
        record_data,
        status,
        description,
    } = incoming;
    if domain.is_some() {
        existing.domain = domain;
    }
    if host_label.is_some() {
        existing.host_label = host_label;
    }
    if ttl.is_some() {
        existing.ttl = ttl;
    }
    if record_class.is_some() {
        existing.record_class = record_class;
    }
    if record_type.is_some() {
        existing.record_type = record_type;
    }
    if record_data.is_some() {
        existing.record_data = record_data;
    }
    if status.is_some() {
        existing.status = status;
    }
    if description.is_some() {
        existing.description = description;
    }
}

fn wire_record(entry: &WireEntry) -> Result<Record, RecordError> {
    let domain = entry.domain.as_deref().ok_or(RecordError::EmptyField("domain"))?;
    let host_label = entry
        .host_label
        .as_deref()
        .ok_or(RecordError::EmptyField("host_label"))?;
    let raw_ttl = entry.ttl.as_deref().ok_or(RecordError::EmptyField("ttl"))?;
    let ttl: u32 = raw_ttl
        .parse()
        .map_err(|_| RecordError::InvalidTtl(raw_ttl.to_string()))?;
    let record_class: RecordClass = match entry.record_class.as_deref() {
        Some(class) => class.parse()?,
        None => RecordClass::default(),
    };
    let record_type: RecordType = entry
        .record_type
        .as_deref()
        .ok_or(RecordError::EmptyField("record_type"))?
        .parse()?;
    let record_data = entry
        .record_data
        .as_deref()
        .ok_or(RecordError::EmptyField("data"))?;
    Record::new(domain, host_label, ttl, record_class, record_type, record_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::request::{challenge_uuid, RecordRequest};

    const NS: Uuid = Uuid::from_u128(0x6ba7_b810_9dad_11d1_80b4_00c0_4fd4_30c8);

    fn challenge_set() -> RequestSet {
        [
            RecordRequest::challenge(&NS, "_acme-challenge.foo.example.com", "tok123").unwrap(),
            RecordRequest::challenge(&NS, "_acme-challenge.bar.example.com", "tok456").unwrap(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn request_projection_round_trips() {
        let set = challenge_set();
        let kv = encode(&set, Projection::Request).unwrap();
        assert_eq!(decode(&kv).unwrap(), set);
    }

    #[test]
    fn response_projection_round_trips_statuses() {
        let uuid = Uuid::from_u128(7);
        let set: RequestSet = [RecordRequest::new(
            uuid,
            None,
            Some(Status::Approved),
            Some("all good".to_string()),
        )
        .unwrap()]
        .into_iter()
        .collect();
        let kv = encode(&set, Projection::Response).unwrap();
        let decoded = decode(&kv).unwrap();
        let entry = decoded.get(&uuid).unwrap();
        assert_eq!(entry.status, Some(Status::Approved));
        assert_eq!(entry.description.as_deref(), Some("all good"));
        assert!(entry.record.is_none());
    }

    #[test]
    fn ttl_serializes_as_its_decimal_string() {
        let set = challenge_set();
        let kv = encode(&set, Projection::Request).unwrap();
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(&kv[DNS_ENTRIES_KEY]).unwrap();
        assert_eq!(entries[0]["ttl"], serde_json::json!("600"));
        assert_eq!(entries[0]["record_type"], serde_json::json!("TXT"));
    }

    #[test]
    fn missing_key_decodes_to_an_empty_set() {
        assert!(decode(&HashMap::new()).unwrap().is_empty());
    }

    #[test]
    fn malformed_batch_is_a_hard_error() {
        let mut kv = HashMap::new();
        kv.insert(DNS_ENTRIES_KEY.to_string(), "{not json".to_string());
        assert!(matches!(decode(&kv), Err(Error::InvalidJSON(_))));
    }

    #[test]
    fn one_bad_entry_does_not_poison_the_batch() {
        let good = challenge_set();
        let mut entries: Vec<serde_json::Value> = serde_json::from_str(
            &encode(&good, Projection::Request).unwrap()[DNS_ENTRIES_KEY],
        )
        .unwrap();
        // Structurally invalid entry: ttl is an object.
        entries.push(serde_json::json!({
            "uuid": Uuid::from_u128(9).to_string(),
            "domain": "example.com",
            "host_label": "x",
            "ttl": {"seconds": 600},
            "record_type": "TXT",
            "record_data": "tok",
        }));
        let mut kv = HashMap::new();
        kv.insert(DNS_ENTRIES_KEY.to_string(), serde_json::to_string(&entries).unwrap());
        assert_eq!(decode(&kv).unwrap().len(), 2);
    }

    #[test]
    fn entries_without_a_uuid_are_discarded() {
        let entries = serde_json::json!([
            {"domain": "example.com", "host_label": "x", "ttl": "600",
             "record_type": "TXT", "record_data": "tok"},
        ]);
        let mut kv = HashMap::new();
        kv.insert(DNS_ENTRIES_KEY.to_string(), entries.to_string());
        assert!(decode(&kv).unwrap().is_empty());
    }

    #[test]
    fn partial_blobs_sharing_a_uuid_merge_before_validation() {
        let uuid = challenge_uuid(&NS, "_acme-challenge.example.com", "tok");
        let entries = serde_json::json!([
            {"uuid": uuid.to_string(), "domain": "example.com",
             "host_label": "_acme-challenge", "ttl": "600",
             "record_class": "IN", "record_type": "TXT", "record_data": "tok"},
            {"uuid": uuid.to_string(), "status": "approved"},
        ]);
        let mut kv = HashMap::new();
        kv.insert(DNS_ENTRIES_KEY.to_string(), entries.to_string());
        let set = decode(&kv).unwrap();
        assert_eq!(set.len(), 1);
        let entry = set.get(&uuid).unwrap();
        assert_eq!(entry.status, Some(Status::Approved));
        assert_eq!(entry.fqdn().as_deref(), Some("_acme-challenge.example.com"));
    }

    #[test]
    fn bad_record_falls_back_to_a_status_entry() {
        let uuid = Uuid::from_u128(11);
        // Unknown record type: the record is unusable, but the entry
        // carries a status and survives as a response entry.
        let entries = serde_json::json!([
            {"uuid": uuid.to_string(), "domain": "example.com",
             "host_label": "x", "ttl": "600", "record_type": "WKS",
             "record_data": "tok", "status": "failure"},
        ]);
        let mut kv = HashMap::new();
        kv.insert(DNS_ENTRIES_KEY.to_string(), entries.to_string());
        let set = decode(&kv).unwrap();
        let entry = set.get(&uuid).unwrap();
        assert!(entry.record.is_none());
        assert_eq!(entry.status, Some(Status::Failure));
    }

    #[test]
    fn bad_record_without_a_status_is_dropped() {
        let entries = serde_json::json!([
            {"uuid": Uuid::from_u128(12).to_string(), "domain": "example.com",
             "host_label": "x", "ttl": "600", "record_type": "WKS",
             "record_data": "tok"},
        ]);
        let mut kv = HashMap::new();
        kv.insert(DNS_ENTRIES_KEY.to_string(), entries.to_string());
        assert!(decode(&kv).unwrap().is_empty());
    }

    #[test]
    fn unknown_status_maps_to_unknown() {
        let uuid = Uuid::from_u128(13);
        let entries = serde_json::json!([
            {"uuid": uuid.to_string(), "status": "rejected_by_cosmic_rays"},
        ]);
        let mut kv = HashMap::new();
        kv.insert(DNS_ENTRIES_KEY.to_string(), entries.to_string());
        let set = decode(&kv).unwrap();
        assert_eq!(set.get(&uuid).unwrap().status, Some(Status::Unknown));
    }

    #[test]
    fn empty_set_encodes_an_empty_list() {
        let kv = encode(&RequestSet::new(), Projection::Request).unwrap();
        assert_eq!(kv[DNS_ENTRIES_KEY], "[]");
    }
}
