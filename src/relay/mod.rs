//! Notification bridge between the DNS authority and the relation channel.
//!
//! The authority-side process signals record mutations out-of-band as
//! notices: a key (`dns.local/write` or `dns.local/remove`) plus a payload
//! of single-quoted fields. The [`Bridge`] folds each notice into the
//! current outgoing request set and pushes the complete set back through
//! the [codec][crate::relation::codec]; the transport replaces whole
//! values, so the full set is always read before mutation and written back
//! afterwards.
//!
//! Unrecognized notice kinds are logged and ignored: the authority side may
//! run an older or newer protocol revision than this service.
//!
//! Only the primary instance writes the channel. Writer serialization is by
//! convention (a single named actor owns the outgoing side at any time),
//! not by locking; lost updates converge anyway because entry identity is
//! deterministic and merges are idempotent.

use crate::error::Error;
use crate::relation::codec::{self, Projection};
use crate::relation::request::RecordRequest;
use crate::relation::{DynRelationStore, RelationStore};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

pub mod server;

pub use server::new;

/// Notice key requesting a challenge record write.
pub const WRITE_NOTICE: &str = "dns.local/write";
/// Notice key requesting record removal.
pub const REMOVE_NOTICE: &str = "dns.local/remove";

/// An out-of-band signal from the DNS authority side.
#[derive(Debug, Clone, Deserialize)]
pub struct Notice {
    pub key: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl Notice {
    // Payload fields arrive single-quoted (`fqdn='foo.example.com'`).
    fn field(&self, name: &str) -> Option<String> {
        self.data
            .get(name)
            .map(|value| value.trim().trim_matches('\'').trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeKind {
    Write,
    Remove,
}

impl NoticeKind {
    fn parse(key: &str) -> Option<Self> {
        if key.starts_with(WRITE_NOTICE) {
            Some(NoticeKind::Write)
        } else if key.starts_with(REMOVE_NOTICE) {
            Some(NoticeKind::Remove)
        } else {
            None
        }
    }
}

/// Folds authority notices into the relation channel's request set.
pub struct Bridge {
    relation: DynRelationStore,
    namespace: Uuid,
    primary: bool,
}

impl Bridge {
    pub fn new(relation: DynRelationStore, namespace: Uuid, primary: bool) -> Self {
        Bridge {
            relation,
            namespace,
            primary,
        }
    }

    /// Apply one notice: merge a write, apply a removal, ignore anything
    /// unrecognized. A faulty payload (missing fields, unsplittable FQDN)
    /// is logged and dropped without failing the caller.
    pub async fn handle(&self, notice: &Notice) -> Result<(), Error> {
        if !self.primary {
            tracing::debug!("not the primary writer, ignoring notice {}", notice.key);
            return Ok(());
        }
        let Some(kind) = NoticeKind::parse(&notice.key) else {
            tracing::debug!("unknown notice: {}", notice.key);
            return Ok(());
        };

        let kv = self.relation.read().await.read().await;
        let mut set = codec::decode(&kv)?;

        match kind {
            NoticeKind::Write => {
                let (Some(fqdn), Some(rdata)) = (notice.field("fqdn"), notice.field("rdata"))
                else {
                    tracing::error!("faulty write notice {}: missing fqdn/rdata", notice.key);
                    return Ok(());
                };
                match RecordRequest::challenge(&self.namespace, &fqdn, &rdata) {
                    Ok(request) => {
                        tracing::debug!("dns record request: {request:?}");
                        set.merge([request]);
                    }
                    Err(err) => {
                        tracing::error!("faulty write notice for \"{fqdn}\": {err}");
                        return Ok(());
                    }
                }
            }
            NoticeKind::Remove => {
                let Some(fqdn) = notice.field("fqdn") else {
                    tracing::error!("faulty remove notice {}: missing fqdn", notice.key);
                    return Ok(());
                };
                let removed = set.remove_fqdn(&fqdn);
                tracing::debug!("removed {removed} request(s) for \"{fqdn}\"");
            }
        }

        let kv = codec::encode(&set, Projection::Request)?;
        self.relation.write().await.write(kv).await
    }
}
