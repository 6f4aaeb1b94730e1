use crate::error::Error;
use crate::relation::{DynRelationStore, FileRelationStore, InMemoryRelationStore};
use crate::user_store::{DynUserStore, FileUserStore, InMemoryUserStore};
use ipnetwork::IpNetwork;
use lazy_static::lazy_static;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type SharedConfig = Arc<Config>;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// UUIDv5 namespace for deriving request identities. Generated once
    /// per deployment and kept stable so resubmissions stay idempotent.
    pub namespace: Uuid,
    /// Whether this instance is the primary writer of the relation
    /// channel. Non-primary instances serve the API but ignore notices.
    #[serde(default = "default_primary")]
    pub primary: bool,
    pub api_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub api_timeout: Duration,
    pub relay_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub relay_timeout: Duration,
    pub user_store_state_path: Option<String>,
    pub relation_state_path: Option<String>,
    /// Program run to signal the DNS authority (`<program> notify ...`).
    pub notify_program: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout: Duration,
    /// Admin account ensured at startup so a fresh deployment can be
    /// administered; further users are created through the API.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

fn default_primary() -> bool {
    true
}

fn default_notify_timeout() -> Duration {
    Duration::from_secs(10)
}

lazy_static! {
    // NOTE(XXX): Once the "ip" feature has stabilized we can use Ipv6Addr.is_unique_local[0].
    //            Presently this feature is unstable so we home-roll. See also RFC 4193[1].
    // [0]: https://doc.rust-lang.org/std/net/struct.Ipv6Addr.html#method.is_unique_local
    // [1]: https://www.rfc-editor.org/rfc/rfc4193.html
    static ref IPV6_UNIQUE_LOCAL_NETWORK: IpNetwork = IpNetwork::from_str("fc00::/7").unwrap();
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.bind_addrs_are_secure()?;
        Ok(conf)
    }

    /// Build the user store configured for this deployment: file-backed
    /// when a state path is set, in-memory otherwise.
    pub async fn user_store(&self) -> Result<DynUserStore, Error> {
        Ok(match &self.user_store_state_path {
            Some(path) => Arc::new(RwLock::new(FileUserStore::try_from_file(path).await?)),
            None => Arc::new(RwLock::new(InMemoryUserStore::default())),
        })
    }

    /// Build the relation channel store, file-backed when a state path is
    /// set.
    pub async fn relation_store(&self) -> Result<DynRelationStore, Error> {
        Ok(match &self.relation_state_path {
            Some(path) => Arc::new(RwLock::new(FileRelationStore::try_from_file(path).await?)),
            None => Arc::new(RwLock::new(InMemoryRelationStore::default())),
        })
    }

    fn bind_addrs_are_secure(&self) -> Result<(), Error> {
        for addr in [self.api_bind_addr, self.relay_bind_addr] {
            Self::addr_is_secure(addr)?;
        }
        Ok(())
    }

    fn addr_is_secure(addr: SocketAddr) -> Result<(), Error> {
        match addr {
            SocketAddr::V4(v4_addr) => {
                let ip = v4_addr.ip();
                if !ip.is_loopback() && !ip.is_private() {
                    return Err(Error::InsecureBind(IpAddr::V4(*ip)));
                }
                Ok(())
            }
            SocketAddr::V6(v6_addr) => {
                let ip = v6_addr.ip();
                if !ip.is_loopback() && !IPV6_UNIQUE_LOCAL_NETWORK.contains(IpAddr::V6(*ip)) {
                    return Err(Error::InsecureBind(IpAddr::V6(*ip)));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_config(json: &serde_json::Value) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{json}").unwrap();
        f
    }

    fn minimal(api_bind: &str) -> serde_json::Value {
        serde_json::json!({
            "namespace": "f8f25bcd-4a9c-4ee2-96ec-47d36e45c7b4",
            "api_bind_addr": api_bind,
            "api_timeout": 30,
            "relay_bind_addr": "127.0.0.1:3001",
            "relay_timeout": 30,
            "notify_program": "/usr/local/bin/dns-notify",
        })
    }

    #[test]
    fn loads_and_applies_defaults() {
        let f = write_config(&minimal("127.0.0.1:3000"));
        let config = Config::try_from_file(f.path()).unwrap();
        assert!(config.primary);
        assert_eq!(config.notify_timeout, Duration::from_secs(10));
        assert_eq!(config.api_timeout, Duration::from_secs(30));
        assert!(config.user_store_state_path.is_none());
    }

    #[test]
    fn rejects_public_bind_addrs() {
        let f = write_config(&minimal("93.184.216.34:3000"));
        assert!(matches!(
            Config::try_from_file(f.path()),
            Err(Error::InsecureBind(_))
        ));
    }
}
