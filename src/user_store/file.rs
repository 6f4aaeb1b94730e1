//! A JSON file-backed implementation of the [`UserStore`] trait.
//!
//! Wraps an [`InMemoryUserStore`], persisting
//! updates to a JSON file on disk that can be reloaded across restarts.
use crate::access::Grant;
use crate::error::Error;
use crate::user_store::memory::InMemoryUserStore;
use crate::user_store::UserStore;
use std::io::ErrorKind;
use tokio::fs::File;
use tokio::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Default, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct FileUserStore {
    users: InMemoryUserStore,
    path: String,
}

impl FileUserStore {
    /// Save the state of the user store as JSON to the store's configured
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the state can't be serialized to
    /// JSON, or [`Error::IO`] if it can't be written to the backing file.
    pub async fn save(&self) -> Result<(), Error> {
        let data = serde_json::to_string_pretty(&self.users)?;
        let mut output_file = File::create(&self.path).await?;
        output_file.write_all(data.as_bytes()).await?;
        output_file.flush().await?;
        Ok(())
    }

    /// Load a [`FileUserStore`] from the JSON state at the given path,
    /// creating an empty state file if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the state file holds invalid JSON,
    /// or [`Error::IO`] if the path can't be opened or read.
    pub async fn try_from_file(p: &str) -> Result<Self, Error> {
        let contents = match File::open(p).await {
            Ok(mut f) => {
                let mut buf = vec![];
                f.read_to_end(&mut buf).await?;
                buf
            }
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Self::write_empty_state(File::create(&p).await?).await?,
                _ => return Err(Error::IO(err)),
            },
        };

        let users: InMemoryUserStore = serde_json::from_slice(&contents)?;
        Ok(Self {
            path: p.to_string(),
            users,
        })
    }

    async fn write_empty_state(mut f: File) -> io::Result<Vec<u8>> {
        let default_data = serde_json::to_string_pretty(&InMemoryUserStore::default())?;
        let default_bytes = default_data.as_bytes();
        f.write_all(default_bytes).await?;
        f.flush().await?;
        Ok(default_bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl UserStore for FileUserStore {
    async fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.users.verify_credentials(username, password).await
    }

    async fn is_admin(&self, username: &str) -> bool {
        self.users.is_admin(username).await
    }

    async fn grants_for(&self, username: &str) -> Vec<Grant> {
        self.users.grants_for(username).await
    }

    async fn put_user(
        &mut self,
        username: &str,
        password: &str,
        admin: bool,
    ) -> Result<(), Error> {
        self.users.put_user(username, password, admin).await?;
        self.save().await?;
        Ok(())
    }

    async fn grant(&mut self, username: &str, grant: Grant) -> Result<(), Error> {
        self.users.grant(username, grant).await?;
        self.save().await?;
        Ok(())
    }

    async fn revoke(&mut self, username: &str, grant: &Grant) -> Result<(), Error> {
        self.users.revoke(username, grant).await?;
        self.save().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessLevel;

    #[tokio::test]
    async fn state_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let path = path.to_str().unwrap();

        let mut store = FileUserStore::try_from_file(path).await.unwrap();
        store.put_user("alice", "pw", true).await.unwrap();
        store
            .grant(
                "alice",
                Grant {
                    domain: "example.com".parse().unwrap(),
                    access_level: AccessLevel::Subtree,
                },
            )
            .await
            .unwrap();

        let reloaded = FileUserStore::try_from_file(path).await.unwrap();
        assert!(reloaded.verify_credentials("alice", "pw").await);
        assert!(reloaded.is_admin("alice").await);
        assert_eq!(reloaded.grants_for("alice").await.len(), 1);
    }
}
