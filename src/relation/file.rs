//! A JSON file-backed implementation of the [`RelationStore`] trait.
//!
//! Wraps an [`InMemoryRelationStore`], persisting the channel state to a
//! JSON file after each write so the counterpart process can pick it up
//! and state survives restarts.
use crate::error::Error;
use crate::relation::memory::InMemoryRelationStore;
use crate::relation::RelationStore;
use std::collections::HashMap;
use std::io::ErrorKind;
use tokio::fs::File;
use tokio::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Default, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct FileRelationStore {
    relation: InMemoryRelationStore,
    path: String,
}

impl FileRelationStore {
    /// Save the channel state as JSON to the store's configured path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the state can't be serialized, or
    /// [`Error::IO`] if it can't be written to the backing file.
    pub async fn save(&self) -> Result<(), Error> {
        let data = serde_json::to_string_pretty(&self.relation)?;
        let mut output_file = File::create(&self.path).await?;
        output_file.write_all(data.as_bytes()).await?;
        output_file.flush().await?;
        Ok(())
    }

    /// Load a [`FileRelationStore`] from the JSON state at the given path,
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

        let relation: InMemoryRelationStore = serde_json::from_slice(&contents)?;
        Ok(Self {
            path: p.to_string(),
            relation,
        })
    }

    async fn write_empty_state(mut f: File) -> io::Result<Vec<u8>> {
        let default_data = serde_json::to_string_pretty(&InMemoryRelationStore::default())?;
        let default_bytes = default_data.as_bytes();
        f.write_all(default_bytes).await?;
        f.flush().await?;
        Ok(default_bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl RelationStore for FileRelationStore {
    async fn read(&self) -> HashMap<String, String> {
        self.relation.read().await
    }

    async fn write(&mut self, kv: HashMap<String, String>) -> Result<(), Error> {
        self.relation.write(kv).await?;
        self.save().await?;
        Ok(())
    }
}
