use crate::error::Error;
use crate::relation::RelationStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryRelationStore {
    data: HashMap<String, String>,
}

#[async_trait::async_trait]
impl RelationStore for InMemoryRelationStore {
    async fn read(&self) -> HashMap<String, String> {
        self.data.clone()
    }

    async fn write(&mut self, kv: HashMap<String, String>) -> Result<(), Error> {
        self.data = kv;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_replaces_the_whole_value() {
        let mut store = InMemoryRelationStore::default();
        store
            .write(HashMap::from([
                ("dns_entries".to_string(), "[]".to_string()),
                ("stale".to_string(), "x".to_string()),
            ]))
            .await
            .unwrap();
        store
            .write(HashMap::from([(
                "dns_entries".to_string(),
                "[]".to_string(),
            )]))
            .await
            .unwrap();
        let kv = store.read().await;
        assert_eq!(kv.len(), 1);
        assert!(!kv.contains_key("stale"));
    }
}
