use crate::access::Grant;
use crate::error::Error;
use crate::user_store::{password_digest, UserStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserEntry {
    password_digest: String,
    admin: bool,
    grants: Vec<Grant>,
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryUserStore {
    users: HashMap<String, UserEntry>,
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .map_or(false, |user| user.password_digest == password_digest(password))
    }

    async fn is_admin(&self, username: &str) -> bool {
        self.users.get(username).map_or(false, |user| user.admin)
    }

    async fn grants_for(&self, username: &str) -> Vec<Grant> {
        self.users
            .get(username)
            .map_or(Vec::default(), |user| user.grants.clone())
    }

    async fn put_user(
        &mut self,
        username: &str,
        password: &str,
        admin: bool,
    ) -> Result<(), Error> {
        let digest = password_digest(password);
        self.users
            .entry(username.to_string())
            .and_modify(|user| {
                user.password_digest = digest.clone();
                user.admin = admin;
            })
            .or_insert(UserEntry {
                password_digest: digest,
                admin,
                grants: Vec::default(),
            });
        Ok(())
    }

    async fn grant(&mut self, username: &str, grant: Grant) -> Result<(), Error> {
        let user = self
            .users
            .get_mut(username)
            .ok_or_else(|| Error::UnknownUser(username.to_string()))?;
        if !user.grants.contains(&grant) {
            user.grants.push(grant);
        }
        Ok(())
    }

    async fn revoke(&mut self, username: &str, grant: &Grant) -> Result<(), Error> {
        let user = self
            .users
            .get_mut(username)
            .ok_or_else(|| Error::UnknownUser(username.to_string()))?;
        let before = user.grants.len();
        user.grants.retain(|held| held != grant);
        if user.grants.len() == before {
            return Err(Error::UnknownGrant {
                user: username.to_string(),
                domain: grant.domain.to_string(),
            });
        }
        Ok(())
    }
}
