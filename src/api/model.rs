use crate::access::AccessLevel;
use crate::error::Error;
use crate::fqdn;
use crate::record::RecordError;
use serde::Deserialize;

/// Body of the `present` and `cleanup` endpoints.
#[derive(Deserialize, Debug, Clone, Default, Ord, PartialOrd, Eq, PartialEq)]
pub(super) struct ChallengeForm {
    pub fqdn: String,
    pub value: String,
}

impl ChallengeForm {
    /// Check the form fields before they reach the reconciler: the FQDN
    /// must split into a host label and domain, and the challenge value
    /// must be non-empty.
    pub fn validate(&self) -> Result<(), Error> {
        let fqdn = fqdn::normalize(&self.fqdn);
        if fqdn::split_first_label(&fqdn).is_none() {
            return Err(Error::InvalidFqdn(self.fqdn.clone()));
        }
        if self.value.is_empty() {
            return Err(Error::Record(RecordError::EmptyField("value")));
        }
        Ok(())
    }
}

/// Body of the admin `users` endpoint.
#[derive(Deserialize, Debug, Clone)]
pub(super) struct UserForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub admin: bool,
}

/// Body of the admin `grants` endpoints.
#[derive(Deserialize, Debug, Clone)]
pub(super) struct GrantForm {
    pub username: String,
    pub domains: Vec<String>,
    pub access_level: AccessLevel,
}
