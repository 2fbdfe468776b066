//! Fixed credential table, configured with `--static-token TOKEN=NAME[:EMAIL]`.

use std::{collections::HashMap, str::FromStr};

use async_trait::async_trait;

use crate::domain::{AuthError, Authenticator, Identity};

/// One `TOKEN=NAME[:EMAIL]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredential {
    pub token: String,
    pub identity: Identity,
}

impl FromStr for StaticCredential {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (token, profile) = value
            .split_once('=')
            .ok_or_else(|| format!("expected TOKEN=NAME[:EMAIL], got '{value}'"))?;
        let (name, email) = match profile.split_once(':') {
            Some((name, email)) => (name, Some(email.trim().to_string())),
            None => (profile, None),
        };
        let token = token.trim();
        let name = name.trim();
        if token.is_empty() || name.is_empty() {
            return Err(format!("token and name must not be empty in '{value}'"));
        }
        Ok(Self {
            token: token.to_string(),
            identity: Identity::new(name, email.filter(|email| !email.is_empty())),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenAuthenticator {
    pub fn new(credentials: impl IntoIterator<Item = StaticCredential>) -> Self {
        Self {
            tokens: credentials
                .into_iter()
                .map(|credential| (credential.token, credential.identity))
                .collect(),
        }
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        self.tokens
            .get(credential)
            .cloned()
            .ok_or_else(|| AuthError::Rejected("unknown token".to_string()))
    }
}
