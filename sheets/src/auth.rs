use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("credential source missing: {0}")]
    Missing(String),
}

/// Supplies bearer tokens for the spreadsheet API.
///
/// Credential acquisition (service accounts, refresh flows) lives outside
/// this crate; implementations only hand over a currently valid token.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Token provider backed by a token handed in at construction time.
#[derive(Debug)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        StaticTokenProvider {
            token: token.into(),
        }
    }

    /// Reads the token from an environment variable at startup.
    pub fn from_env(var: &str) -> Result<Self, AuthError> {
        match std::env::var(var) {
            Ok(token) if !token.is_empty() => Ok(Self::new(token)),
            _ => Err(AuthError::Missing(var.to_string())),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }
}
