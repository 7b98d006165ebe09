use async_trait::async_trait;
use std::sync::Mutex;

use crate::config::SessionConfig;
use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub uid: String,
    pub display_name: Option<String>,
}

/// Resolves who is signed in for remote mode.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_identity(&self) -> Result<Option<UserIdentity>, SessionError>;

    async fn sign_out(&self) -> Result<(), SessionError>;
}

/// Identity taken from `[session].user_id`. Signing out forgets it for this process.
pub struct ConfiguredAuth {
    identity: Mutex<Option<UserIdentity>>,
}

impl ConfiguredAuth {
    pub fn new(identity: Option<UserIdentity>) -> Self {
        Self {
            identity: Mutex::new(identity),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let identity = config
            .user_id
            .as_ref()
            .filter(|uid| !uid.trim().is_empty())
            .map(|uid| UserIdentity {
                uid: uid.clone(),
                display_name: config.display_name.clone(),
            });
        Self::new(identity)
    }
}

#[async_trait]
impl AuthProvider for ConfiguredAuth {
    async fn current_identity(&self) -> Result<Option<UserIdentity>, SessionError> {
        self.identity
            .lock()
            .map(|id| id.clone())
            .map_err(|e| SessionError::Auth(format!("identity lock poisoned: {e}")))
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        let mut identity = self
            .identity
            .lock()
            .map_err(|e| SessionError::Auth(format!("identity lock poisoned: {e}")))?;
        *identity = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_user_id_is_signed_out() {
        let config = SessionConfig {
            user_id: Some("  ".into()),
            ..SessionConfig::default()
        };
        let auth = ConfiguredAuth::from_config(&config);
        assert!(auth.current_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_out_forgets_identity() {
        let config = SessionConfig {
            user_id: Some("u1".into()),
            display_name: Some("Ada".into()),
            ..SessionConfig::default()
        };
        let auth = ConfiguredAuth::from_config(&config);
        let identity = auth.current_identity().await.unwrap().unwrap();
        assert_eq!(identity.uid, "u1");
        assert_eq!(identity.display_name.as_deref(), Some("Ada"));

        auth.sign_out().await.unwrap();
        assert!(auth.current_identity().await.unwrap().is_none());
    }
}
