//! Explicit session context: token, selected module, module lists.
//!
//! Persisted fields write through to the backing `SessionStorage`; the
//! relayer and the safe-app flag live only in memory.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use samm_types::{Result, SammData, SammError};

use crate::{keys, SessionStorage};

/// Where the caller should send the user after the token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRedirect {
    /// Standalone: go to the login flow.
    Authorization,
    /// Inside the Safe shell: back to the landing page.
    Home,
}

pub struct Session {
    storage: Arc<dyn SessionStorage>,
    access_token: Option<String>,
    is_authenticated: bool,
    current_samm: Option<SammData>,
    user_samms: Vec<SammData>,
    disabled_samms: Vec<SammData>,
    relayer: Option<String>,
    is_safe_app: Option<bool>,
}

impl Session {
    /// Empty session that has not read storage.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            access_token: None,
            is_authenticated: false,
            current_samm: None,
            user_samms: Vec::new(),
            disabled_samms: Vec::new(),
            relayer: None,
            is_safe_app: None,
        }
    }

    /// Load persisted state. Malformed snapshots are treated as absent.
    pub async fn hydrate(storage: Arc<dyn SessionStorage>) -> Result<Self> {
        storage.init().await?;
        let mut session = Self::new(storage);

        session.access_token = session
            .storage
            .get(keys::ACCESS_TOKEN)
            .await?
            .filter(|t| !t.is_empty());
        session.is_authenticated = session
            .read_snapshot::<bool>(keys::IS_AUTHENTICATED)
            .await?
            .unwrap_or(false);
        session.current_samm = session.read_snapshot(keys::CURRENT_SAMM).await?;
        session.user_samms = session.read_snapshot(keys::USER_SAMMS).await?.unwrap_or_default();
        session.disabled_samms = session
            .read_snapshot(keys::DISABLED_SAMMS)
            .await?
            .unwrap_or_default();

        tracing::debug!(
            authenticated = session.is_authenticated,
            samms = session.user_samms.len(),
            "session hydrated"
        );
        Ok(session)
    }

    async fn read_snapshot<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.storage.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring malformed session snapshot");
                Ok(None)
            }
        }
    }

    async fn write_snapshot<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| SammError::Storage(format!("failed to serialize {key}: {e}")))?;
        self.storage.set(key, &raw).await
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn current_samm(&self) -> Option<&SammData> {
        self.current_samm.as_ref()
    }

    pub fn user_samms(&self) -> &[SammData] {
        &self.user_samms
    }

    pub fn disabled_samms(&self) -> &[SammData] {
        &self.disabled_samms
    }

    pub fn relayer(&self) -> Option<&str> {
        self.relayer.as_deref()
    }

    pub fn set_relayer(&mut self, relayer: impl Into<String>) {
        self.relayer = Some(relayer.into());
    }

    /// `None` until the safe-app probe has run.
    pub fn is_safe_app(&self) -> Option<bool> {
        self.is_safe_app
    }

    pub fn set_is_safe_app(&mut self, is_safe_app: bool) {
        self.is_safe_app = Some(is_safe_app);
    }

    pub async fn login(&mut self, token: &str) -> Result<()> {
        self.storage.set(keys::ACCESS_TOKEN, token).await?;
        self.write_snapshot(keys::IS_AUTHENTICATED, &true).await?;
        self.access_token = Some(token.to_string());
        self.is_authenticated = true;
        tracing::info!("logged in");
        Ok(())
    }

    pub async fn set_current_samm(&mut self, samm: Option<SammData>) -> Result<()> {
        match &samm {
            Some(data) => self.write_snapshot(keys::CURRENT_SAMM, data).await?,
            None => self.storage.remove(keys::CURRENT_SAMM).await?,
        }
        self.current_samm = samm;
        Ok(())
    }

    pub async fn set_user_samms(&mut self, samms: Vec<SammData>) -> Result<()> {
        self.write_snapshot(keys::USER_SAMMS, &samms).await?;
        self.user_samms = samms;
        Ok(())
    }

    pub async fn set_disabled_samms(&mut self, samms: Vec<SammData>) -> Result<()> {
        self.write_snapshot(keys::DISABLED_SAMMS, &samms).await?;
        self.disabled_samms = samms;
        Ok(())
    }

    /// Forget everything, persisted and in memory.
    pub async fn logout(&mut self) -> Result<()> {
        for key in keys::ALL {
            self.storage.remove(key).await?;
        }
        self.access_token = None;
        self.is_authenticated = false;
        self.current_samm = None;
        self.user_samms.clear();
        self.disabled_samms.clear();
        self.relayer = None;
        tracing::info!("logged out");
        Ok(())
    }

    /// React to a failed backend call.
    ///
    /// An unauthorized error drops the token and returns where to send the
    /// user; other errors leave the session untouched.
    pub async fn handle_api_error(&mut self, err: &SammError) -> Option<AuthRedirect> {
        if !err.is_unauthorized() {
            return None;
        }

        tracing::warn!(error = %err, "session expired");
        self.access_token = None;
        self.is_authenticated = false;
        if let Err(e) = self.storage.remove(keys::ACCESS_TOKEN).await {
            tracing::warn!(error = %e, "failed to drop access token");
        }
        if let Err(e) = self.write_snapshot(keys::IS_AUTHENTICATED, &false).await {
            tracing::warn!(error = %e, "failed to store authentication flag");
        }

        Some(match self.is_safe_app {
            Some(true) => AuthRedirect::Home,
            _ => AuthRedirect::Authorization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    fn samm(id: u64) -> SammData {
        SammData {
            id,
            root: "42".into(),
            name: format!("samm-{id}"),
            nonce: 0,
            chain_id: 11155111,
            threshold: 2,
            is_active: true,
            safe_address: "0x1111111111111111111111111111111111111111".into(),
            samm_address: "0x2222222222222222222222222222222222222222".into(),
            expiration_period: 604_800,
        }
    }

    #[tokio::test]
    async fn test_setters_write_through() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::hydrate(storage.clone()).await.unwrap();
        session.login("tok").await.unwrap();
        session.set_current_samm(Some(samm(1))).await.unwrap();
        session.set_user_samms(vec![samm(1), samm(2)]).await.unwrap();
        session.set_disabled_samms(vec![samm(3)]).await.unwrap();
        session.set_relayer("relayer@example.com");

        let restored = Session::hydrate(storage).await.unwrap();
        assert_eq!(restored.access_token(), Some("tok"));
        assert!(restored.is_authenticated());
        assert_eq!(restored.current_samm().map(|s| s.id), Some(1));
        assert_eq!(restored.user_samms().len(), 2);
        assert_eq!(restored.disabled_samms()[0].id, 3);
        assert_eq!(restored.relayer(), None);
        assert_eq!(restored.is_safe_app(), None);
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::CURRENT_SAMM, "{not json").await.unwrap();
        storage.set(keys::USER_SAMMS, "[1, 2]").await.unwrap();
        storage.set(keys::IS_AUTHENTICATED, "maybe").await.unwrap();

        let session = Session::hydrate(storage).await.unwrap();
        assert!(session.current_samm().is_none());
        assert!(session.user_samms().is_empty());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_removes_every_key() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::new(storage.clone());
        session.login("tok").await.unwrap();
        session.set_current_samm(Some(samm(1))).await.unwrap();
        session.set_user_samms(vec![samm(1)]).await.unwrap();
        session.set_disabled_samms(vec![]).await.unwrap();

        session.logout().await.unwrap();
        assert!(storage.is_empty());
        assert!(session.access_token().is_none());
        assert!(session.current_samm().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_error_redirects() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::new(storage.clone());
        session.login("tok").await.unwrap();

        let err = SammError::UnauthorizedToken("Invalid token".into());
        assert_eq!(session.handle_api_error(&err).await, Some(AuthRedirect::Authorization));
        assert!(session.access_token().is_none());
        assert_eq!(storage.get(keys::ACCESS_TOKEN).await.unwrap(), None);
        assert_eq!(storage.get(keys::IS_AUTHENTICATED).await.unwrap().as_deref(), Some("false"));

        session.set_is_safe_app(true);
        assert_eq!(session.handle_api_error(&err).await, Some(AuthRedirect::Home));
    }

    #[tokio::test]
    async fn test_other_errors_leave_session() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::new(storage);
        session.login("tok").await.unwrap();

        let err = SammError::BackendRequestFailed("boom".into());
        assert_eq!(session.handle_api_error(&err).await, None);
        assert_eq!(session.access_token(), Some("tok"));
    }
}
