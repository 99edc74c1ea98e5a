// Auth service - Verifies bearer tokens and keeps the signed-in sessions
use crate::application::error::ServiceError;
use crate::application::monitor_repository::{IdentityProvider, InstrumentRepository};
use crate::domain::session::{Permissions, Session};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct CachedSession {
    session: Session,
    expires_at: Instant,
}

/// Sessions keyed by bearer token. Written at sign-in and sign-out, read on
/// every protected request. Entries live for `ttl`, after which the token
/// has to be verified again.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, CachedSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        let now = Instant::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(cached) if cached.expires_at > now => return Some(cached.session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.get(token).is_some_and(|c| c.expires_at <= now) {
            sessions.remove(token);
            tracing::debug!("Session cache entry expired");
        }
        None
    }

    /// Cache a session, sweeping out every expired entry first.
    pub async fn insert(&self, token: &str, session: Session) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, cached| cached.expires_at > now);
        sessions.insert(
            token.to_string(),
            CachedSession {
                session,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.write().await.remove(token).map(|c| c.session)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    repository: Arc<dyn InstrumentRepository>,
    sessions: SessionStore,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        repository: Arc<dyn InstrumentRepository>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            identity,
            repository,
            sessions: SessionStore::new(session_ttl),
        }
    }

    /// Return the session for a token. A cached session is used until it
    /// expires; otherwise the token is verified with the identity provider and
    /// the permissions reloaded.
    pub async fn check(&self, token: &str) -> Result<Session, ServiceError> {
        if let Some(session) = self.sessions.get(token).await {
            tracing::trace!("Session cache hit for user {}", session.user.id);
            return Ok(session);
        }

        let user = self
            .identity
            .user_for_token(token)
            .await?
            .ok_or(ServiceError::Unauthorized)?;

        let grants = self.repository.permission_grants(&user.id).await?;
        let session = Session {
            permissions: Permissions::from_grants(&grants),
            user,
        };

        tracing::info!("Session established for user {}", session.user.id);
        self.sessions.insert(token, session.clone()).await;
        Ok(session)
    }

    /// Forget the session; returns whether one existed.
    pub async fn sign_out(&self, token: &str) -> bool {
        match self.sessions.remove(token).await {
            Some(session) => {
                tracing::info!("Session closed for user {}", session.user.id);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fakes::{grant, FakeIdentity, FakeRepository};

    fn service_with_ttl(identity: Arc<FakeIdentity>, ttl: Duration) -> AuthService {
        let repository = FakeRepository {
            grants: vec![grant("alice", 1), grant("alice", 4), grant("bob", 2)],
            ..Default::default()
        };
        AuthService::new(identity, Arc::new(repository), ttl)
    }

    fn service(identity: Arc<FakeIdentity>) -> AuthService {
        service_with_ttl(identity, DEFAULT_SESSION_TTL)
    }

    #[tokio::test]
    async fn test_check_loads_permissions_once() {
        let identity = Arc::new(FakeIdentity::default().with_user("tok-a", "alice"));
        let auth = service(identity.clone());

        let session = auth.check("tok-a").await.unwrap();
        assert_eq!(session.user.id, "alice");
        assert_eq!(session.permissions.project_ids, vec![1, 4]);

        auth.check("tok-a").await.unwrap();
        assert_eq!(identity.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let auth = service(Arc::new(FakeIdentity::default()));
        assert!(matches!(auth.check("nope").await, Err(ServiceError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_sign_out_invalidates() {
        let identity = Arc::new(FakeIdentity::default().with_user("tok-a", "alice"));
        let auth = service(identity.clone());

        auth.check("tok-a").await.unwrap();
        assert!(auth.sign_out("tok-a").await);
        assert!(!auth.sign_out("tok-a").await);

        auth.check("tok-a").await.unwrap();
        assert_eq!(identity.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_revoked_token_rejected_once_session_expires() {
        let identity = Arc::new(FakeIdentity::default().with_user("tok-a", "alice"));
        let auth = service_with_ttl(identity.clone(), Duration::from_millis(200));

        auth.check("tok-a").await.unwrap();
        identity.revoke("tok-a");

        // Still cached
        assert!(auth.check("tok-a").await.is_ok());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(matches!(auth.check("tok-a").await, Err(ServiceError::Unauthorized)));
        assert_eq!(identity.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_evicted() {
        let identity = Arc::new(
            FakeIdentity::default()
                .with_user("tok-a", "alice")
                .with_user("tok-b", "bob"),
        );
        let auth = service_with_ttl(identity.clone(), Duration::ZERO);

        auth.check("tok-a").await.unwrap();
        auth.check("tok-b").await.unwrap();
        assert_eq!(auth.sessions.len().await, 1);

        // A zero TTL means every check goes back to the provider
        identity.revoke("tok-b");
        assert!(auth.check("tok-b").await.is_err());
        assert_eq!(auth.sessions.len().await, 0);
    }
}
