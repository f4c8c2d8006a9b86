use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use super::{
    AuthError, Identity, IdentityProvider, Role, Session, SessionEvent, event_channel, publish,
    require_credentials,
};

const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

struct MemoryUser {
    uid: String,
    password_hash: String,
    role: Role,
}

struct MemorySession {
    id: String,
    email: String,
    expires_at: DateTime<Utc>,
}

/// Accounts and sessions held in process memory; tokens are opaque strings.
pub struct MemoryIdentityProvider {
    users: RwLock<HashMap<String, MemoryUser>>,
    sessions: RwLock<HashMap<String, MemorySession>>,
    hash_cost: u32,
    session_ttl: Duration,
    events: broadcast::Sender<SessionEvent>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::with_hash_cost(bcrypt::DEFAULT_COST)
    }

    /// Lower bcrypt cost keeps tests fast.
    pub fn with_hash_cost(hash_cost: u32) -> Self {
        MemoryIdentityProvider {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            hash_cost,
            session_ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
            events: event_channel(),
        }
    }

    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    /// Register a regular member account.
    pub async fn add_member(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let (email, password) = require_credentials(email, password)?;
        let password_hash = bcrypt::hash(password, self.hash_cost)?;
        self.users.write().await.insert(
            email.to_string(),
            MemoryUser {
                uid: Uuid::new_v4().to_string(),
                password_hash,
                role: Role::Member,
            },
        );
        Ok(())
    }

    async fn signed_out(&self, session: MemorySession) {
        let uid = self
            .identity_of(&session.email)
            .await
            .map(|i| i.uid)
            .unwrap_or_default();
        publish(
            &self.events,
            SessionEvent::SignedOut {
                session_id: session.id,
                uid,
            },
        );
    }

    async fn identity_of(&self, email: &str) -> Option<Identity> {
        let users = self.users.read().await;
        users.get(email).map(|u| Identity {
            uid: u.uid.clone(),
            email: email.to_string(),
            role: u.role,
        })
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let (email, password) = require_credentials(email, password)?;
        let identity = {
            let users = self.users.read().await;
            let user = users.get(email).ok_or(AuthError::InvalidCredentials)?;
            if !bcrypt::verify(password, &user.password_hash)? {
                return Err(AuthError::InvalidCredentials);
            }
            Identity {
                uid: user.uid.clone(),
                email: email.to_string(),
                role: user.role,
            }
        };

        let session_id = Uuid::new_v4().to_string();
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.write().await.insert(
            token.clone(),
            MemorySession {
                id: session_id.clone(),
                email: identity.email.clone(),
                expires_at: Utc::now() + self.session_ttl,
            },
        );

        publish(
            &self.events,
            SessionEvent::SignedIn {
                session_id: session_id.clone(),
                identity: identity.clone(),
            },
        );
        Ok(Session {
            id: session_id,
            token,
            identity,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(token)
            .ok_or(AuthError::InvalidSession)?;
        self.signed_out(session).await;
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let email = match self.sessions.read().await.get(token) {
            Some(session) if session.expires_at > Utc::now() => session.email.clone(),
            _ => return Ok(None),
        };
        Ok(self.identity_of(&email).await)
    }

    async fn provision_admin(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let (email, password) = require_credentials(email, password)?;
        let mut users = self.users.write().await;
        for (other, user) in users.iter_mut() {
            if other != email && user.role == Role::Admin {
                user.role = Role::Member;
            }
        }
        match users.get_mut(email) {
            Some(user) => user.role = Role::Admin,
            None => {
                let password_hash = bcrypt::hash(password, self.hash_cost)?;
                users.insert(
                    email.to_string(),
                    MemoryUser {
                        uid: Uuid::new_v4().to_string(),
                        password_hash,
                        role: Role::Admin,
                    },
                );
            }
        }
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, AuthError> {
        let now = Utc::now();
        let expired: Vec<MemorySession> = {
            let mut sessions = self.sessions.write().await;
            let tokens: Vec<String> = sessions
                .iter()
                .filter(|(_, s)| s.expires_at <= now)
                .map(|(token, _)| token.clone())
                .collect();
            tokens
                .iter()
                .filter_map(|token| sessions.remove(token))
                .collect()
        };

        let count = expired.len();
        for session in expired {
            self.signed_out(session).await;
        }
        Ok(count)
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
