//! Email/password identity provider boundary.
//!
//! A provider signs users in, revokes sessions, resolves bearer tokens back to
//! an [`Identity`] and broadcasts [`SessionEvent`]s to whoever subscribed via
//! [`IdentityProvider::on_session_change`]. Dropping the receiver unsubscribes.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

mod memory;
mod sql;

pub use memory::MemoryIdentityProvider;
pub use sql::SqlIdentityProvider;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token: String,
    pub identity: Identity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn { session_id: String, identity: Identity },
    SignedOut { session_id: String, uid: String },
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email dan password wajib diisi")]
    MissingCredentials,

    #[error("Email atau password salah")]
    InvalidCredentials,

    #[error("Sesi tidak valid atau sudah berakhir")]
    InvalidSession,

    #[error("unknown role {0}")]
    UnknownRole(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuthError {
    /// Failures of the provider itself rather than of the caller's credentials.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::UnknownRole(_) | AuthError::Hash(_) | AuthError::Database(_)
        )
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// `Ok(None)` for unknown, expired or revoked tokens.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AuthError>;

    /// Make `email` the only admin account, creating it with `password` when
    /// it does not exist yet.
    async fn provision_admin(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Drop sessions past their expiry and publish `SignedOut` for each one.
    /// Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, AuthError>;

    fn on_session_change(&self) -> broadcast::Receiver<SessionEvent>;
}

fn event_channel() -> broadcast::Sender<SessionEvent> {
    broadcast::channel(EVENT_CAPACITY).0
}

fn publish(events: &broadcast::Sender<SessionEvent>, event: SessionEvent) {
    // Nobody listening is fine.
    let _ = events.send(event);
}

fn require_credentials<'a>(email: &'a str, password: &'a str) -> Result<(&'a str, &'a str), AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok((email, password))
}
