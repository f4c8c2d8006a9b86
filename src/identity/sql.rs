use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use sqlx::MySqlPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{
    AuthError, Identity, IdentityProvider, Role, Session, SessionEvent, event_channel, publish,
    require_credentials,
};
use crate::auth;
use crate::models::user::{SessionUser, User};

/// Users and sessions in MySQL; tokens are HS256 JWTs naming a session row.
pub struct SqlIdentityProvider {
    pool: MySqlPool,
    jwt_secret: String,
    session_ttl: Duration,
    events: broadcast::Sender<SessionEvent>,
}

impl SqlIdentityProvider {
    pub fn new(pool: MySqlPool, jwt_secret: impl Into<String>, session_ttl: Duration) -> Self {
        SqlIdentityProvider {
            pool,
            jwt_secret: jwt_secret.into(),
            session_ttl,
            events: event_channel(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SqlIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let (email, password) = require_credentials(email, password)?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, role, created_at FROM users WHERE email = ? LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        if !verify(password, &user.password)? {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity {
            uid: user.id,
            email: user.email,
            role: user.role.parse()?,
        };

        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        sqlx::query("INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&session_id)
            .bind(&identity.uid)
            .bind(now.naive_utc())
            .bind(expires_at.naive_utc())
            .execute(&self.pool)
            .await?;

        let token = auth::generate_jwt(&self.jwt_secret, &session_id, &identity, expires_at)?;
        log::info!("{} signed in (session {})", identity.email, session_id);

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
        let claims =
            auth::verify_jwt(&self.jwt_secret, token).map_err(|_| AuthError::InvalidSession)?;

        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(&claims.sid)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            log::info!("{} signed out (session {})", claims.sub, claims.sid);
            publish(
                &self.events,
                SessionEvent::SignedOut {
                    session_id: claims.sid,
                    uid: claims.uid,
                },
            );
        }
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let claims = match auth::verify_jwt(&self.jwt_secret, token) {
            Ok(claims) => claims,
            Err(e) => {
                log::debug!("rejecting token: {}", e);
                return Ok(None);
            }
        };

        let user = sqlx::query_as::<_, SessionUser>(
            r#"
            SELECT u.id, u.email, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = ? AND s.expires_at > ?
            "#,
        )
        .bind(&claims.sid)
        .bind(Utc::now().naive_utc())
        .fetch_optional(&self.pool)
        .await?;

        user.map(|u| {
            Ok(Identity {
                uid: u.id,
                email: u.email,
                role: u.role.parse()?,
            })
        })
        .transpose()
    }

    async fn provision_admin(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let (email, password) = require_credentials(email, password)?;
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;

        match existing {
            Some(id) => {
                sqlx::query("UPDATE users SET role = ? WHERE id = ?")
                    .bind(Role::Admin.as_str())
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {
                let hashed = hash(password, DEFAULT_COST)?;
                sqlx::query("INSERT INTO users (id, email, password, role) VALUES (?, ?, ?, ?)")
                    .bind(Uuid::new_v4().to_string())
                    .bind(email)
                    .bind(hashed)
                    .bind(Role::Admin.as_str())
                    .execute(&mut *tx)
                    .await?;
                log::info!("created admin account {}", email);
            }
        }

        let demoted = sqlx::query("UPDATE users SET role = ? WHERE role = ? AND email <> ?")
            .bind(Role::Member.as_str())
            .bind(Role::Admin.as_str())
            .bind(email)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if demoted > 0 {
            log::warn!("demoted {} account(s) that were no longer the configured admin", demoted);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, AuthError> {
        let expired: Vec<(String, String)> =
            sqlx::query_as("SELECT id, user_id FROM sessions WHERE expires_at <= ?")
                .bind(Utc::now().naive_utc())
                .fetch_all(&self.pool)
                .await?;

        let mut removed = 0;
        for (session_id, uid) in expired {
            let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(&session_id)
                .execute(&self.pool)
                .await?;
            // a concurrent sign-out may have removed it already
            if result.rows_affected() > 0 {
                removed += 1;
                publish(&self.events, SessionEvent::SignedOut { session_id, uid });
            }
        }

        if removed > 0 {
            log::info!("purged {} expired session(s)", removed);
        }
        Ok(removed)
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
