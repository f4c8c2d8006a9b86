//! Session and authorization state.
//!
//! [`SessionContext`] is the per-request view of who is signed in; it is
//! extracted from the `access_token` cookie and handed to controllers
//! explicitly. [`SessionObserver`] is the single process-wide subscription to
//! provider session events, started at boot and stopped at shutdown. It also
//! sweeps expired sessions so they are counted as signed out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::auth;
use crate::error::AppError;
use crate::identity::{Identity, IdentityProvider, Session, SessionEvent};

/// Result shape of login/logout: failures carry a readable message instead of
/// an error value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn ok() -> Self {
        AuthOutcome {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        AuthOutcome {
            success: false,
            error: Some(if message.is_empty() {
                "Login gagal".to_string()
            } else {
                message
            }),
        }
    }
}

pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    session: Option<Session>,
}

impl SessionContext {
    pub fn anonymous(provider: Arc<dyn IdentityProvider>) -> Self {
        SessionContext {
            provider,
            session: None,
        }
    }

    /// Resolve a bearer token; unknown or failing tokens give an anonymous context.
    pub async fn restore(provider: Arc<dyn IdentityProvider>, token: Option<String>) -> Self {
        let Some(token) = token else {
            return Self::anonymous(provider);
        };
        let session = match provider.resolve(&token).await {
            Ok(Some(identity)) => Some(Session {
                id: String::new(),
                token,
                identity,
            }),
            Ok(None) => None,
            Err(e) => {
                log::warn!("could not resolve session token: {}", e);
                None
            }
        };
        SessionContext { provider, session }
    }

    pub fn current(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.current().is_some_and(Identity::is_admin)
    }

    pub fn require_admin(&self) -> Result<&Identity, AppError> {
        match self.current() {
            None => Err(AppError::Unauthorized),
            Some(identity) if identity.is_admin() => Ok(identity),
            Some(_) => Err(AppError::Forbidden),
        }
    }

    /// On failure the current session, if any, is left as it was.
    pub async fn login(&mut self, email: &str, password: &str) -> AuthOutcome {
        match self.provider.sign_in(email, password).await {
            Ok(session) => {
                self.session = Some(session);
                AuthOutcome::ok()
            }
            Err(e) => {
                if e.is_internal() {
                    log::error!("login for {} failed: {}", email.trim(), e);
                } else {
                    log::info!("login rejected for {}: {}", email.trim(), e);
                }
                AuthOutcome::failed(e.to_string())
            }
        }
    }

    pub async fn logout(&mut self) -> AuthOutcome {
        let Some(token) = self.token().map(str::to_string) else {
            return AuthOutcome::ok();
        };
        match self.provider.sign_out(&token).await {
            Ok(()) => {
                self.session = None;
                AuthOutcome::ok()
            }
            Err(e) => {
                log::warn!("logout failed: {}", e);
                AuthOutcome::failed(e.to_string())
            }
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let provider = req
            .app_data::<web::Data<dyn IdentityProvider>>()
            .map(|data| data.clone().into_inner());
        let token = auth::token_from_request(req);

        Box::pin(async move {
            let provider = provider.ok_or_else(|| {
                log::error!("identity provider is not registered as app data");
                actix_web::error::ErrorInternalServerError("Layanan autentikasi tidak tersedia")
            })?;
            Ok(SessionContext::restore(provider, token).await)
        })
    }
}

pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Process-wide subscriber to session events.
pub struct SessionObserver {
    active: Arc<AtomicUsize>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionObserver {
    /// Subscribe once and purge expired sessions every `sweep_every`.
    /// Must be called from within a tokio runtime.
    pub fn start(provider: Arc<dyn IdentityProvider>, sweep_every: Duration) -> Self {
        let mut events = provider.on_session_change();
        let active = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&active);

        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SignedIn { identity, .. }) => {
                        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        log::info!("session opened for {} ({} active)", identity.email, now);
                    }
                    Ok(SessionEvent::SignedOut { uid, .. }) => {
                        let _ = counter
                            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
                        log::info!(
                            "session closed for {} ({} active)",
                            uid,
                            counter.load(Ordering::SeqCst)
                        );
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("session observer skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_every.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = provider.purge_expired().await {
                    log::warn!("expired session sweep failed: {}", e);
                }
            }
        });

        SessionObserver {
            active,
            tasks: Mutex::new(vec![listener, sweeper]),
        }
    }

    /// Sessions opened minus sessions closed since the observer started.
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Unsubscribe and stop sweeping. Idempotent.
    pub fn stop(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            if tasks.is_empty() {
                return;
            }
            for task in tasks.drain(..) {
                task.abort();
            }
            log::info!("session observer stopped");
        }
    }
}

impl Drop for SessionObserver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityProvider;

    async fn provider() -> Arc<MemoryIdentityProvider> {
        let provider = Arc::new(MemoryIdentityProvider::with_hash_cost(4));
        provider
            .provision_admin("admin@kaderbudaya.com", "rahasia123")
            .await
            .unwrap();
        provider.add_member("pengurus@kaderbudaya.com", "pengurus123").await.unwrap();
        provider
    }

    #[tokio::test]
    async fn failed_login_reports_error_and_keeps_session() {
        let provider = provider().await;
        let mut ctx = SessionContext::anonymous(provider.clone());

        let outcome = ctx.login("bad@x.com", "wrong").await;
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().is_some_and(|m| !m.is_empty()));
        assert!(ctx.current().is_none());

        assert_eq!(ctx.login("admin@kaderbudaya.com", "rahasia123").await, AuthOutcome::ok());
        let outcome = ctx.login("bad@x.com", "wrong").await;
        assert!(!outcome.success);
        assert_eq!(ctx.current().unwrap().email, "admin@kaderbudaya.com");
    }

    #[tokio::test]
    async fn admin_flag_follows_the_configured_account_only() {
        let provider = provider().await;

        let mut admin = SessionContext::anonymous(provider.clone());
        admin.login("admin@kaderbudaya.com", "rahasia123").await;
        assert!(admin.is_admin());
        assert!(admin.require_admin().is_ok());

        let mut member = SessionContext::anonymous(provider.clone());
        member.login("pengurus@kaderbudaya.com", "pengurus123").await;
        assert!(!member.is_admin());
        assert!(matches!(member.require_admin(), Err(AppError::Forbidden)));

        let nobody = SessionContext::anonymous(provider);
        assert!(!nobody.is_admin());
        assert!(matches!(nobody.require_admin(), Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn restore_and_logout() {
        let provider = provider().await;
        let mut ctx = SessionContext::anonymous(provider.clone());
        ctx.login("admin@kaderbudaya.com", "rahasia123").await;
        let token = ctx.token().unwrap().to_string();

        let mut restored = SessionContext::restore(provider.clone(), Some(token.clone())).await;
        assert!(restored.is_admin());
        assert_eq!(restored.logout().await, AuthOutcome::ok());
        assert!(restored.current().is_none());

        let stale = SessionContext::restore(provider, Some(token)).await;
        assert!(stale.current().is_none());
    }

    #[tokio::test]
    async fn observer_counts_sessions_until_stopped() {
        let provider = provider().await;
        let observer = SessionObserver::start(provider.clone(), SESSION_SWEEP_INTERVAL);

        let mut ctx = SessionContext::anonymous(provider.clone());
        ctx.login("admin@kaderbudaya.com", "rahasia123").await;
        for _ in 0..50 {
            if observer.active_sessions() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(observer.active_sessions(), 1);

        ctx.logout().await;
        for _ in 0..50 {
            if observer.active_sessions() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(observer.active_sessions(), 0);

        observer.stop();
        observer.stop();
    }

    async fn wait_for(observer: &SessionObserver, expected: usize) {
        for _ in 0..200 {
            if observer.active_sessions() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn expired_logins_drop_out_of_the_active_count() {
        let provider = Arc::new(
            MemoryIdentityProvider::with_hash_cost(4)
                .with_session_ttl(chrono::Duration::milliseconds(300)),
        );
        provider
            .provision_admin("admin@kaderbudaya.com", "rahasia123")
            .await
            .unwrap();
        let observer = SessionObserver::start(provider.clone(), Duration::from_millis(20));

        let mut ctx = SessionContext::anonymous(provider.clone());
        ctx.login("admin@kaderbudaya.com", "rahasia123").await;
        wait_for(&observer, 1).await;
        assert_eq!(observer.active_sessions(), 1);

        wait_for(&observer, 0).await;
        assert_eq!(observer.active_sessions(), 0);
        let token = ctx.token().map(str::to_string);
        assert!(SessionContext::restore(provider, token).await.current().is_none());

        observer.stop();
    }
}
