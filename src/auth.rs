use actix_web::HttpRequest;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

pub const ACCESS_COOKIE: &str = "access_token";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub sid: String,
    pub uid: String,
    pub role: String,
    pub exp: usize,
}

pub fn generate_jwt(
    secret: &str,
    session_id: &str,
    identity: &Identity,
    expires_at: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: identity.email.clone(),
        sid: session_id.to_string(),
        uid: identity.uid.clone(),
        role: identity.role.as_str().to_string(),
        exp: expires_at.timestamp().max(0) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_jwt(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}

pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    req.cookie(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(token: &str, ttl_days: i64) -> Cookie<'static> {
    Cookie::build(ACCESS_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(false) // false untuk development (HTTP)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(ttl_days))
        .finish()
}

// harus sama persis dengan cookie login
pub fn expired_cookie() -> Cookie<'static> {
    Cookie::build(ACCESS_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn admin() -> Identity {
        Identity {
            uid: "u1".into(),
            email: "admin@kaderbudaya.com".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn jwt_roundtrip_carries_session_id() {
        let expires = Utc::now() + chrono::Duration::days(1);
        let token = generate_jwt("rahasia", "s1", &admin(), expires).unwrap();
        let claims = verify_jwt("rahasia", &token).unwrap();
        assert_eq!(claims.sid, "s1");
        assert_eq!(claims.sub, "admin@kaderbudaya.com");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn jwt_rejects_wrong_secret_and_expired_tokens() {
        let expires = Utc::now() + chrono::Duration::days(1);
        let token = generate_jwt("rahasia", "s1", &admin(), expires).unwrap();
        assert!(verify_jwt("lain", &token).is_err());

        let expired = Utc::now() - chrono::Duration::days(1);
        let token = generate_jwt("rahasia", "s1", &admin(), expired).unwrap();
        assert!(verify_jwt("rahasia", &token).is_err());
    }
}
