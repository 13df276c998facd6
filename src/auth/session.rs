//! Cookie-backed sessions. Login signs a short JWT and stores it in an
//! HttpOnly cookie; the [`SessionUser`] extractor validates it on every
//! protected route and bounces anonymous requests to the login page.

use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::render::found;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            ttl_minutes,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
        }
    }
}

impl SessionKeys {
    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        debug!(user_id = %data.claims.sub, "session verified");
        Ok(data.claims)
    }
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Drops the session cookie from the jar, ending the session.
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
}

/// Rejection for anonymous access to a protected route: a 302 to the login
/// page carrying the originally requested path in `next`.
pub struct LoginRedirect(pub String);

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        found(&format!("/users/login/?next={}", self.0))
    }
}

/// The authenticated user's id, extracted from the session cookie.
pub struct SessionUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let next = parts.uri.path().to_string();
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return Err(LoginRedirect(next)),
        };

        let keys = SessionKeys::from_ref(state);
        match keys.verify(&token) {
            Ok(claims) => Ok(SessionUser(claims.sub)),
            Err(_) => {
                warn!("invalid or expired session token");
                Err(LoginRedirect(next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn make_keys() -> SessionKeys {
        let state = AppState::fake();
        SessionKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign session");
        let claims = keys.verify(&token).expect("verify session");
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(keys.verify("not-a-token").is_err());
    }

    #[tokio::test]
    async fn verify_rejects_foreign_secret() {
        let keys = make_keys();
        let token = keys.sign(Uuid::new_v4()).expect("sign session");
        let other = SessionKeys {
            encoding: EncodingKey::from_secret(b"other"),
            decoding: DecodingKey::from_secret(b"other"),
            ttl: Duration::from_secs(60),
        };
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn login_redirect_preserves_next() {
        let response = LoginRedirect("/blogs/create/".into()).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .unwrap();
        assert_eq!(location, "/users/login/?next=/blogs/create/");
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("token".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
    }
}
