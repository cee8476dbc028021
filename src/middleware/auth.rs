use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use std::convert::Infallible;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::db::Session;
use crate::db::models::{AuthRecord, UserProfile};
use crate::error::{GatewayError, GatewayResult};
use crate::query::QuerySpec;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const AUTH_CODE_HEADER: &str = "x-auth-code";

/// Identifier + secret presented by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    pub auth_code: String,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        };
        Some(Self {
            user_id: header(USER_ID_HEADER)?,
            auth_code: header(AUTH_CODE_HEADER)?,
        })
    }
}

/// Credentials carried by the request, if any. Whether they are required is
/// decided per method.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<Credentials>);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Credentials::from_headers(&parts.headers)))
    }
}

impl Caller {
    pub fn credentials(&self) -> GatewayResult<&Credentials> {
        self.0.as_ref().ok_or(GatewayError::AuthenticationFailure)
    }
}

/// Check `auth_code` against the stored credential of `user_id`.
///
/// With `require_admin`, the user's profile must also carry a positive
/// administrator flag. Returns the profile when it was read.
pub async fn require_auth(
    session: &mut Session,
    tables: &GatewayConfig,
    user_id: &str,
    auth_code: &str,
    require_admin: bool,
) -> GatewayResult<Option<UserProfile>> {
    let stored: Option<AuthRecord> = session
        .get_one_as(&QuerySpec::new(&tables.credentials_table).filter("code", "eq", user_id))
        .await?;

    let Some(stored) = stored else {
        debug!(user_id, "no credential record");
        return Err(GatewayError::AuthenticationFailure);
    };

    if !bool::from(stored.auth.as_bytes().ct_eq(auth_code.as_bytes())) {
        debug!(user_id, "credential mismatch");
        return Err(GatewayError::AuthenticationFailure);
    }

    if !require_admin {
        return Ok(None);
    }

    let profile: Option<UserProfile> = session
        .get_one_as(&QuerySpec::new(&tables.profiles_table).filter("code", "eq", user_id))
        .await?;
    match profile {
        Some(profile) if profile.is_admin() => Ok(Some(profile)),
        _ => {
            debug!(user_id, "administrator flag not set");
            Err(GatewayError::InvalidUserGroup)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::storage::memory_pool;
    use axum::http::HeaderValue;

    async fn session() -> Session {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO auths (code, auth) VALUES ('u1', 'secret'), ('u2', 'hunter2')")
            .execute(&pool)
            .await
            .expect("seed auths");
        sqlx::query("INSERT INTO users (code, name, administrator) VALUES ('u1', 'ali', 0), ('u2', 'sara', 1)")
            .execute(&pool)
            .await
            .expect("seed users");
        Session::begin(&pool, None).await.expect("session")
    }

    #[tokio::test]
    async fn unknown_user_fails_authentication() {
        let mut s = session().await;
        let err = require_auth(&mut s, &GatewayConfig::default(), "u9", "secret", false)
            .await
            .expect_err("no record");
        assert!(matches!(err, GatewayError::AuthenticationFailure));
    }

    #[tokio::test]
    async fn wrong_code_fails_authentication() {
        let mut s = session().await;
        let err = require_auth(&mut s, &GatewayConfig::default(), "u1", "Secret", false)
            .await
            .expect_err("mismatch");
        assert!(matches!(err, GatewayError::AuthenticationFailure));
    }

    #[tokio::test]
    async fn exact_match_passes() {
        let mut s = session().await;
        let res = require_auth(&mut s, &GatewayConfig::default(), "u1", "secret", false).await;
        assert!(matches!(res, Ok(None)));
    }

    #[tokio::test]
    async fn admin_methods_need_the_administrator_flag() {
        let mut s = session().await;
        let cfg = GatewayConfig::default();
        let err = require_auth(&mut s, &cfg, "u1", "secret", true)
            .await
            .expect_err("not an admin");
        assert!(matches!(err, GatewayError::InvalidUserGroup));

        let profile = require_auth(&mut s, &cfg, "u2", "hunter2", true)
            .await
            .expect("admin")
            .expect("profile read");
        assert_eq!(profile.code, "u2");
    }

    #[tokio::test]
    async fn admin_check_without_profile_is_invalid_group() {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO auths (code, auth) VALUES ('u5', 'pw')")
            .execute(&pool)
            .await
            .expect("seed auths");
        let mut s = Session::begin(&pool, None).await.expect("session");
        let err = require_auth(&mut s, &GatewayConfig::default(), "u5", "pw", true)
            .await
            .expect_err("no profile");
        assert!(matches!(err, GatewayError::InvalidUserGroup));
    }

    #[test]
    fn credentials_need_both_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));
        assert!(Credentials::from_headers(&headers).is_none());

        headers.insert(AUTH_CODE_HEADER, HeaderValue::from_static(" secret "));
        let creds = Credentials::from_headers(&headers).expect("both headers");
        assert_eq!(creds.user_id, "u1");
        assert_eq!(creds.auth_code, "secret");
    }
}
