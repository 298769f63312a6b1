// middleware/mod.rs
pub mod rate_limit;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    db::{cache::CacheHelper, userdb::UserExt},
    error::{ErrorMessage, HttpError},
    models::usermodel::{Permission, User},
    utils::token,
    AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
    pub token: String,
}

/// Session token from the `token` cookie, else from `Authorization: Bearer`.
pub fn extract_token(cookie_jar: &CookieJar, req: &Request) -> Option<String> {
    cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_owned())
        })
        .filter(|token| !token.is_empty())
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = extract_token(&cookie_jar, &req)
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let claims = token::decode_token(token.as_str(), app_state.env.jwt_secret.as_bytes())?;

    if let Some(redis) = &app_state.db_client.redis_client {
        match CacheHelper::is_token_blacklisted(redis, &token).await {
            Ok(true) => {
                return Err(HttpError::unauthorized(
                    "Token has been revoked. Please login again.",
                ))
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Blacklist lookup failed, allowing token: {}", e),
        }
    }

    let user_id = uuid::Uuid::parse_str(&claims.sub)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    req.extensions_mut().insert(JWTAuthMiddeware { user, token });

    Ok(next.run(req).await)
}

/// Passes when the authenticated user holds any of `required`.
pub async fn role_check(
    req: Request,
    next: Next,
    required: Vec<Permission>,
) -> Result<impl IntoResponse, HttpError> {
    let auth = req
        .extensions()
        .get::<JWTAuthMiddeware>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if !required.iter().any(|permission| auth.user.has(*permission)) {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::HeaderValue};

    use super::*;

    #[test]
    fn test_extract_token_prefers_cookie() {
        let mut req = Request::new(Body::empty());
        req.headers_mut()
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        let jar = CookieJar::new();
        assert_eq!(extract_token(&jar, &req).as_deref(), Some("from-header"));

        let jar = CookieJar::new().add(axum_extra::extract::cookie::Cookie::new("token", "from-cookie"));
        assert_eq!(extract_token(&jar, &req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_extract_token_ignores_other_schemes() {
        let mut req = Request::new(Body::empty());
        req.headers_mut()
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&CookieJar::new(), &req), None);
    }
}
