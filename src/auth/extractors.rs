use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{
    error::AppError,
    i18n::{Lang, Msg},
    state::AppState,
    users::repo_types::User,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Access token from `Authorization: Bearer`, else from the cookie.
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Resolves a presented token to a live account.
pub async fn authenticate(state: &AppState, token: &str, lang: Lang) -> Result<User, AppError> {
    let claims = state.keys.verify(token).map_err(|e| {
        debug!(error = %e, "token rejected");
        AppError::localized(StatusCode::UNAUTHORIZED, Msg::InvalidToken, lang)
    })?;

    state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::localized(StatusCode::UNAUTHORIZED, Msg::SessionExpired, lang))
}

/// The authenticated account, loaded fresh for this request.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let lang = Lang::from_headers(&parts.headers);
        let token = presented_token(&parts.headers)
            .ok_or_else(|| AppError::localized(StatusCode::UNAUTHORIZED, Msg::NotLoggedIn, lang))?;
        authenticate(state, &token, lang).await.map(AuthUser)
    }
}

/// Like [`AuthUser`] but lets anonymous requests through. A token that is
/// presented must still be valid.
pub struct MaybeAuthUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let lang = Lang::from_headers(&parts.headers);
        match presented_token(&parts.headers) {
            Some(token) => authenticate(state, &token, lang).await.map(|u| MaybeAuthUser(Some(u))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}
