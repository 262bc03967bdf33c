use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
            ResetPasswordRequest,
        },
        extractors::{AuthUser, ACCESS_TOKEN_COOKIE},
        services,
    },
    error::AppError,
    i18n::{Lang, Msg},
    state::AppState,
    validation::ValidatedJson,
};

pub const LOGGED_IN_COOKIE: &str = "logged_in";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/verifyemail/:verification_code", get(verify_email))
        .route("/auth/forgotpassword", post(forgot_password))
        .route("/auth/resetpassword/:reset_token", patch(reset_password))
}

/// Sets the access token cookie and its script-readable `logged_in` twin.
fn with_session(jar: CookieJar, state: &AppState, token: String) -> CookieJar {
    let max_age = time::Duration::seconds(state.keys.access_ttl.as_secs() as i64);
    let secure = state.config.production;

    let access = Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .secure(secure);
    let logged_in = Cookie::build((LOGGED_IN_COOKIE, "true"))
        .http_only(false)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .secure(secure);

    jar.add(access).add(logged_in)
}

/// Expires both session cookies whether or not the request carried them.
fn without_session(jar: CookieJar) -> CookieJar {
    let expired = |name: &'static str| {
        Cookie::build((name, ""))
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::ZERO)
    };
    jar.add(expired(ACCESS_TOKEN_COOKIE).http_only(true))
        .add(expired(LOGGED_IN_COOKIE))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    lang: Lang,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    services::register(&state, input, lang).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::success(Msg::VerificationEmailSent.text(lang))),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    lang: Lang,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let token = services::login(&state, input, lang).await?;
    let jar = with_session(jar, &state, token.clone());
    Ok((
        jar,
        Json(LoginResponse {
            status: "success",
            access_token: token,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn logout(AuthUser(user): AuthUser, jar: CookieJar) -> (CookieJar, Json<Value>) {
    info!(user_id = %user.id, "user logged out");
    (without_session(jar), Json(json!({ "status": "success" })))
}

#[instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    lang: Lang,
    Path(verification_code): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    services::verify_email(&state, &verification_code, lang).await?;
    Ok(Json(MessageResponse::success(Msg::EmailVerified.text(lang))))
}

#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    lang: Lang,
    ValidatedJson(email): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::forgot_password(&state, &email, lang).await?;
    Ok(Json(MessageResponse::success(Msg::ResetLinkSent.text(lang))))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    lang: Lang,
    jar: CookieJar,
    Path(reset_token): Path<String>,
    ValidatedJson(password): ValidatedJson<ResetPasswordRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    services::reset_password(&state, &reset_token, &password, lang).await?;
    Ok((
        without_session(jar),
        Json(MessageResponse::success(Msg::PasswordResetDone.text(lang))),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header::SET_COOKIE, HeaderMap},
        response::IntoResponse,
    };

    fn set_cookies(jar: CookieJar) -> Vec<String> {
        jar.into_response()
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn clearing_a_session_without_incoming_cookies() {
        let cookies = set_cookies(without_session(CookieJar::from_headers(&HeaderMap::new())));
        assert_eq!(cookies.len(), 2);
        for name in ["access_token=", "logged_in="] {
            let c = cookies.iter().find(|c| c.starts_with(name)).unwrap();
            assert!(c.contains("Max-Age=0"), "{c}");
            assert!(c.contains("Path=/"), "{c}");
        }
    }

    #[test]
    fn clearing_a_session_overrides_incoming_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", "access_token=abc; logged_in=true".parse().unwrap());
        let cookies = set_cookies(without_session(CookieJar::from_headers(&headers)));
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert!(cookies.iter().all(|c| !c.contains("abc")));
    }
}
