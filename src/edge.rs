//! Gate in front of the page directory: every page URL carries a locale
//! prefix, and `/{locale}/user` pages need a signed-in visitor.

use axum::{
    extract::{Request, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{
    auth::{extractors::ACCESS_TOKEN_COOKIE, jwt::JwtKeys},
    i18n::{best_match, Lang},
};

pub const LANG_COOKIE: &str = "lang";
const DEFAULT_ACCEPT_LANGUAGE: &str = "fr-FR,en;q=0.5";
const SIGNED_OUT_TARGET: &str = "/home";

#[derive(Debug, PartialEq, Eq)]
pub enum Gate {
    Pass,
    Redirect(String),
}

fn is_exempt(path: &str) -> bool {
    path == "/favicon.ico"
        || path.starts_with("/assets/")
        || path.starts_with("/uploads/")
        || path == "/api"
        || path.starts_with("/api/")
}

fn locale_prefix(path: &str) -> Option<Lang> {
    let first = path.trim_start_matches('/').split('/').next()?;
    Lang::SUPPORTED.into_iter().find(|l| l.as_str() == first)
}

fn is_user_page(path: &str) -> bool {
    Lang::SUPPORTED
        .iter()
        .any(|l| path.starts_with(&format!("/{}/user", l.as_str())))
}

/// Cookie choice first, then the browser's languages.
fn preferred_locale(headers: &HeaderMap, jar: &CookieJar) -> Lang {
    if let Some(lang) = jar
        .get(LANG_COOKIE)
        .and_then(|c| Lang::SUPPORTED.into_iter().find(|l| l.as_str() == c.value()))
    {
        return lang;
    }
    let accept = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_ACCEPT_LANGUAGE);
    best_match(accept).unwrap_or_default()
}

pub fn decide(path: &str, query: Option<&str>, headers: &HeaderMap, keys: &JwtKeys) -> Gate {
    if is_exempt(path) {
        return Gate::Pass;
    }

    let jar = CookieJar::from_headers(headers);

    if is_user_page(path) {
        let signed_in = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| keys.verify(c.value()).is_ok())
            .unwrap_or(false);
        return if signed_in {
            Gate::Pass
        } else {
            Gate::Redirect(SIGNED_OUT_TARGET.to_string())
        };
    }

    if locale_prefix(path).is_some() {
        return Gate::Pass;
    }

    let locale = preferred_locale(headers, &jar);
    let target = match query {
        Some(q) => format!("/{}{path}?{q}", locale.as_str()),
        None => format!("/{}{path}", locale.as_str()),
    };
    Gate::Redirect(target)
}

pub async fn locale_gate(State(keys): State<JwtKeys>, req: Request, next: Next) -> Response {
    match decide(req.uri().path(), req.uri().query(), req.headers(), &keys) {
        Gate::Pass => next.run(req).await,
        Gate::Redirect(target) => {
            debug!(from = %req.uri(), to = %target, "edge redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_keys::{forged_token, keys};
    use axum::{
        body::Body,
        http::{header::COOKIE, HeaderValue, Request, StatusCode},
        middleware::from_fn_with_state,
        Router,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (name, value) in pairs {
            h.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        h
    }

    fn redirect(to: &str) -> Gate {
        Gate::Redirect(to.to_string())
    }

    #[test]
    fn unprefixed_paths_get_a_locale() {
        let keys = keys();
        let none = HeaderMap::new();
        assert_eq!(decide("/home", None, &none, &keys), redirect("/fr/home"));
        assert_eq!(decide("/", None, &none, &keys), redirect("/fr/"));
        assert_eq!(
            decide("/search", Some("q=cup&page=2"), &none, &keys),
            redirect("/fr/search?q=cup&page=2")
        );
    }

    #[test]
    fn cookie_then_accept_language_pick_the_locale() {
        let keys = keys();
        let english = headers(&[(ACCEPT_LANGUAGE, "en-US,en;q=0.9")]);
        assert_eq!(decide("/home", None, &english, &keys), redirect("/en/home"));

        let both = headers(&[(ACCEPT_LANGUAGE, "en-US"), (COOKIE, "lang=fr")]);
        assert_eq!(decide("/home", None, &both, &keys), redirect("/fr/home"));

        let bogus_cookie = headers(&[(ACCEPT_LANGUAGE, "en"), (COOKIE, "lang=de")]);
        assert_eq!(decide("/home", None, &bogus_cookie, &keys), redirect("/en/home"));

        let unsupported = headers(&[(ACCEPT_LANGUAGE, "de-DE")]);
        assert_eq!(decide("/home", None, &unsupported, &keys), redirect("/fr/home"));
    }

    #[test]
    fn prefixed_and_exempt_paths_pass() {
        let keys = keys();
        let none = HeaderMap::new();
        for path in [
            "/fr", "/en/", "/fr/home", "/favicon.ico", "/assets/app.js", "/uploads/1-a.png", "/api",
            "/api/users/me",
        ] {
            assert_eq!(decide(path, None, &none, &keys), Gate::Pass, "{path}");
        }
        assert_eq!(decide("/french", None, &none, &keys), redirect("/fr/french"));
    }

    #[test]
    fn user_pages_need_a_valid_token_cookie() {
        let keys = keys();
        let token = keys.sign_access(Uuid::new_v4()).unwrap();
        let signed_in = headers(&[(COOKIE, format!("access_token={token}").as_str())]);
        assert_eq!(decide("/en/user/profile", None, &signed_in, &keys), Gate::Pass);

        let none = HeaderMap::new();
        assert_eq!(decide("/fr/user", None, &none, &keys), redirect("/home"));

        let forged_cookie = format!("access_token={}", forged_token(Uuid::new_v4()));
        let forged = headers(&[(COOKIE, forged_cookie.as_str())]);
        assert_eq!(decide("/fr/user", None, &forged, &keys), redirect("/home"));
    }

    #[tokio::test]
    async fn middleware_redirects_with_307() {
        let app = Router::new()
            .fallback(|| async { "page" })
            .layer(from_fn_with_state(keys(), locale_gate));

        let res = app
            .clone()
            .oneshot(Request::builder().uri("/about").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()["location"], "/fr/about");

        let res = app
            .oneshot(Request::builder().uri("/fr/about").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
