use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::{FromRef, OriginalUri},
    http::{
        header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{auth, auth::jwt::JwtKeys, config::AppConfig, edge, error::AppError, state::AppState, uploads, users};

async fn welcome() -> Json<Value> {
    Json(json!({ "status": "success", "message": "Welcome to the Tournament API" }))
}

async fn api_not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::new(StatusCode::NOT_FOUND, format!("Route {} not found", uri.path()))
}

fn cors(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(&config.client_url).context("CLIENT_URL is not a valid origin")?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT, ACCEPT_LANGUAGE]))
}

pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let api = Router::new()
        .route("/", get(welcome))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(users::router())
        .merge(uploads::router())
        .fallback(api_not_found);

    let pages = Router::new()
        .fallback_service(ServeDir::new(&state.config.public_dir))
        .layer(from_fn_with_state(JwtKeys::from_ref(&state), edge::locale_gate));

    let cors = cors(&state.config)?;
    let upload_dir = state.config.upload_dir.clone();

    Ok(Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .merge(pages)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        ))
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("APP_HOST/APP_PORT do not form a socket address")?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
