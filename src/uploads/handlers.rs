use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bytes::BytesMut;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    error::AppError,
    i18n::{Lang, Msg},
    state::AppState,
    storage::sanitize_file_name,
};

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const FILE_FIELD: &str = "file";

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/uploads", post(upload))
        // Headroom for multipart framing; the file itself is capped below.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub data: UploadedFile,
}

fn too_large(lang: Lang) -> AppError {
    AppError::localized(StatusCode::BAD_REQUEST, Msg::FileTooLarge, lang)
}

fn failed(lang: Lang) -> AppError {
    AppError::localized(StatusCode::INTERNAL_SERVER_ERROR, Msg::UploadFailed, lang)
}

fn multipart_error(e: MultipartError, lang: Lang) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("upload over the body limit");
        too_large(lang)
    } else {
        error!(error = %e, "multipart read failed");
        failed(lang)
    }
}

/// POST /uploads (multipart, field `file`)
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    lang: Lang,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, lang))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, lang))? {
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                warn!(file = %original, "upload over 5MB");
                return Err(too_large(lang));
            }
            data.extend_from_slice(&chunk);
        }

        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let filename = format!("{millis}-{}", sanitize_file_name(&original));
        let size = data.len();
        state
            .storage
            .put_object(&filename, data.freeze())
            .await
            .map_err(|e| {
                error!(error = ?e, file = %filename, "storing upload failed");
                failed(lang)
            })?;

        info!(file = %filename, size, "file uploaded");
        let url = format!("{}/uploads/{}", state.config.server_url, filename);
        return Ok(Json(UploadResponse {
            status: "success",
            message: Msg::FileUploaded.text(lang),
            data: UploadedFile { filename, url },
        }));
    }

    Err(AppError::localized(
        StatusCode::BAD_REQUEST,
        Msg::NoFileUploaded,
        lang,
    ))
}
