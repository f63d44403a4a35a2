use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{info, warn};
use serde::Serialize;

use super::{AppState, ModelState, ALLOWED_EXTENSIONS};
use crate::classifier::{decode_image, Classification};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    pub success: bool,
    pub result: Classification,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

/// Failure classes of the classify endpoint, each mapped to the HTTP
/// status the original service used.
#[derive(Debug)]
pub enum ApiError {
    /// The model failed to load at startup; terminal for the process.
    ModelUnavailable,
    /// Malformed or invalid upload.
    Validation(String),
    /// Payload over the configured maximum, caught at the transport layer.
    PayloadTooLarge(usize),
    /// Unexpected decode or inference failure.
    Processing(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> String {
        match self {
            Self::ModelUnavailable => "Model not loaded".to_string(),
            Self::Validation(msg) => msg,
            Self::PayloadTooLarge(max_mb) => format!("File too large. Max {}MB", max_mb),
            Self::Processing(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            success: false,
            error: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

/// GET /api/health - Liveness plus the model-load outcome.
///
/// Always 200; a degraded model surfaces through `model_loaded`, never
/// through the status code.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        model_loaded: state.model.is_loaded(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// POST /api/classify - Classify one uploaded image.
///
/// Multipart form with an `image` file field. Rejections, in order: model
/// unavailable (500), missing field (400), empty filename (400), extension
/// outside the allow-list (400), payload over the limit (413). Decode and
/// inference failures surface as 500 with the raw error message.
pub async fn classify(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let model = match state.model.as_ref() {
        ModelState::Ready(model) => model,
        ModelState::Failed(reason) => {
            warn!("Classify rejected, model unavailable: {}", reason);
            return Err(ApiError::ModelUnavailable);
        }
    };

    let max_upload_mb = state.config.max_upload_mb;
    let (filename, bytes) = read_image_field(multipart, max_upload_mb).await?;
    validate_filename(&filename)?;

    let image = decode_image(&bytes).map_err(|e| ApiError::Processing(e.to_string()))?;
    let raw_scores = model
        .class_scores(&image)
        .map_err(|e| ApiError::Processing(e.to_string()))?;
    let result = Classification::from_scores(&raw_scores, &state.labels)
        .map_err(|e| ApiError::Processing(e.to_string()))?;

    info!(
        "Classified '{}' as {} ({}, {:.2}%)",
        filename, result.predicted_class, result.waste_type, result.confidence
    );

    Ok(Json(ClassifyResponse {
        success: true,
        result,
    }))
}

/// Pulls the `image` field out of the form. Multipart read failures carry
/// the transport's status: the body-limit rejection keeps its 413, anything
/// else is a malformed request.
async fn read_image_field(
    mut multipart: Multipart,
    max_upload_mb: usize,
) -> Result<(String, Vec<u8>), ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| map_multipart_error(e, max_upload_mb))?;
        let Some(field) = field else {
            return Err(ApiError::Validation("No image field in form-data".to_string()));
        };
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| map_multipart_error(e, max_upload_mb))?;
        return Ok((filename, bytes.to_vec()));
    }
}

fn map_multipart_error(err: MultipartError, max_upload_mb: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(max_upload_mb)
    } else {
        ApiError::Validation(err.body_text())
    }
}

fn validate_filename(filename: &str) -> Result<(), ApiError> {
    if filename.is_empty() {
        return Err(ApiError::Validation("No file selected".to_string()));
    }
    if !allowed_file(filename) {
        return Err(ApiError::Validation(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("photo.png"));
        assert!(allowed_file("photo.jpg"));
        assert!(allowed_file("photo.JPEG"));
        assert!(allowed_file("archive.tar.jpg"));
        assert!(!allowed_file("photo.gif"));
        assert!(!allowed_file("photo"));
        assert!(!allowed_file("photo.png.exe"));
    }

    #[test]
    fn test_validate_filename_messages() {
        let err = validate_filename("").unwrap_err();
        assert_eq!(err.message(), "No file selected");

        let err = validate_filename("clip.gif").unwrap_err();
        assert!(err.message().contains("png, jpg, jpeg"));

        assert!(validate_filename("bottle.jpeg").is_ok());
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::ModelUnavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge(16).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Processing("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_payload_too_large_message_names_limit() {
        assert_eq!(
            ApiError::PayloadTooLarge(16).message(),
            "File too large. Max 16MB"
        );
    }
}
