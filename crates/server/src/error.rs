use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nutriscan_core::NutrientError;
use nutriscan_ocr::{OcrError, PipelineError, PreprocessError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file selected")]
    NoFile,
    #[error("Unsupported file type '{0}'. Please select a valid image file.")]
    UnsupportedMedia(String),
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Invalid JSON body: {}", .0.body_text())]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Nutrients(#[from] NutrientError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFile => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Multipart(e) => e.status(),
            ApiError::Json(e) => e.status(),
            ApiError::Nutrients(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(e) => match e {
                PipelineError::Preprocess(PreprocessError::Load(_)) => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                PipelineError::Ocr(OcrError::ImageDecode(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                PipelineError::Ocr(OcrError::NotAvailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
                PipelineError::Ocr(OcrError::Engine(_)) => StatusCode::BAD_GATEWAY,
                PipelineError::Preprocess(PreprocessError::Encode(_))
                | PipelineError::Store(_)
                | PipelineError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show to the end user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Pipeline(PipelineError::Preprocess(PreprocessError::Load(_))) => {
                "Could not read the uploaded image. Please upload a PNG or JPEG photo.".to_string()
            }
            e if e.status().is_server_error() => {
                "Failed to analyze the image. Please try again.".to_string()
            }
            e => e.to_string(),
        }
    }

    pub(crate) fn log(&self) {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "Request failed");
        } else {
            tracing::info!(%status, error = %self, "Request rejected");
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(serde_json::json!({ "error": self.user_message() }));
        (self.status(), body).into_response()
    }
}
