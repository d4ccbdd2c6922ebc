use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

/// Reasons a contest submission is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Caption is {len} characters, maximum is {max}")]
    CaptionTooLong { len: usize, max: usize },

    #[error("Only video files are allowed, got {0}")]
    InvalidMediaType(String),

    #[error("Video file is {size} bytes, maximum is {max}")]
    FileTooLarge { size: u64, max: u64 },

    /// The request body hit the upload limit before the file was fully read
    #[error("Video file exceeds the maximum of {max} bytes")]
    UploadTooLarge { max: u64 },

    #[error("Video is {seconds:.1} seconds long, maximum is {max} seconds")]
    VideoTooLong { seconds: f64, max: u64 },

    #[error("Could not determine video duration")]
    UnknownDuration,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "MISSING_FIELD",
            ValidationError::UnknownLanguage(_) => "UNKNOWN_LANGUAGE",
            ValidationError::UnknownRegion(_) => "UNKNOWN_REGION",
            ValidationError::CaptionTooLong { .. } => "CAPTION_TOO_LONG",
            ValidationError::InvalidMediaType(_) => "INVALID_MEDIA_TYPE",
            ValidationError::FileTooLarge { .. } | ValidationError::UploadTooLarge { .. } => {
                "FILE_TOO_LARGE"
            }
            ValidationError::VideoTooLong { .. } => "VIDEO_TOO_LONG",
            ValidationError::UnknownDuration => "UNKNOWN_DURATION",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid referral: {0}")]
    InvalidReferral(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(e) => e.code(),
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidReferral(_) => "INVALID_REFERRAL",
            AppError::Unavailable(_) => "UNAVAILABLE",
            AppError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(
                ValidationError::FileTooLarge { .. } | ValidationError::UploadTooLarge { .. },
            ) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Validation(_) | AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidReferral(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Store failure: {}", e);
        AppError::Unavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(ValidationError::FileTooLarge { size: 2, max: 1 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::from(ValidationError::UploadTooLarge { max: 1 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::from(ValidationError::UnknownDuration).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidReferral("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(StoreError::Unavailable("down".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            ValidationError::MissingField("caption"),
            ValidationError::UnknownLanguage("x".into()),
            ValidationError::UnknownRegion("x".into()),
            ValidationError::CaptionTooLong { len: 201, max: 200 },
            ValidationError::InvalidMediaType("image/png".into()),
            ValidationError::FileTooLarge { size: 2, max: 1 },
            ValidationError::VideoTooLong { seconds: 61.0, max: 60 },
            ValidationError::UnknownDuration,
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_upload_limit_reports_only_the_maximum() {
        let err = ValidationError::UploadTooLarge { max: 1024 };
        assert_eq!(err.code(), "FILE_TOO_LARGE");
        assert_eq!(err.to_string(), "Video file exceeds the maximum of 1024 bytes");
    }
}
