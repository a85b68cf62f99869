use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::utils::SocialSaveError;

/// Message shown for any tool timeout; the operation details only go to the log.
pub const TIMEOUT_MESSAGE: &str = "The request took too long. Please try again.";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`SocialSaveError`] and adds handler-chosen failures. Implements
/// [`IntoResponse`] to produce `{ success: false, error, code }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] SocialSaveError),

    /// A 500 whose message the handler has already phrased for the user.
    #[error("{0}")]
    Failed(String),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = classify(&self);
        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

/// HTTP status, error code and user-facing message for an error.
fn classify(err: &ApiError) -> (StatusCode, &'static str, String) {
    let core = match err {
        ApiError::Core(core) => core,
        ApiError::Failed(msg) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_FAILED", msg.clone());
        }
    };

    match core {
        SocialSaveError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "INVALID_URL", core.to_string()),
        SocialSaveError::PlatformMismatch { .. } => {
            (StatusCode::BAD_REQUEST, "PLATFORM_MISMATCH", core.to_string())
        }
        SocialSaveError::UnknownPlatform(_) => {
            (StatusCode::NOT_FOUND, "UNKNOWN_PLATFORM", core.to_string())
        }
        SocialSaveError::NoDownloadableFormat => {
            (StatusCode::NOT_FOUND, "NO_DOWNLOADABLE_FORMAT", core.to_string())
        }
        SocialSaveError::ToolTimeout { .. } => {
            tracing::error!(error = %core, "yt-dlp timed out");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TOOL_TIMEOUT",
                TIMEOUT_MESSAGE.to_string(),
            )
        }
        SocialSaveError::YtDlpNotFound => {
            tracing::error!(error = %core, "yt-dlp missing");
            (StatusCode::INTERNAL_SERVER_ERROR, "YTDLP_NOT_FOUND", core.to_string())
        }
        SocialSaveError::ToolFailure(_)
        | SocialSaveError::OutputTooLarge { .. }
        | SocialSaveError::ParseError(_)
        | SocialSaveError::SerializationError(_) => {
            tracing::warn!(error = %core, "yt-dlp failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "TOOL_FAILURE", core.to_string())
        }
        SocialSaveError::ArtifactNotFound(_) => {
            tracing::error!(error = %core, "Artifact missing after successful download");
            (StatusCode::INTERNAL_SERVER_ERROR, "ARTIFACT_NOT_FOUND", core.to_string())
        }
        SocialSaveError::Config(_) | SocialSaveError::IoError(_) => {
            tracing::error!(error = %core, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: SocialSaveError) -> (StatusCode, &'static str) {
        let (status, code, _) = classify(&ApiError::from(err));
        (status, code)
    }

    #[test]
    fn test_input_errors_are_400() {
        assert_eq!(
            status_of(SocialSaveError::InvalidUrl(String::new())),
            (StatusCode::BAD_REQUEST, "INVALID_URL")
        );
        assert_eq!(
            status_of(SocialSaveError::PlatformMismatch {
                expected: "youtube".into(),
                detected: "tiktok".into(),
            })
            .0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_family() {
        assert_eq!(status_of(SocialSaveError::NoDownloadableFormat).0, StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(SocialSaveError::UnknownPlatform("myspace".into())).0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_timeout_hides_operation_details() {
        let err = ApiError::from(SocialSaveError::ToolTimeout {
            operation: "download",
            secs: 300,
        });
        let (status, code, message) = classify(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "TOOL_TIMEOUT");
        assert_eq!(message, TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_io_errors_are_sanitized() {
        let err = ApiError::from(SocialSaveError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/srv/secret",
        )));
        let (_, code, message) = classify(&err);
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("/srv/secret"));
    }
}
