use crate::utils::{Page, PaginationInfo};
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Success envelope: numeric status, human readable message and payload.
/// Failures use the same shape without `data` (see `AppError::error_response`).
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
}

impl<T> ApiResponse<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::OK, message, data)
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn paginated(message: impl Into<String>, page: Page<T>) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(page.items),
            pagination: Some(page.pagination),
        }
    }
}
