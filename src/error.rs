use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Coarse failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Expired,
    Inactive,
    InvalidInput,
    ValidationFailed,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Expired => StatusCode::GONE,
            ErrorKind::Inactive => StatusCode::FORBIDDEN,
            ErrorKind::InvalidInput | ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Link not found")]
    LinkNotFound,

    #[error("Referral code not found: {0}")]
    ReferralCodeNotFound(String),

    #[error("QR code not found")]
    ArtifactNotFound,

    #[error("Link is inactive")]
    LinkInactive,

    #[error("Link has expired")]
    LinkExpired,

    #[error("Invalid referral code: {0}")]
    UnknownReferralCode(String),

    #[error("{0} is already registered")]
    DuplicateContact(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A generated code or token lost a uniqueness race; the caller may retry.
    #[error("Allocation collision on {0}")]
    AllocationCollision(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Artifact error: {0}")]
    ArtifactError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::IdentityNotFound
            | AppError::LinkNotFound
            | AppError::ReferralCodeNotFound(_)
            | AppError::ArtifactNotFound => ErrorKind::NotFound,
            AppError::LinkExpired => ErrorKind::Expired,
            AppError::LinkInactive => ErrorKind::Inactive,
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
            AppError::UnknownReferralCode(_)
            | AppError::PasswordMismatch
            | AppError::ValidationError(_) => ErrorKind::ValidationFailed,
            AppError::DuplicateContact(_)
            | AppError::AllocationCollision(_)
            | AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::DatabaseError(_)
            | AppError::ArtifactError(_)
            | AppError::InternalError(_)
            | AppError::IoError(_)
            | AppError::SerdeJsonError(_) => ErrorKind::Internal,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let message = match self.kind() {
            ErrorKind::Internal => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
            _ => {
                log::warn!("Request failed: {self}");
                self.to_string()
            }
        };

        HttpResponse::build(status_code).json(json!({
            "code": status_code.as_u16(),
            "message": message
        }))
    }
}
