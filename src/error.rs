//! Application error type.
//!
//! JSON routes return these directly; page routes turn them into a flash
//! message and a redirect (see [`crate::routes::pages`]).

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::domain::aggregates::{CartError, OrderError};
use crate::domain::value_objects::{CategoryError, ImageError, PriceError};

#[derive(Error, Debug)]
pub enum StorefrontError {
    /// No session, or the session points at an account that no longer exists.
    #[error("{0}")]
    Unauthorized(String),

    /// Missing entity, or an entity owned by someone else.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    InvalidState(String),

    /// Duplicate phone or email.
    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Repository(RepositoryError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

impl StorefrontError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidArgument(_) | Self::InvalidState(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Repository(_) | Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the shopper.
    pub fn public_message(&self) -> String {
        match self {
            Self::Repository(_) | Self::Session(_) | Self::Internal(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self) {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %self.status(), "request rejected");
        }
    }
}

impl From<RepositoryError> for StorefrontError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}

impl From<CartError> for StorefrontError {
    fn from(e: CartError) -> Self { Self::InvalidArgument(e.to_string()) }
}

impl From<OrderError> for StorefrontError {
    fn from(e: OrderError) -> Self { Self::InvalidState(e.to_string()) }
}

impl From<CategoryError> for StorefrontError {
    fn from(_: CategoryError) -> Self { Self::InvalidArgument("Please select a valid category.".to_string()) }
}

impl From<PriceError> for StorefrontError {
    fn from(e: PriceError) -> Self { Self::InvalidArgument(e.to_string()) }
}

impl From<ImageError> for StorefrontError {
    fn from(_: ImageError) -> Self { Self::InvalidArgument("Uploaded file is not an image.".to_string()) }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        invalid_fields(&errors, &mut fields);
        fields.sort_unstable();
        fields.dedup();
        Self::InvalidArgument(format!("Please check these fields: {}", fields.join(", ")))
    }
}

/// Leaf field names, descending into nested structs such as the address.
fn invalid_fields(errors: &validator::ValidationErrors, out: &mut Vec<&'static str>) {
    for (field, kind) in errors.errors() {
        match kind {
            validator::ValidationErrorsKind::Field(_) => out.push(*field),
            validator::ValidationErrorsKind::Struct(inner) => invalid_fields(inner, out),
            validator::ValidationErrorsKind::List(list) => list.values().for_each(|inner| invalid_fields(inner, out)),
        }
    }
}

impl From<JsonRejection> for StorefrontError {
    fn from(e: JsonRejection) -> Self {
        tracing::debug!(error = %e, "rejected json body");
        Self::InvalidArgument("Invalid data.".to_string())
    }
}

impl From<FormRejection> for StorefrontError {
    fn from(e: FormRejection) -> Self {
        tracing::debug!(error = %e, "rejected form body");
        Self::InvalidArgument("Please fill in all required fields.".to_string())
    }
}

impl From<PathRejection> for StorefrontError {
    fn from(_: PathRejection) -> Self { Self::NotFound("Not found.".to_string()) }
}

impl From<MultipartRejection> for StorefrontError {
    fn from(_: MultipartRejection) -> Self { Self::InvalidArgument("Expected a multipart form upload.".to_string()) }
}

impl From<MultipartError> for StorefrontError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::InvalidArgument("Uploaded file is too large.".to_string())
        } else {
            Self::InvalidArgument(format!("Invalid upload: {}", e.body_text()))
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        self.log();
        let body = serde_json::json!({ "success": false, "message": self.public_message() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StorefrontError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(StorefrontError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(StorefrontError::InvalidArgument("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(StorefrontError::InvalidState("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(StorefrontError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_repository_conflict_becomes_conflict() {
        let e: StorefrontError = RepositoryError::Conflict("taken".into()).into();
        assert!(matches!(e, StorefrontError::Conflict(ref m) if m == "taken"));
    }

    #[test]
    fn test_internal_details_hidden() {
        let e: StorefrontError = RepositoryError::DataCorruption("bad row 42".into()).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.public_message().contains("42"));
    }

    #[test]
    fn test_cart_errors_are_invalid_argument() {
        let e: StorefrontError = CartError::ItemNotInCart.into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.to_string(), "Item not found in cart");
    }

    #[test]
    fn test_validation_lists_nested_fields() {
        use validator::Validate;

        #[derive(Validate)]
        struct Inner {
            #[validate(length(min = 1))]
            city: String,
        }

        #[derive(Validate)]
        struct Outer {
            #[validate(email)]
            email: String,
            #[validate]
            inner: Inner,
        }

        let errors = Outer { email: "nope".into(), inner: Inner { city: String::new() } }.validate().unwrap_err();
        let e: StorefrontError = errors.into();
        assert_eq!(e.to_string(), "Please check these fields: city, email");
    }
}
