use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use shop_core::error::{FieldErrors, error_response};
use shop_domain::pagination::InvalidPage;

/// Shop API error variants.
#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("invalid input: {0}")]
    Validation(FieldErrors),
    #[error("authentication credentials were not provided")]
    NotAuthenticated,
    #[error("no active account found with the given credentials")]
    InvalidCredentials,
    #[error("token is invalid or expired")]
    InvalidToken,
    #[error("you do not have permission to perform this action")]
    Forbidden,
    #[error("product not found")]
    ProductNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("invalid page")]
    InvalidPage,
    #[error("a user with that username already exists")]
    UsernameTaken,
    #[error("request was throttled, expected available in {retry_after_secs} seconds")]
    Throttled { retry_after_secs: u64 },
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ShopError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::InvalidPage => "INVALID_PAGE",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::Throttled { .. } => "THROTTLED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated | Self::InvalidCredentials | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ProductNotFound | Self::OrderNotFound | Self::InvalidPage => {
                StatusCode::NOT_FOUND
            }
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FieldErrors> for ShopError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<InvalidPage> for ShopError {
    fn from(_: InvalidPage) -> Self {
        Self::InvalidPage
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let mut resp = match &self {
            Self::Validation(errors) => {
                error_response(self.status(), self.kind(), "invalid input", Some(errors))
            }
            _ => error_response(self.status(), self.kind(), self.to_string(), None),
        };
        match &self {
            Self::NotAuthenticated | Self::InvalidToken => {
                resp.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer realm=\"api\""),
                );
            }
            Self::Throttled { retry_after_secs } => {
                resp.headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            }
            _ => {}
        }
        resp
    }
}
