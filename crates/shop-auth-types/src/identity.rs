//! Bearer-token identity extractor.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{Authorization, Header, authorization::Bearer};
use http::request::Parts;
use http::{HeaderValue, StatusCode, header};

use shop_domain::id::UserId;

use crate::token::{AuthError, validate_access_token};

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub username: String,
    pub is_staff: bool,
}

/// HMAC secret used to verify bearer tokens. Exposed to extractors via `FromRef`.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }
}

/// Optional caller identity from `Authorization: Bearer <access token>`.
///
/// No header (or a non-bearer scheme) yields `MaybeCaller(None)`: the request is
/// anonymous and handlers decide via their access policy. A bearer token that
/// fails validation is rejected with 401 even on open endpoints.
#[derive(Debug, Clone)]
pub struct MaybeCaller(pub Option<Caller>);

/// 401 returned when a presented token cannot be validated.
#[derive(Debug)]
pub struct InvalidToken(pub AuthError);

impl IntoResponse for InvalidToken {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "kind": "INVALID_TOKEN",
            "message": format!("invalid token: {}", self.0),
        });
        let mut resp = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        resp.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer realm=\"api\""),
        );
        resp
    }
}

impl<S> FromRequestParts<S> for MaybeCaller
where
    JwtSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = InvalidToken;

    // Extract synchronously and return a 'static future; `async fn` here trips
    // E0195 against axum-core's `impl Future + Send` signature.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = JwtSecret::from_ref(state);
        let bearer =
            Authorization::<Bearer>::decode(&mut parts.headers.get_all(header::AUTHORIZATION).iter())
                .ok();

        let result = match bearer {
            None => Ok(MaybeCaller(None)),
            Some(auth) => match validate_access_token(auth.token(), &secret.0) {
                Ok(caller) => Ok(MaybeCaller(Some(caller))),
                Err(e) => {
                    tracing::debug!(error = %e, "rejected bearer token");
                    Err(InvalidToken(e))
                }
            },
        };

        async move { result }
    }
}
