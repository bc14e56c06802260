//! JWT access/refresh token validation and issuing.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use shop_domain::id::UserId;

use crate::identity::Caller;

/// Access tokens live for one hour.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 60 * 60;
/// Refresh tokens live for one day.
pub const REFRESH_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Errors returned by token validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("wrong token type")]
    WrongTokenType,
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user id as decimal string |
/// | `username` | custom | login name |
/// | `is_staff` | custom | admin capability |
/// | `token_type` | custom | `access` or `refresh` |
/// | `exp` | `exp` | seconds since epoch |
///
/// [`Serialize`] requires the **`issuer`** feature; only the service that
/// signs tokens enables it.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct JwtClaims {
    pub sub: String,
    pub username: String,
    pub is_staff: bool,
    pub token_type: TokenType,
    pub exp: u64,
}

// ── Core decode (private) ────────────────────────────────────────────────

/// HS256, exp checked, `exp` + `sub` required. Default 60s leeway.
fn decode_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

fn decode_typed(token: &str, secret: &str, expected: TokenType) -> Result<Caller, AuthError> {
    let claims = decode_jwt(token, secret)?;
    if claims.token_type != expected {
        return Err(AuthError::WrongTokenType);
    }
    let user_id = claims
        .sub
        .parse::<UserId>()
        .map_err(|_| AuthError::Malformed)?;
    Ok(Caller {
        user_id,
        username: claims.username,
        is_staff: claims.is_staff,
    })
}

// ── Public: all consumers ────────────────────────────────────────────────

/// Validate a bearer access token, returning the caller it identifies.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Caller, AuthError> {
    decode_typed(token, secret, TokenType::Access)
}

// ── Feature-gated: token issuer only ─────────────────────────────────────

/// Validate a refresh token. The caller re-reads the user before issuing.
#[cfg(any(feature = "issuer", test))]
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Caller, AuthError> {
    decode_typed(token, secret, TokenType::Refresh)
}

#[cfg(any(feature = "issuer", test))]
fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Sign a token of the given type for `caller`, returning it with its expiry.
#[cfg(any(feature = "issuer", test))]
pub fn issue_token(
    caller: &Caller,
    token_type: TokenType,
    secret: &str,
) -> Result<(String, u64), jsonwebtoken::errors::Error> {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let ttl = match token_type {
        TokenType::Access => ACCESS_TOKEN_TTL_SECS,
        TokenType::Refresh => REFRESH_TOKEN_TTL_SECS,
    };
    let exp = now_secs() + ttl;
    let claims = JwtClaims {
        sub: caller.user_id.to_string(),
        username: caller.username.clone(),
        is_staff: caller.is_staff,
        token_type,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, exp))
}
