use anyhow::Context as _;

use shop_auth_types::identity::Caller;
use shop_auth_types::token::{TokenType, issue_token, validate_refresh_token};

use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::ShopError;
use crate::infra::password::verify_password;

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn caller_of(user: &User) -> Caller {
    Caller {
        user_id: user.id,
        username: user.username.clone(),
        is_staff: user.is_staff,
    }
}

fn sign(caller: &Caller, token_type: TokenType, secret: &str) -> Result<String, ShopError> {
    let (token, _exp) = issue_token(caller, token_type, secret).context("sign jwt")?;
    Ok(token)
}

// ── ObtainToken ──────────────────────────────────────────────────────────────

pub struct ObtainTokenUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> ObtainTokenUseCase<U> {
    pub async fn execute(&self, username: &str, password: &str) -> Result<TokenPair, ShopError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ShopError::InvalidCredentials)?;

        let hash = user.password_hash.clone();
        let attempt = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &attempt))
            .await
            .context("join password verification")?;
        match verified {
            Ok(true) => {}
            Ok(false) => return Err(ShopError::InvalidCredentials),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "unreadable password hash");
                return Err(ShopError::InvalidCredentials);
            }
        }

        let caller = caller_of(&user);
        Ok(TokenPair {
            access: sign(&caller, TokenType::Access, &self.jwt_secret)?,
            refresh: sign(&caller, TokenType::Refresh, &self.jwt_secret)?,
        })
    }
}

// ── RefreshToken ─────────────────────────────────────────────────────────────

pub struct RefreshTokenUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> RefreshTokenUseCase<U> {
    /// New access token for the refresh token's user, with current flags.
    pub async fn execute(&self, refresh: &str) -> Result<String, ShopError> {
        let claimed = validate_refresh_token(refresh, &self.jwt_secret)
            .map_err(|_| ShopError::InvalidToken)?;
        let user = self
            .users
            .find_by_id(claimed.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ShopError::InvalidToken)?;
        sign(&caller_of(&user), TokenType::Access, &self.jwt_secret)
    }
}
