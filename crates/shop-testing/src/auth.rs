//! Mock auth helpers for integration tests.
//!
//! `MockAuth` signs real access tokens with [`TEST_JWT_SECRET`], so the service
//! under test must be built with the same secret.

use axum::http::{HeaderMap, HeaderValue, header};

use shop_auth_types::identity::Caller;
use shop_auth_types::token::{TokenType, issue_token};
use shop_domain::id::UserId;

pub const TEST_JWT_SECRET: &str = "shop-test-secret";

/// Identity to present on test requests.
#[derive(Debug, Clone)]
pub struct MockAuth {
    pub caller: Caller,
}

impl MockAuth {
    pub fn user(user_id: i32, username: &str) -> Self {
        Self::new(user_id, username, false)
    }

    pub fn staff(user_id: i32, username: &str) -> Self {
        Self::new(user_id, username, true)
    }

    pub fn new(user_id: i32, username: &str, is_staff: bool) -> Self {
        Self {
            caller: Caller {
                user_id: UserId(user_id),
                username: username.to_owned(),
                is_staff,
            },
        }
    }

    pub fn access_token(&self) -> String {
        let (token, _) = issue_token(&self.caller, TokenType::Access, TEST_JWT_SECRET)
            .expect("sign test access token");
        token
    }

    pub fn refresh_token(&self) -> String {
        let (token, _) = issue_token(&self.caller, TokenType::Refresh, TEST_JWT_SECRET)
            .expect("sign test refresh token");
        token
    }

    /// `Authorization: Bearer <access token>`
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", self.access_token()))
            .expect("token is a valid header value");
        map.insert(header::AUTHORIZATION, value);
        map
    }
}
