//! Per-endpoint access rules and order visibility.

use shop_auth_types::identity::Caller;
use shop_domain::id::UserId;

use crate::error::ShopError;

/// Who may call an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    AllowAny,
    Authenticated,
    /// Staff accounts only.
    Admin,
}

pub fn authorize(caller: Option<&Caller>, access: Access) -> Result<(), ShopError> {
    match (access, caller) {
        (Access::AllowAny, _) => Ok(()),
        (_, None) => Err(ShopError::NotAuthenticated),
        (Access::Authenticated, Some(_)) => Ok(()),
        (Access::Admin, Some(c)) if c.is_staff => Ok(()),
        (Access::Admin, Some(_)) => Err(ShopError::Forbidden),
    }
}

/// `authorize(.., Authenticated)` that hands back the caller.
pub fn require_caller(caller: Option<&Caller>) -> Result<&Caller, ShopError> {
    caller.ok_or(ShopError::NotAuthenticated)
}

/// Which orders a caller can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Owner(UserId),
}

impl OrderScope {
    pub fn for_caller(caller: &Caller) -> Self {
        if caller.is_staff {
            Self::All
        } else {
            Self::Owner(caller.user_id)
        }
    }
}
