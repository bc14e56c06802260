use axum::{Json, extract::State};
use serde::Serialize;

use shop_auth_types::identity::MaybeCaller;
use shop_domain::id::OrderId;

use crate::domain::policy::{Access, authorize};
use crate::domain::types::UserWithOrders;
use crate::error::ShopError;
use crate::state::AppState;
use crate::usecase::user::ListUsersUseCase;

#[derive(Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub orders: Vec<OrderId>,
}

impl From<UserWithOrders> for UserResponse {
    fn from(u: UserWithOrders) -> Self {
        Self {
            username: u.user.username,
            email: u.user.email,
            first_name: u.user.first_name,
            last_name: u.user.last_name,
            orders: u.order_ids,
        }
    }
}

// ── GET /users/ ──────────────────────────────────────────────────────────────

pub async fn list_users(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ShopError> {
    authorize(caller.as_ref(), Access::AllowAny)?;
    let users = ListUsersUseCase {
        users: state.user_repo(),
    }
    .execute()
    .await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}
