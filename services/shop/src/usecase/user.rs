use anyhow::Context as _;

use shop_core::error::FieldErrors;

use crate::domain::repository::UserRepository;
use crate::domain::types::{NewUser, User, UserWithOrders};
use crate::error::ShopError;
use crate::infra::password::hash_password;

pub const USERNAME_MAX_CHARS: usize = 150;

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(&self) -> Result<Vec<UserWithOrders>, ShopError> {
        self.users.list_with_orders().await
    }
}

// ── CreateUser ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_staff: bool,
}

fn valid_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

pub fn validate_account(account: &NewAccount) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if account.username.is_empty() {
        errors.add("username", "This field may not be blank.");
    } else if account.username.chars().count() > USERNAME_MAX_CHARS {
        errors.add(
            "username",
            format!("Ensure this field has no more than {USERNAME_MAX_CHARS} characters."),
        );
    } else if !account.username.chars().all(valid_username_char) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, \
             and @/./+/-/_ characters.",
        );
    }
    if account.password.is_empty() {
        errors.add("password", "This field may not be blank.");
    }
    errors.into_result()
}

pub struct CreateUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> CreateUserUseCase<U> {
    pub async fn execute(&self, account: NewAccount) -> Result<User, ShopError> {
        validate_account(&account)?;
        if self
            .users
            .find_by_username(&account.username)
            .await?
            .is_some()
        {
            return Err(ShopError::UsernameTaken);
        }

        let password = account.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("join password hashing")??;

        let user = self
            .users
            .create(&NewUser {
                username: account.username,
                email: account.email,
                first_name: account.first_name,
                last_name: account.last_name,
                password_hash,
                is_staff: account.is_staff,
            })
            .await?;
        tracing::info!(user_id = %user.id, is_staff = user.is_staff, "user created");
        Ok(user)
    }
}
