use shop::error::ShopError;
use shop::usecase::token::{ObtainTokenUseCase, RefreshTokenUseCase};
use shop::usecase::user::{CreateUserUseCase, ListUsersUseCase, NewAccount};
use shop_auth_types::token::validate_access_token;
use shop_domain::id::UserId;

use crate::helpers::{MockAuth, MockUserRepo, TEST_JWT_SECRET};

fn account(username: &str, password: &str) -> NewAccount {
    NewAccount {
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        password: password.to_owned(),
        ..Default::default()
    }
}

async fn repo_with(username: &str, password: &str) -> MockUserRepo {
    let users = MockUserRepo::empty();
    CreateUserUseCase {
        users: users.clone(),
    }
    .execute(account(username, password))
    .await
    .unwrap();
    users
}

// ── CreateUser ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_hashed_password() {
    let users = repo_with("alice", "s3cret").await;
    let stored = users.users.lock().unwrap()[0].clone();
    assert_eq!(stored.username, "alice");
    assert_ne!(stored.password_hash, "s3cret");
    assert!(stored.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn should_reject_duplicate_username() {
    let users = repo_with("alice", "s3cret").await;
    let result = CreateUserUseCase { users }
        .execute(account("alice", "other"))
        .await;
    assert!(matches!(result, Err(ShopError::UsernameTaken)));
}

#[tokio::test]
async fn should_list_users() {
    let users = repo_with("alice", "s3cret").await;
    let listed = ListUsersUseCase { users }.execute().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user.email, "alice@example.com");
}

// ── ObtainToken ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_token_pair_for_valid_credentials() {
    let users = repo_with("alice", "s3cret").await;
    let uc = ObtainTokenUseCase {
        users,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let pair = uc.execute("alice", "s3cret").await.unwrap();

    let caller = validate_access_token(&pair.access, TEST_JWT_SECRET).unwrap();
    assert_eq!(caller.user_id, UserId(1));
    assert_eq!(caller.username, "alice");
    assert!(!caller.is_staff);
    assert!(validate_access_token(&pair.refresh, TEST_JWT_SECRET).is_err());
}

#[tokio::test]
async fn should_reject_wrong_password() {
    let users = repo_with("alice", "s3cret").await;
    let uc = ObtainTokenUseCase {
        users,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let result = uc.execute("alice", "guess").await;
    assert!(matches!(result, Err(ShopError::InvalidCredentials)));
}

#[tokio::test]
async fn should_reject_unknown_and_inactive_users() {
    let users = repo_with("alice", "s3cret").await;
    let handle = users.users.clone();
    let uc = ObtainTokenUseCase {
        users,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let unknown = uc.execute("nobody", "s3cret").await;
    assert!(matches!(unknown, Err(ShopError::InvalidCredentials)));

    handle.lock().unwrap()[0].is_active = false;
    let inactive = uc.execute("alice", "s3cret").await;
    assert!(matches!(inactive, Err(ShopError::InvalidCredentials)));
}

// ── RefreshToken ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_exchange_refresh_token_for_access_token() {
    let users = repo_with("alice", "s3cret").await;
    let uc = RefreshTokenUseCase {
        users,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let refresh = MockAuth::user(1, "alice").refresh_token();

    let access = uc.execute(&refresh).await.unwrap();

    let caller = validate_access_token(&access, TEST_JWT_SECRET).unwrap();
    assert_eq!(caller.user_id, UserId(1));
}

#[tokio::test]
async fn should_pick_up_staff_flag_on_refresh() {
    let users = repo_with("alice", "s3cret").await;
    users.users.lock().unwrap()[0].is_staff = true;
    let uc = RefreshTokenUseCase {
        users,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let refresh = MockAuth::user(1, "alice").refresh_token();

    let access = uc.execute(&refresh).await.unwrap();

    assert!(validate_access_token(&access, TEST_JWT_SECRET).unwrap().is_staff);
}

#[tokio::test]
async fn should_reject_access_token_as_refresh() {
    let users = repo_with("alice", "s3cret").await;
    let uc = RefreshTokenUseCase {
        users,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let access = MockAuth::user(1, "alice").access_token();
    let result = uc.execute(&access).await;
    assert!(matches!(result, Err(ShopError::InvalidToken)));
}

#[tokio::test]
async fn should_reject_refresh_for_removed_user() {
    let uc = RefreshTokenUseCase {
        users: MockUserRepo::empty(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let refresh = MockAuth::user(7, "gone").refresh_token();
    let result = uc.execute(&refresh).await;
    assert!(matches!(result, Err(ShopError::InvalidToken)));
}
