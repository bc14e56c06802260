use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sea_orm::Database;
use tracing::info;

use shop::config::ShopConfig;
use shop::infra::cache::CacheStore;
use shop::infra::db::DbUserRepository;
use shop::router::build_router;
use shop::state::{AppState, Settings};
use shop::usecase::user::{CreateUserUseCase, NewAccount};
use shop_auth_types::identity::JwtSecret;
use shop_core::config::Config;
use shop_core::shutdown::shutdown_signal;
use shop_core::tracing::init_tracing;

#[derive(Parser)]
#[command(name = "shop", about = "Shop API: products, orders and accounts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Create a user account.
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, env = "SHOP_USER_PASSWORD", hide_env_values = true)]
        password: String,
        /// Grant admin rights.
        #[arg(long)]
        staff: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,sqlx=warn");

    let cli = Cli::parse();
    let config = ShopConfig::from_env().context("read configuration from environment")?;
    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::CreateUser {
            username,
            email,
            first_name,
            last_name,
            password,
            staff,
        } => {
            let user = CreateUserUseCase {
                users: DbUserRepository { db },
            }
            .execute(NewAccount {
                username,
                email,
                first_name,
                last_name,
                password,
                is_staff: staff,
            })
            .await
            .map_err(|e| anyhow::anyhow!("create user: {e}"))?;
            info!(user_id = %user.id, username = %user.username, "account ready");
            Ok(())
        }
    }
}

async fn serve(config: ShopConfig, db: sea_orm::DatabaseConnection) -> anyhow::Result<()> {
    let cache = match &config.cache_url {
        Some(url) => CacheStore::redis(url)?,
        None => {
            info!("CACHE_URL not set, using in-process cache");
            CacheStore::memory()
        }
    };
    let state = AppState {
        db,
        cache,
        jwt_secret: JwtSecret::new(&config.jwt_secret),
        settings: Arc::new(Settings::from_config(&config)?),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.shop_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("shop service listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;
    info!("shop service stopped");
    Ok(())
}
