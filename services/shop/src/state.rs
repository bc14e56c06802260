use std::sync::Arc;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use shop_auth_types::identity::JwtSecret;

use crate::config::ShopConfig;
use crate::infra::cache::{CacheStore, CachedProductList};
use crate::infra::db::{DbOrderRepository, DbProductRepository, DbUserRepository};
use crate::infra::throttle::{Rate, ThrottleRates};

/// Tunables resolved from [`ShopConfig`] at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub page_size: u64,
    pub product_list_ttl_secs: u64,
    pub rates: ThrottleRates,
}

impl Settings {
    pub fn from_config(config: &ShopConfig) -> anyhow::Result<Self> {
        let rate = |name: &str, raw: &str| -> anyhow::Result<Rate> {
            raw.parse()
                .map_err(|e| anyhow::anyhow!("{name}: {e}"))
        };
        Ok(Self {
            page_size: config.page_size.max(1),
            product_list_ttl_secs: config.product_list_cache_ttl_secs,
            rates: ThrottleRates {
                anon: rate("THROTTLE_ANON_RATE", &config.throttle_anon_rate)?,
                products: rate("THROTTLE_PRODUCTS_RATE", &config.throttle_products_rate)?,
                orders: rate("THROTTLE_ORDERS_RATE", &config.throttle_orders_rate)?,
            },
        })
    }
}

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub cache: CacheStore,
    pub jwt_secret: JwtSecret,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn product_repo(&self) -> DbProductRepository {
        DbProductRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn product_list_cache(&self) -> CachedProductList {
        CachedProductList {
            store: self.cache.clone(),
            ttl_secs: self.settings.product_list_ttl_secs,
        }
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
