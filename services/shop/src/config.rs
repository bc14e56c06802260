use serde::Deserialize;

use shop_core::config::Config;

/// Shop API configuration, read from the environment.
#[derive(Debug, Deserialize)]
pub struct ShopConfig {
    /// `DATABASE_URL`: Postgres in production, `sqlite:` URLs work for development.
    pub database_url: String,
    /// `JWT_SECRET`: HMAC secret for access and refresh tokens.
    pub jwt_secret: String,
    /// `SHOP_PORT`, default 8000.
    #[serde(default = "default_port")]
    pub shop_port: u16,
    /// `CACHE_URL`: Redis URL. Unset means an in-process cache.
    #[serde(default)]
    pub cache_url: Option<String>,
    /// `PAGE_SIZE`: products per page, default 2.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// `PRODUCT_LIST_CACHE_TTL_SECS`, default 900.
    #[serde(default = "default_product_list_ttl")]
    pub product_list_cache_ttl_secs: u64,
    /// `THROTTLE_ANON_RATE`, e.g. `2/minute`.
    #[serde(default = "default_anon_rate")]
    pub throttle_anon_rate: String,
    #[serde(default = "default_products_rate")]
    pub throttle_products_rate: String,
    #[serde(default = "default_orders_rate")]
    pub throttle_orders_rate: String,
}

impl Config for ShopConfig {}

fn default_port() -> u16 {
    8000
}

fn default_page_size() -> u64 {
    2
}

fn default_product_list_ttl() -> u64 {
    15 * 60
}

fn default_anon_rate() -> String {
    "2/minute".to_owned()
}

fn default_products_rate() -> String {
    "2/minute".to_owned()
}

fn default_orders_rate() -> String {
    "4/minute".to_owned()
}
