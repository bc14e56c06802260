#![allow(async_fn_in_trait)]

use shop_domain::id::{OrderId, ProductId, UserId};
use shop_domain::pagination::PageRequest;
use shop_domain::product::ProductOrdering;

use crate::domain::filter::{OrderFilter, ProductFilter};
use crate::domain::policy::OrderScope;
use crate::domain::types::{
    NewOrder, NewUser, Order, OrderUpdate, OutboxEvent, Product, ProductInput, User,
    UserWithOrders,
};
use crate::error::ShopError;

/// Repository for the product catalogue.
pub trait ProductRepository: Send + Sync {
    async fn count(&self, filter: &ProductFilter) -> Result<u64, ShopError>;

    /// Filtered listing, ordered by `ordering` then id. `page: None` returns every row.
    async fn list(
        &self,
        filter: &ProductFilter,
        ordering: &ProductOrdering,
        page: Option<PageRequest>,
    ) -> Result<Vec<Product>, ShopError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ShopError>;

    /// Existing products among `ids`, in any order.
    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, ShopError>;

    async fn create(&self, input: &ProductInput) -> Result<Product, ShopError>;

    /// Replace every field. `None` if the product does not exist.
    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>, ShopError>;

    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: ProductId) -> Result<bool, ShopError>;
}

/// Repository for orders and their items.
pub trait OrderRepository: Send + Sync {
    async fn list(&self, scope: OrderScope, filter: &OrderFilter)
    -> Result<Vec<Order>, ShopError>;

    async fn find(&self, scope: OrderScope, id: OrderId) -> Result<Option<Order>, ShopError>;

    /// Insert the order, its items and the optional outbox event atomically.
    async fn create(&self, order: &NewOrder, event: Option<&OutboxEvent>)
    -> Result<(), ShopError>;

    /// Apply `update` atomically. Returns `false` if the order does not exist.
    async fn update(&self, id: OrderId, update: &OrderUpdate) -> Result<bool, ShopError>;

    /// Delete the order and its items. Returns `true` if a row was deleted.
    async fn delete(&self, id: OrderId) -> Result<bool, ShopError>;
}

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    /// Every user with their order ids, ordered by user id.
    async fn list_with_orders(&self) -> Result<Vec<UserWithOrders>, ShopError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ShopError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ShopError>;
    /// Fails with `UsernameTaken` on a duplicate username.
    async fn create(&self, user: &NewUser) -> Result<User, ShopError>;
}

/// Rendered product-list pages, keyed by write generation and query string.
///
/// Read the generation before loading products and store the page under it.
/// A page rendered from data older than the last write then lands under a
/// retired generation and is never served.
pub trait ProductListCache: Send + Sync {
    async fn generation(&self) -> Result<u64, ShopError>;
    async fn get(&self, generation: u64, query: &str) -> Result<Option<String>, ShopError>;
    async fn put(&self, generation: u64, query: &str, body: &str) -> Result<(), ShopError>;
    /// Retire the current generation and drop every cached page.
    async fn invalidate(&self) -> Result<(), ShopError>;
}
