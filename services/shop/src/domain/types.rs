use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shop_domain::event::{ORDER_CONFIRMATION_EVENT, OrderConfirmation};
use shop_domain::id::{OrderId, ProductId, UserId};
use shop_domain::order::OrderStatus;

// ── Products ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A complete, validated set of product fields for insert or replace.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
}

/// Product fields as submitted, before validation. `None` means the key was absent.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub image: Option<Option<String>>,
}

impl ProductDraft {
    /// Fill absent fields from `current` (PATCH semantics).
    pub fn merged_over(self, current: &Product) -> Self {
        Self {
            name: self.name.or_else(|| Some(current.name.clone())),
            description: self
                .description
                .or_else(|| Some(current.description.clone())),
            price: self.price.or(Some(current.price)),
            stock: self.stock.or(Some(i64::from(current.stock))),
            image: self.image.or_else(|| Some(current.image.clone())),
        }
    }
}

/// Catalogue summary for `/products/info/`.
#[derive(Debug, Clone)]
pub struct ProductInfo {
    pub products: Vec<Product>,
    pub count: usize,
    pub max_price: Option<Decimal>,
}

// ── Orders ───────────────────────────────────────────────────────────────────

/// An order line joined with the product it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.product_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of item subtotals. Never stored.
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(OrderItem::subtotal).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<NewOrderItem>,
}

/// Changes to an existing order. `items: Some` replaces the whole item set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub items: Option<Vec<NewOrderItem>>,
}

/// An order line as submitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderItemDraft {
    pub product: Option<i32>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub status: Option<String>,
    pub items: Option<Vec<OrderItemDraft>>,
}

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// A user together with the ids of the orders they own.
#[derive(Debug, Clone)]
pub struct UserWithOrders {
    pub user: User,
    pub order_ids: Vec<OrderId>,
}

// ── Outbox ───────────────────────────────────────────────────────────────────

/// Row written to `outbox_events` in the same transaction as the change it announces.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub order_id: Option<OrderId>,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

impl OutboxEvent {
    pub fn order_confirmation(order_id: OrderId, email: &str) -> Self {
        let confirmation = OrderConfirmation {
            order_id,
            email: email.to_owned(),
        };
        Self {
            id: Uuid::now_v7(),
            kind: ORDER_CONFIRMATION_EVENT.to_owned(),
            order_id: Some(order_id),
            idempotency_key: confirmation.idempotency_key(),
            payload: serde_json::json!({
                "order_id": order_id.to_string(),
                "email": confirmation.email,
            }),
        }
    }
}
