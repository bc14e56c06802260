use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shop_auth_types::identity::MaybeCaller;
use shop_core::extract::JsonBody;
use shop_domain::id::OrderId;
use shop_domain::order::OrderStatus;

use crate::domain::filter::OrderFilter;
use crate::domain::policy::{OrderScope, require_caller};
use crate::domain::types::{Order, OrderDraft, OrderItem, OrderItemDraft};
use crate::error::ShopError;
use crate::handlers::parse_query;
use crate::state::AppState;
use crate::usecase::order::{
    CreateOrderUseCase, DeleteOrderUseCase, GetOrderUseCase, ListOrdersUseCase,
    UpdateOrderUseCase,
};

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product: i32,
    pub product_name: String,
    #[serde(serialize_with = "shop_core::serde::decimal_2dp")]
    pub product_price: Decimal,
    pub quantity: i32,
    #[serde(serialize_with = "shop_core::serde::decimal_as_f64")]
    pub item_subtotal: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            item_subtotal: item.subtotal(),
            product: item.product_id.0,
            product_name: item.product_name,
            product_price: item.product_price,
            quantity: item.quantity,
        }
    }
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub user: i32,
    #[serde(serialize_with = "shop_core::serde::to_rfc3339_micros")]
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    #[serde(serialize_with = "shop_core::serde::decimal_as_f64")]
    pub total_price: Decimal,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            total_price: order.total_price(),
            order_id: order.order_id,
            user: order.user_id.0,
            created_at: order.created_at,
            status: order.status,
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct OrderItemRequest {
    pub product: Option<i32>,
    pub quantity: Option<i64>,
}

/// Any `user` key in the body is ignored; orders always belong to the caller.
#[derive(Deserialize, Default)]
pub struct OrderRequest {
    pub status: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
}

impl From<OrderRequest> for OrderDraft {
    fn from(req: OrderRequest) -> Self {
        Self {
            status: req.status,
            items: req.items.map(|items| {
                items
                    .into_iter()
                    .map(|i| OrderItemDraft {
                        product: i.product,
                        quantity: i.quantity,
                    })
                    .collect()
            }),
        }
    }
}

fn order_id(raw: &str) -> Result<OrderId, ShopError> {
    raw.parse().map_err(|_| ShopError::OrderNotFound)
}

// ── GET /orders/ ─────────────────────────────────────────────────────────────

pub async fn list_orders(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<OrderResponse>>, ShopError> {
    let caller = require_caller(caller.as_ref())?;
    let filter = OrderFilter::from_params(&parse_query(raw_query.as_deref())?)?;
    let orders = ListOrdersUseCase {
        orders: state.order_repo(),
    }
    .execute(OrderScope::for_caller(caller), &filter)
    .await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

// ── POST /orders/ ────────────────────────────────────────────────────────────

pub async fn create_order(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<OrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ShopError> {
    let caller = require_caller(caller.as_ref())?;
    let order = CreateOrderUseCase {
        orders: state.order_repo(),
        products: state.product_repo(),
        users: state.user_repo(),
    }
    .execute(caller, body.into())
    .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

// ── GET /orders/{order_id}/ ──────────────────────────────────────────────────

pub async fn get_order(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ShopError> {
    let caller = require_caller(caller.as_ref())?;
    let order = GetOrderUseCase {
        orders: state.order_repo(),
    }
    .execute(OrderScope::for_caller(caller), order_id(&id)?)
    .await?;
    Ok(Json(order.into()))
}

// ── PUT / PATCH /orders/{order_id}/ ──────────────────────────────────────────

/// Every order field is optional, so full and partial updates coincide.
pub async fn update_order(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<OrderRequest>,
) -> Result<Json<OrderResponse>, ShopError> {
    let caller = require_caller(caller.as_ref())?;
    let order = UpdateOrderUseCase {
        orders: state.order_repo(),
        products: state.product_repo(),
    }
    .execute(OrderScope::for_caller(caller), order_id(&id)?, body.into())
    .await?;
    Ok(Json(order.into()))
}

// ── DELETE /orders/{order_id}/ ───────────────────────────────────────────────

pub async fn delete_order(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ShopError> {
    let caller = require_caller(caller.as_ref())?;
    DeleteOrderUseCase {
        orders: state.order_repo(),
    }
    .execute(OrderScope::for_caller(caller), order_id(&id)?)
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
