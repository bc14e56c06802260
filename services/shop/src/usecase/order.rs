use std::collections::HashSet;

use chrono::Utc;

use shop_auth_types::identity::Caller;
use shop_core::error::FieldErrors;
use shop_domain::id::{OrderId, ProductId};
use shop_domain::order::OrderStatus;

use crate::domain::filter::OrderFilter;
use crate::domain::policy::OrderScope;
use crate::domain::repository::{OrderRepository, ProductRepository, UserRepository};
use crate::domain::types::{
    NewOrder, NewOrderItem, Order, OrderDraft, OrderItemDraft, OrderUpdate, OutboxEvent,
};
use crate::error::ShopError;

/// Checked status and items; `None` means the field was not submitted.
struct ValidOrder {
    status: Option<OrderStatus>,
    items: Option<Vec<NewOrderItem>>,
}

async fn validate_order<P: ProductRepository>(
    products: &P,
    draft: OrderDraft,
) -> Result<ValidOrder, ShopError> {
    let mut errors = FieldErrors::new();

    let status = match draft.status.as_deref().map(str::parse::<OrderStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(e)) => {
            errors.add("status", e.to_string());
            None
        }
    };

    let items = match draft.items {
        None => None,
        Some(lines) => Some(validate_items(products, &lines, &mut errors).await?),
    };

    errors.into_result()?;
    Ok(ValidOrder { status, items })
}

async fn validate_items<P: ProductRepository>(
    products: &P,
    lines: &[OrderItemDraft],
    errors: &mut FieldErrors,
) -> Result<Vec<NewOrderItem>, ShopError> {
    let mut items: Vec<(usize, NewOrderItem)> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let Some(product) = line.product else {
            errors.add(format!("items[{i}].product"), "This field is required.");
            continue;
        };
        let quantity = line.quantity.unwrap_or(1);
        if quantity < 1 {
            errors.add(
                format!("items[{i}].quantity"),
                "Ensure this value is greater than or equal to 1.",
            );
            continue;
        }
        let Ok(quantity) = i32::try_from(quantity) else {
            errors.add(
                format!("items[{i}].quantity"),
                format!("Ensure this value is less than or equal to {}.", i32::MAX),
            );
            continue;
        };
        items.push((
            i,
            NewOrderItem {
                product_id: ProductId(product),
                quantity,
            },
        ));
    }

    let ids: Vec<ProductId> = items.iter().map(|(_, item)| item.product_id).collect();
    let known: HashSet<ProductId> = products
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    for (i, item) in &items {
        if !known.contains(&item.product_id) {
            errors.add(
                format!("items[{i}].product"),
                format!(
                    "Invalid pk \"{}\" - object does not exist.",
                    item.product_id
                ),
            );
        }
    }
    Ok(items.into_iter().map(|(_, item)| item).collect())
}

// ── ListOrders ───────────────────────────────────────────────────────────────

pub struct ListOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListOrdersUseCase<O> {
    pub async fn execute(
        &self,
        scope: OrderScope,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, ShopError> {
        self.orders.list(scope, filter).await
    }
}

// ── GetOrder ─────────────────────────────────────────────────────────────────

pub struct GetOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> GetOrderUseCase<O> {
    /// Orders outside `scope` are reported as missing.
    pub async fn execute(&self, scope: OrderScope, id: OrderId) -> Result<Order, ShopError> {
        self.orders
            .find(scope, id)
            .await?
            .ok_or(ShopError::OrderNotFound)
    }
}

// ── CreateOrder ──────────────────────────────────────────────────────────────

pub struct CreateOrderUseCase<O: OrderRepository, P: ProductRepository, U: UserRepository> {
    pub orders: O,
    pub products: P,
    pub users: U,
}

impl<O, P, U> CreateOrderUseCase<O, P, U>
where
    O: OrderRepository,
    P: ProductRepository,
    U: UserRepository,
{
    /// Creates the order for `caller` and, when the caller has an email
    /// address, enqueues the confirmation email in the same transaction.
    pub async fn execute(&self, caller: &Caller, draft: OrderDraft) -> Result<Order, ShopError> {
        let valid = validate_order(&self.products, draft).await?;
        let user = self
            .users
            .find_by_id(caller.user_id)
            .await?
            .ok_or(ShopError::InvalidToken)?;

        let order = NewOrder {
            order_id: OrderId::new_random(),
            user_id: user.id,
            created_at: Utc::now(),
            status: valid.status.unwrap_or_default(),
            items: valid.items.unwrap_or_default(),
        };
        let event = (!user.email.is_empty())
            .then(|| OutboxEvent::order_confirmation(order.order_id, &user.email));
        if event.is_none() {
            tracing::debug!(user_id = %user.id, "no email on file, skipping confirmation");
        }

        self.orders.create(&order, event.as_ref()).await?;
        tracing::info!(
            order_id = %order.order_id,
            user_id = %user.id,
            items = order.items.len(),
            "order created"
        );

        self.orders
            .find(OrderScope::All, order.order_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("order {} missing after insert", order.order_id).into())
    }
}

// ── UpdateOrder ──────────────────────────────────────────────────────────────

pub struct UpdateOrderUseCase<O: OrderRepository, P: ProductRepository> {
    pub orders: O,
    pub products: P,
}

impl<O: OrderRepository, P: ProductRepository> UpdateOrderUseCase<O, P> {
    /// Submitted `items` replace the whole item set; absent `items` leave it alone.
    pub async fn execute(
        &self,
        scope: OrderScope,
        id: OrderId,
        draft: OrderDraft,
    ) -> Result<Order, ShopError> {
        if self.orders.find(scope, id).await?.is_none() {
            return Err(ShopError::OrderNotFound);
        }
        let valid = validate_order(&self.products, draft).await?;
        let update = OrderUpdate {
            status: valid.status,
            items: valid.items,
        };
        if !self.orders.update(id, &update).await? {
            return Err(ShopError::OrderNotFound);
        }
        self.orders
            .find(scope, id)
            .await?
            .ok_or(ShopError::OrderNotFound)
    }
}

// ── DeleteOrder ──────────────────────────────────────────────────────────────

pub struct DeleteOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> DeleteOrderUseCase<O> {
    pub async fn execute(&self, scope: OrderScope, id: OrderId) -> Result<(), ShopError> {
        if self.orders.find(scope, id).await?.is_none() {
            return Err(ShopError::OrderNotFound);
        }
        if !self.orders.delete(id).await? {
            return Err(ShopError::OrderNotFound);
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }
}
