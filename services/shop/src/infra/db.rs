use std::collections::HashMap;

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, Order as SortOrder,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use shop_core::sea_ext::{icontains, iexact};
use shop_domain::id::{OrderId, ProductId, UserId};
use shop_domain::lookup::Lookup;
use shop_domain::order::OrderStatus;
use shop_domain::pagination::{PageRequest, Sort};
use shop_domain::product::{ProductOrdering, ProductSortField};
use shop_schema::{order_items, orders, outbox_events, products, users};

use crate::domain::filter::{OrderFilter, ProductFilter};
use crate::domain::money::{cents_lookup, from_cents, to_cents};
use crate::domain::policy::OrderScope;
use crate::domain::repository::{OrderRepository, ProductRepository, UserRepository};
use crate::domain::types::{
    NewOrder, NewOrderItem, NewUser, Order, OrderItem, OrderUpdate, OutboxEvent, Product,
    ProductInput, User, UserWithOrders,
};
use crate::error::ShopError;

fn lookup_expr<C, V>(col: C, lookup: Lookup<V>) -> SimpleExpr
where
    C: ColumnTrait,
    V: Into<sea_orm::Value>,
{
    match lookup {
        Lookup::Exact(v) => col.eq(v),
        Lookup::Lt(v) => col.lt(v),
        Lookup::Gt(v) => col.gt(v),
        Lookup::Lte(v) => col.lte(v),
        Lookup::Gte(v) => col.gte(v),
        Lookup::Range(lo, hi) => col.between(lo, hi),
    }
}

fn match_nothing() -> SimpleExpr {
    Expr::val(1).eq(0)
}

// ── Product repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProductRepository {
    pub db: DatabaseConnection,
}

fn product_condition(filter: &ProductFilter) -> Condition {
    let mut cond = Condition::all();
    if filter.in_stock_only {
        cond = cond.add(products::Column::Stock.gt(0));
    }
    if let Some(name) = &filter.name_iexact {
        cond = cond.add(iexact(products::Column::Name, name));
    }
    if let Some(name) = &filter.name_icontains {
        cond = cond.add(icontains(products::Column::Name, name));
    }
    for lookup in &filter.price {
        cond = match cents_lookup(*lookup) {
            Some(cents) => cond.add(lookup_expr(products::Column::PriceCents, cents)),
            None => cond.add(match_nothing()),
        };
    }
    for lookup in &filter.stock {
        cond = cond.add(lookup_expr(products::Column::Stock, *lookup));
    }
    for term in &filter.search {
        cond = cond.add(
            Condition::any()
                .add(icontains(products::Column::Name, term))
                .add(icontains(products::Column::Description, term)),
        );
    }
    cond
}

fn sort_column(field: ProductSortField) -> products::Column {
    match field {
        ProductSortField::Name => products::Column::Name,
        ProductSortField::Price => products::Column::PriceCents,
        ProductSortField::Stock => products::Column::Stock,
    }
}

fn sort_order(sort: Sort) -> SortOrder {
    match sort {
        Sort::Asc => SortOrder::Asc,
        Sort::Desc => SortOrder::Desc,
    }
}

fn price_cents(price: rust_decimal::Decimal) -> Result<i64, ShopError> {
    to_cents(price)
        .ok_or_else(|| anyhow::anyhow!("price {price} is not a whole number of cents").into())
}

impl ProductRepository for DbProductRepository {
    async fn count(&self, filter: &ProductFilter) -> Result<u64, ShopError> {
        let count = products::Entity::find()
            .filter(product_condition(filter))
            .count(&self.db)
            .await
            .context("count products")?;
        Ok(count)
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        ordering: &ProductOrdering,
        page: Option<PageRequest>,
    ) -> Result<Vec<Product>, ShopError> {
        let mut query = products::Entity::find().filter(product_condition(filter));
        for (field, sort) in &ordering.0 {
            query = query.order_by(sort_column(*field), sort_order(*sort));
        }
        query = query.order_by_asc(products::Column::Id);
        if let Some(page) = page {
            query = query.offset(page.offset()).limit(page.page_size);
        }
        let models = query.all(&self.db).await.context("list products")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ShopError> {
        let model = products::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find product by id")?;
        Ok(model.map(product_from_model))
    }

    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, ShopError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let models = products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().map(|id| id.0)))
            .all(&self.db)
            .await
            .context("find products by ids")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn create(&self, input: &ProductInput) -> Result<Product, ShopError> {
        let model = products::ActiveModel {
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            price_cents: Set(price_cents(input.price)?),
            stock: Set(input.stock),
            image: Set(input.image.clone()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("insert product")?;
        Ok(product_from_model(model))
    }

    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>, ShopError> {
        let active = products::ActiveModel {
            id: Set(id.0),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            price_cents: Set(price_cents(input.price)?),
            stock: Set(input.stock),
            image: Set(input.image.clone()),
        };
        match active.update(&self.db).await {
            Ok(model) => Ok(Some(product_from_model(model))),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("update product").into()),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, ShopError> {
        let result = products::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .context("delete product")?;
        Ok(result.rows_affected > 0)
    }
}

fn product_from_model(model: products::Model) -> Product {
    Product {
        id: ProductId(model.id),
        name: model.name,
        description: model.description,
        price: from_cents(model.price_cents),
        stock: model.stock,
        image: model.image,
    }
}

// ── Order repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn next_day_start(day: NaiveDate) -> DateTime<Utc> {
    day_start(day.succ_opt().unwrap_or(day))
}

/// `created_at` lookups compare whole UTC days.
fn created_on(lookup: Lookup<NaiveDate>) -> Condition {
    let col = orders::Column::CreatedAt;
    let cond = Condition::all();
    match lookup {
        Lookup::Exact(d) => cond
            .add(col.gte(day_start(d)))
            .add(col.lt(next_day_start(d))),
        Lookup::Lt(d) => cond.add(col.lt(day_start(d))),
        Lookup::Lte(d) => cond.add(col.lt(next_day_start(d))),
        Lookup::Gt(d) => cond.add(col.gte(next_day_start(d))),
        Lookup::Gte(d) => cond.add(col.gte(day_start(d))),
        Lookup::Range(from, to) => cond
            .add(col.gte(day_start(from)))
            .add(col.lt(next_day_start(to))),
    }
}

fn scope_condition(scope: OrderScope) -> Condition {
    match scope {
        OrderScope::All => Condition::all(),
        OrderScope::Owner(user_id) => Condition::all().add(orders::Column::UserId.eq(user_id.0)),
    }
}

impl OrderRepository for DbOrderRepository {
    async fn list(
        &self,
        scope: OrderScope,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, ShopError> {
        let mut query = orders::Entity::find().filter(scope_condition(scope));
        if let Some(status) = filter.status {
            query = query.filter(orders::Column::Status.eq(status.as_str()));
        }
        for lookup in &filter.created_at {
            query = query.filter(created_on(*lookup));
        }
        let models = query
            .order_by_asc(orders::Column::CreatedAt)
            .order_by_asc(orders::Column::OrderId)
            .all(&self.db)
            .await
            .context("list orders")?;
        let ids: Vec<Uuid> = models.iter().map(|m| m.order_id).collect();
        let mut items = load_items(&self.db, &ids).await?;
        models
            .into_iter()
            .map(|m| {
                let lines = items.remove(&m.order_id).unwrap_or_default();
                order_from_model(m, lines)
            })
            .collect()
    }

    async fn find(&self, scope: OrderScope, id: OrderId) -> Result<Option<Order>, ShopError> {
        let Some(model) = orders::Entity::find_by_id(id.0)
            .filter(scope_condition(scope))
            .one(&self.db)
            .await
            .context("find order")?
        else {
            return Ok(None);
        };
        let mut items = load_items(&self.db, &[model.order_id]).await?;
        let lines = items.remove(&model.order_id).unwrap_or_default();
        order_from_model(model, lines).map(Some)
    }

    async fn create(
        &self,
        order: &NewOrder,
        event: Option<&OutboxEvent>,
    ) -> Result<(), ShopError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let order = order.clone();
                let event = event.cloned();
                Box::pin(async move {
                    orders::ActiveModel {
                        order_id: Set(order.order_id.0),
                        user_id: Set(order.user_id.0),
                        created_at: Set(order.created_at),
                        status: Set(order.status.as_str().to_owned()),
                    }
                    .insert(txn)
                    .await?;
                    insert_items(txn, order.order_id, &order.items).await?;
                    if let Some(event) = event {
                        insert_outbox_event(txn, &event).await?;
                    }
                    Ok(())
                })
            })
            .await
            .context("create order with items")?;
        Ok(())
    }

    async fn update(&self, id: OrderId, update: &OrderUpdate) -> Result<bool, ShopError> {
        let updated = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                let update = update.clone();
                Box::pin(async move {
                    let exists = orders::Entity::find_by_id(id.0).one(txn).await?.is_some();
                    if !exists {
                        return Ok(false);
                    }
                    if let Some(status) = update.status {
                        orders::ActiveModel {
                            order_id: Set(id.0),
                            status: Set(status.as_str().to_owned()),
                            ..Default::default()
                        }
                        .update(txn)
                        .await?;
                    }
                    if let Some(items) = update.items {
                        order_items::Entity::delete_many()
                            .filter(order_items::Column::OrderId.eq(id.0))
                            .exec(txn)
                            .await?;
                        insert_items(txn, id, &items).await?;
                    }
                    Ok(true)
                })
            })
            .await
            .context("update order")?;
        Ok(updated)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, ShopError> {
        let result = orders::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .context("delete order")?;
        Ok(result.rows_affected > 0)
    }
}

/// Items for the given orders, joined with their products, grouped by order.
async fn load_items<C: ConnectionTrait>(
    db: &C,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderItem>>, ShopError> {
    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }
    let rows = order_items::Entity::find()
        .filter(order_items::Column::OrderId.is_in(order_ids.iter().copied()))
        .find_also_related(products::Entity)
        .order_by_asc(order_items::Column::Id)
        .all(db)
        .await
        .context("load order items")?;
    for (item, product) in rows {
        let Some(product) = product else {
            tracing::warn!(item_id = item.id, "order item without product");
            continue;
        };
        grouped.entry(item.order_id).or_default().push(OrderItem {
            product_id: ProductId(product.id),
            product_name: product.name,
            product_price: from_cents(product.price_cents),
            quantity: item.quantity,
        });
    }
    Ok(grouped)
}

async fn insert_items(
    txn: &DatabaseTransaction,
    order_id: OrderId,
    items: &[NewOrderItem],
) -> Result<(), DbErr> {
    for item in items {
        order_items::ActiveModel {
            order_id: Set(order_id.0),
            product_id: Set(item.product_id.0),
            quantity: Set(item.quantity),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
) -> Result<(), DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        order_id: Set(event.order_id.map(|id| id.0)),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn order_from_model(model: orders::Model, items: Vec<OrderItem>) -> Result<Order, ShopError> {
    let status: OrderStatus = model
        .status
        .parse()
        .with_context(|| format!("order {} has unknown status", model.order_id))?;
    Ok(Order {
        order_id: OrderId(model.order_id),
        user_id: UserId(model.user_id),
        created_at: model.created_at,
        status,
        items,
    })
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn list_with_orders(&self) -> Result<Vec<UserWithOrders>, ShopError> {
        let rows = users::Entity::find()
            .find_with_related(orders::Entity)
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .context("list users with orders")?;
        Ok(rows
            .into_iter()
            .map(|(user, mut orders)| {
                orders.sort_by_key(|o| o.created_at);
                UserWithOrders {
                    user: user_from_model(user),
                    order_ids: orders.into_iter().map(|o| OrderId(o.order_id)).collect(),
                }
            })
            .collect())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ShopError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ShopError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, user: &NewUser) -> Result<User, ShopError> {
        let result = users::ActiveModel {
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            password_hash: Set(user.password_hash.clone()),
            is_staff: Set(user.is_staff),
            is_active: Set(true),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(model) => Ok(user_from_model(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ShopError::UsernameTaken)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: UserId(model.id),
        username: model.username,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        password_hash: model.password_hash,
        is_staff: model.is_staff,
        is_active: model.is_active,
        date_joined: model.date_joined,
    }
}
