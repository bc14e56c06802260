use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait,
};

use shop::domain::filter::ProductFilter;
use shop::domain::policy::OrderScope;
use shop::domain::repository::{OrderRepository, ProductRepository};
use shop::domain::types::{NewOrder, NewOrderItem, OrderUpdate, OutboxEvent};
use shop::infra::db::{DbOrderRepository, DbProductRepository};
use shop_domain::id::{OrderId, ProductId, UserId};
use shop_domain::order::OrderStatus;
use shop_migration::{Migrator, MigratorTrait};
use shop_schema::{order_items, orders, outbox_events, products, users};

/// Migrated in-memory database with user 1 and products 1 and 2.
async fn database() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opts).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    users::ActiveModel {
        username: Set("alice".to_owned()),
        email: Set("alice@example.com".to_owned()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        password_hash: Set(String::new()),
        is_staff: Set(false),
        is_active: Set(true),
        date_joined: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    for (name, cents) in [("Coffee Mug", 1200), ("Tea Cup", 800)] {
        products::ActiveModel {
            name: Set(name.to_owned()),
            description: Set(String::new()),
            price_cents: Set(cents),
            stock: Set(5),
            image: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
    }
    db
}

fn new_order(items: &[(i32, i32)]) -> NewOrder {
    NewOrder {
        order_id: OrderId::new_random(),
        user_id: UserId(1),
        created_at: Utc::now(),
        status: OrderStatus::Pending,
        items: items
            .iter()
            .map(|&(product, quantity)| NewOrderItem {
                product_id: ProductId(product),
                quantity,
            })
            .collect(),
    }
}

async fn counts(db: &DatabaseConnection) -> (u64, u64) {
    let orders = orders::Entity::find().count(db).await.unwrap();
    let items = order_items::Entity::find().count(db).await.unwrap();
    (orders, items)
}

#[tokio::test]
async fn should_persist_order_with_all_items() {
    let db = database().await;
    let repo = DbOrderRepository { db: db.clone() };
    let order = new_order(&[(1, 2), (2, 1)]);

    repo.create(&order, None).await.unwrap();

    assert_eq!(counts(&db).await, (1, 2));
    let stored = repo
        .find(OrderScope::All, order.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.items.len(), 2);
}

#[tokio::test]
async fn should_persist_nothing_when_an_item_insert_fails() {
    let db = database().await;
    let repo = DbOrderRepository { db: db.clone() };

    let result = repo.create(&new_order(&[(1, 1), (999, 1)]), None).await;

    assert!(result.is_err());
    assert_eq!(counts(&db).await, (0, 0));
}

#[tokio::test]
async fn should_keep_previous_items_when_replacement_fails() {
    let db = database().await;
    let repo = DbOrderRepository { db: db.clone() };
    let order = new_order(&[(1, 2), (2, 1)]);
    repo.create(&order, None).await.unwrap();

    let result = repo
        .update(
            order.order_id,
            &OrderUpdate {
                status: Some(OrderStatus::Confirmed),
                items: Some(vec![NewOrderItem {
                    product_id: ProductId(999),
                    quantity: 1,
                }]),
            },
        )
        .await;

    assert!(result.is_err());
    let stored = repo
        .find(OrderScope::All, order.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    let products: Vec<ProductId> = stored.items.iter().map(|i| i.product_id).collect();
    assert_eq!(products, vec![ProductId(1), ProductId(2)]);
}

#[tokio::test]
async fn should_link_confirmation_to_its_order() {
    let db = database().await;
    let repo = DbOrderRepository { db: db.clone() };
    let order = new_order(&[(1, 1)]);
    let event = OutboxEvent::order_confirmation(order.order_id, "alice@example.com");

    repo.create(&order, Some(&event)).await.unwrap();

    let row = outbox_events::Entity::find_by_id(event.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.order_id, Some(order.order_id.0));
    assert_eq!(row.idempotency_key, event.idempotency_key);
}

#[tokio::test]
async fn should_keep_pending_confirmation_when_order_is_deleted() {
    let db = database().await;
    let repo = DbOrderRepository { db: db.clone() };
    let order = new_order(&[(1, 1)]);
    let event = OutboxEvent::order_confirmation(order.order_id, "alice@example.com");
    repo.create(&order, Some(&event)).await.unwrap();

    assert!(repo.delete(order.order_id).await.unwrap());

    let row = outbox_events::Entity::find_by_id(event.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.order_id, None);
    assert_eq!(row.payload["order_id"], order.order_id.to_string());
    assert_eq!(counts(&db).await, (0, 0));
}

#[tokio::test]
async fn should_report_missing_order_on_update() {
    let db = database().await;
    let repo = DbOrderRepository { db };

    let updated = repo
        .update(OrderId::new_random(), &OrderUpdate::default())
        .await
        .unwrap();

    assert!(!updated);
}

#[tokio::test]
async fn should_match_names_ignoring_ascii_case() {
    let db = database().await;
    let repo = DbProductRepository { db };

    let by_name = ProductFilter {
        name_icontains: Some("MUG".to_owned()),
        ..Default::default()
    };
    let exact = ProductFilter {
        name_iexact: Some("tea cup".to_owned()),
        ..Default::default()
    };
    let search = ProductFilter {
        search: vec!["cOFFEE".to_owned(), "mug".to_owned()],
        ..Default::default()
    };

    assert_eq!(repo.count(&by_name).await.unwrap(), 1);
    assert_eq!(repo.count(&exact).await.unwrap(), 1);
    assert_eq!(repo.count(&search).await.unwrap(), 1);
}

#[tokio::test]
async fn should_treat_like_wildcards_in_filters_literally() {
    let db = database().await;
    let repo = DbProductRepository { db };

    let filter = ProductFilter {
        name_icontains: Some("%".to_owned()),
        ..Default::default()
    };

    assert_eq!(repo.count(&filter).await.unwrap(), 0);
}
