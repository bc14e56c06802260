use std::collections::BTreeMap;

use rust_decimal::Decimal;

use shop::domain::filter::OrderFilter;
use shop::domain::policy::OrderScope;
use shop::domain::types::{OrderDraft, OrderItemDraft};
use shop::error::ShopError;
use shop::usecase::order::{
    CreateOrderUseCase, DeleteOrderUseCase, GetOrderUseCase, ListOrdersUseCase,
    UpdateOrderUseCase,
};
use shop_domain::event::ORDER_CONFIRMATION_EVENT;
use shop_domain::id::{OrderId, UserId};
use shop_domain::order::OrderStatus;

use crate::helpers::{MockAuth, MockOrderRepo, MockProductRepo, MockUserRepo, product, user};

struct Fixture {
    products: MockProductRepo,
    orders: MockOrderRepo,
    users: MockUserRepo,
}

fn fixture() -> Fixture {
    let products = MockProductRepo::new(vec![
        product(1, "Coffee Mug", 12, 5),
        product(2, "Tea Cup", 8, 0),
    ]);
    let orders = MockOrderRepo::new(&products);
    let users = MockUserRepo::new(vec![
        user(1, "alice", "alice@example.com"),
        user(2, "bob", ""),
        user(3, "admin", "admin@example.com"),
    ]);
    Fixture {
        products,
        orders,
        users,
    }
}

fn line(product: i32, quantity: i64) -> OrderItemDraft {
    OrderItemDraft {
        product: Some(product),
        quantity: Some(quantity),
    }
}

fn items(lines: Vec<OrderItemDraft>) -> OrderDraft {
    OrderDraft {
        status: None,
        items: Some(lines),
    }
}

impl Fixture {
    fn create_uc(&self) -> CreateOrderUseCase<MockOrderRepo, MockProductRepo, MockUserRepo> {
        CreateOrderUseCase {
            orders: self.orders.clone(),
            products: self.products.clone(),
            users: self.users.clone(),
        }
    }

    async fn place(&self, user_id: i32, username: &str) -> OrderId {
        let auth = MockAuth::user(user_id, username);
        self.create_uc()
            .execute(&auth.caller, items(vec![line(1, 2)]))
            .await
            .unwrap()
            .order_id
    }
}

// ── CreateOrder ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_pending_order_with_total() {
    let fx = fixture();
    let auth = MockAuth::user(1, "alice");

    let order = fx
        .create_uc()
        .execute(&auth.caller, items(vec![line(1, 2), line(2, 3)]))
        .await
        .unwrap();

    assert_eq!(order.user_id, UserId(1));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total_price(), Decimal::from(48));
}

#[tokio::test]
async fn should_enqueue_confirmation_email_with_order() {
    let fx = fixture();
    let events = fx.orders.events_handle();
    let auth = MockAuth::user(1, "alice");

    let order = fx
        .create_uc()
        .execute(&auth.caller, items(vec![line(1, 1)]))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ORDER_CONFIRMATION_EVENT);
    assert_eq!(events[0].payload["email"], "alice@example.com");
    assert_eq!(events[0].payload["order_id"], order.order_id.to_string());
}

#[tokio::test]
async fn should_skip_confirmation_without_email() {
    let fx = fixture();
    let events = fx.orders.events_handle();
    let auth = MockAuth::user(2, "bob");

    fx.create_uc()
        .execute(&auth.caller, items(vec![line(1, 1)]))
        .await
        .unwrap();

    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_default_quantity_to_one() {
    let fx = fixture();
    let auth = MockAuth::user(1, "alice");
    let draft = items(vec![OrderItemDraft {
        product: Some(1),
        quantity: None,
    }]);

    let order = fx.create_uc().execute(&auth.caller, draft).await.unwrap();

    assert_eq!(order.items[0].quantity, 1);
}

#[tokio::test]
async fn should_reject_unknown_product_and_zero_quantity() {
    let fx = fixture();
    let orders = fx.orders.orders_handle();
    let auth = MockAuth::user(1, "alice");

    let result = fx
        .create_uc()
        .execute(&auth.caller, items(vec![line(99, 1), line(1, 0)]))
        .await;

    let Err(ShopError::Validation(errors)) = result else {
        panic!("expected validation error");
    };
    assert_eq!(
        errors.get("items[0].product").unwrap()[0],
        "Invalid pk \"99\" - object does not exist."
    );
    assert_eq!(
        errors.get("items[1].quantity").unwrap()[0],
        "Ensure this value is greater than or equal to 1."
    );
    assert!(orders.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_unknown_status() {
    let fx = fixture();
    let auth = MockAuth::user(1, "alice");
    let draft = OrderDraft {
        status: Some("Lost".to_owned()),
        items: None,
    };

    let result = fx.create_uc().execute(&auth.caller, draft).await;

    let Err(ShopError::Validation(errors)) = result else {
        panic!("expected validation error");
    };
    assert_eq!(
        errors.get("status").unwrap()[0],
        "\"Lost\" is not a valid choice."
    );
}

#[tokio::test]
async fn should_reject_token_for_deleted_user() {
    let fx = fixture();
    let auth = MockAuth::user(42, "ghost");
    let result = fx
        .create_uc()
        .execute(&auth.caller, items(vec![line(1, 1)]))
        .await;
    assert!(matches!(result, Err(ShopError::InvalidToken)));
}

// ── ListOrders / GetOrder ────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_only_own_orders_for_regular_user() {
    let fx = fixture();
    fx.place(1, "alice").await;
    fx.place(2, "bob").await;
    let uc = ListOrdersUseCase {
        orders: fx.orders.clone(),
    };

    let mine = uc
        .execute(OrderScope::Owner(UserId(1)), &OrderFilter::default())
        .await
        .unwrap();
    let all = uc
        .execute(OrderScope::All, &OrderFilter::default())
        .await
        .unwrap();

    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].user_id, UserId(1));
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn should_filter_orders_by_status() {
    let fx = fixture();
    let id = fx.place(1, "alice").await;
    fx.place(1, "alice").await;
    UpdateOrderUseCase {
        orders: fx.orders.clone(),
        products: fx.products.clone(),
    }
    .execute(
        OrderScope::All,
        id,
        OrderDraft {
            status: Some("Confirmed".to_owned()),
            items: None,
        },
    )
    .await
    .unwrap();

    let params: BTreeMap<String, String> =
        [("status".to_owned(), "Confirmed".to_owned())].into();
    let filter = OrderFilter::from_params(&params).unwrap();
    let found = ListOrdersUseCase {
        orders: fx.orders.clone(),
    }
    .execute(OrderScope::All, &filter)
    .await
    .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].order_id, id);
}

#[tokio::test]
async fn should_hide_other_users_order() {
    let fx = fixture();
    let id = fx.place(1, "alice").await;
    let uc = GetOrderUseCase {
        orders: fx.orders.clone(),
    };

    assert!(uc.execute(OrderScope::Owner(UserId(1)), id).await.is_ok());
    assert!(uc.execute(OrderScope::All, id).await.is_ok());
    let result = uc.execute(OrderScope::Owner(UserId(2)), id).await;
    assert!(matches!(result, Err(ShopError::OrderNotFound)));
}

// ── UpdateOrder ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_replace_items_and_keep_status() {
    let fx = fixture();
    let id = fx.place(1, "alice").await;
    let uc = UpdateOrderUseCase {
        orders: fx.orders.clone(),
        products: fx.products.clone(),
    };

    let order = uc
        .execute(
            OrderScope::Owner(UserId(1)),
            id,
            items(vec![line(2, 4)]),
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_name, "Tea Cup");
    assert_eq!(order.total_price(), Decimal::from(32));
}

#[tokio::test]
async fn should_keep_items_when_only_status_changes() {
    let fx = fixture();
    let id = fx.place(1, "alice").await;
    let uc = UpdateOrderUseCase {
        orders: fx.orders.clone(),
        products: fx.products.clone(),
    };

    let order = uc
        .execute(
            OrderScope::All,
            id,
            OrderDraft {
                status: Some("Cancelled".to_owned()),
                items: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.items.len(), 1);
}

#[tokio::test]
async fn should_not_update_other_users_order() {
    let fx = fixture();
    let id = fx.place(1, "alice").await;
    let uc = UpdateOrderUseCase {
        orders: fx.orders.clone(),
        products: fx.products.clone(),
    };
    let result = uc
        .execute(OrderScope::Owner(UserId(2)), id, items(vec![]))
        .await;
    assert!(matches!(result, Err(ShopError::OrderNotFound)));
}

// ── DeleteOrder ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_delete_own_order() {
    let fx = fixture();
    let id = fx.place(1, "alice").await;
    let orders = fx.orders.orders_handle();
    let uc = DeleteOrderUseCase {
        orders: fx.orders.clone(),
    };

    uc.execute(OrderScope::Owner(UserId(1)), id).await.unwrap();

    assert!(orders.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_not_delete_other_users_order() {
    let fx = fixture();
    let id = fx.place(1, "alice").await;
    let orders = fx.orders.orders_handle();
    let uc = DeleteOrderUseCase {
        orders: fx.orders.clone(),
    };

    let result = uc.execute(OrderScope::Owner(UserId(2)), id).await;

    assert!(matches!(result, Err(ShopError::OrderNotFound)));
    assert_eq!(orders.lock().unwrap().len(), 1);
}
