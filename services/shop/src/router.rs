use axum::{
    Router, middleware,
    routing::{get, post},
};

use shop_core::health::{healthz, readyz};
use shop_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    order::{create_order, delete_order, get_order, list_orders, update_order},
    product::{
        create_product, delete_product, get_product, list_products, patch_product,
        product_info, replace_product,
    },
    token::{obtain_token, refresh_token},
    user::list_users,
};
use crate::infra::throttle::{ThrottleScope, ThrottleState, throttle};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let products = Router::new()
        .route("/products/", get(list_products).post(create_product))
        .route("/products/info/", get(product_info))
        .route(
            "/product/{id}/",
            get(get_product)
                .put(replace_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route_layer(middleware::from_fn_with_state(
            ThrottleState::new(&state, Some(ThrottleScope::Products)),
            throttle,
        ));

    let orders = Router::new()
        .route("/orders/", get(list_orders).post(create_order))
        .route(
            "/orders/{order_id}/",
            get(get_order)
                .put(update_order)
                .patch(update_order)
                .delete(delete_order),
        )
        .route_layer(middleware::from_fn_with_state(
            ThrottleState::new(&state, Some(ThrottleScope::Orders)),
            throttle,
        ));

    let accounts = Router::new()
        .route("/users/", get(list_users))
        .route("/api/token/", post(obtain_token))
        .route("/api/token/refresh/", post(refresh_token))
        .route_layer(middleware::from_fn_with_state(
            ThrottleState::new(&state, None),
            throttle,
        ));

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(products)
        .merge(orders)
        .merge(accounts)
        .with_state(state)
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
}
