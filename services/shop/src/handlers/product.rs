use anyhow::Context as _;
use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shop_auth_types::identity::{Caller, MaybeCaller};
use shop_core::extract::JsonBody;
use shop_domain::id::ProductId;
use shop_domain::pagination::Page;

use crate::domain::filter::ProductQuery;
use crate::domain::policy::{Access, authorize};
use crate::domain::repository::ProductListCache;
use crate::domain::types::{Product, ProductDraft, ProductInfo};
use crate::error::ShopError;
use crate::handlers::parse_query;
use crate::state::AppState;
use crate::usecase::product::{
    CreateProductUseCase, DeleteProductUseCase, GetProductUseCase, ListProductsUseCase,
    ProductInfoUseCase, UpdateProductUseCase,
};

const PRODUCTS_PATH: &str = "/products/";

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "shop_core::serde::decimal_2dp")]
    pub price: Decimal,
    pub stock: i32,
    pub in_stock: bool,
    pub image: Option<String>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            in_stock: p.in_stock(),
            id: p.id.0,
            name: p.name,
            description: p.description,
            price: p.price,
            stock: p.stock,
            image: p.image,
        }
    }
}

#[derive(Serialize)]
pub struct ProductPageResponse {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<ProductResponse>,
}

#[derive(Serialize)]
pub struct ProductInfoResponse {
    pub products: Vec<ProductResponse>,
    pub count: usize,
    #[serde(serialize_with = "shop_core::serde::option_decimal_as_f64")]
    pub max_price: Option<Decimal>,
}

impl From<ProductInfo> for ProductInfoResponse {
    fn from(info: ProductInfo) -> Self {
        Self {
            products: info.products.into_iter().map(Into::into).collect(),
            count: info.count,
            max_price: info.max_price,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "shop_core::serde::double_option")]
    pub image: Option<Option<String>>,
}

impl From<ProductRequest> for ProductDraft {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
            image: req.image,
        }
    }
}

/// Link to another page of the listing, keeping every other parameter.
/// Page 1 is linked without a `page` parameter.
pub fn page_link(raw_query: Option<&str>, page: u64) -> String {
    let page_param = format!("page={page}");
    let mut parts: Vec<&str> = raw_query
        .unwrap_or_default()
        .split('&')
        .filter(|p| !p.is_empty() && p.split('=').next() != Some("page"))
        .collect();
    if page > 1 {
        parts.push(&page_param);
    }
    if parts.is_empty() {
        PRODUCTS_PATH.to_owned()
    } else {
        format!("{PRODUCTS_PATH}?{}", parts.join("&"))
    }
}

fn page_response(page: Page<Product>, raw_query: Option<&str>) -> ProductPageResponse {
    ProductPageResponse {
        count: page.count,
        next: page
            .has_next()
            .then(|| page_link(raw_query, page.page + 1)),
        previous: page
            .has_previous()
            .then(|| page_link(raw_query, page.page - 1)),
        results: page.items.into_iter().map(Into::into).collect(),
    }
}

fn json_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn product_id(raw: &str) -> Result<ProductId, ShopError> {
    raw.parse().map_err(|_| ShopError::ProductNotFound)
}

// ── GET /products/ ───────────────────────────────────────────────────────────

pub async fn list_products(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, ShopError> {
    authorize(caller.as_ref(), Access::AllowAny)?;

    let cache = state.product_list_cache();
    let cache_key = raw_query.clone().unwrap_or_default();
    let generation = match cache.generation().await {
        Ok(generation) => Some(generation),
        Err(e) => {
            tracing::warn!(error = %e, "product list cache read failed");
            None
        }
    };
    if let Some(generation) = generation {
        match cache.get(generation, &cache_key).await {
            Ok(Some(body)) => return Ok(json_response(body)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "product list cache read failed"),
        }
    }

    let params = parse_query(raw_query.as_deref())?;
    let query = ProductQuery::from_params(&params)?;
    let page = ListProductsUseCase {
        repo: state.product_repo(),
        page_size: state.settings.page_size,
    }
    .execute(&query)
    .await?;

    let body = serde_json::to_string(&page_response(page, raw_query.as_deref()))
        .context("serialize product page")?;
    if let Some(generation) = generation {
        if let Err(e) = cache.put(generation, &cache_key, &body).await {
            tracing::warn!(error = %e, "product list cache write failed");
        }
    }
    Ok(json_response(body))
}

// ── POST /products/ ──────────────────────────────────────────────────────────

pub async fn create_product(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ShopError> {
    authorize(caller.as_ref(), Access::Admin)?;
    let product = CreateProductUseCase {
        repo: state.product_repo(),
        cache: state.product_list_cache(),
    }
    .execute(body.into())
    .await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

// ── GET /products/info/ ──────────────────────────────────────────────────────

pub async fn product_info(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
) -> Result<Json<ProductInfoResponse>, ShopError> {
    authorize(caller.as_ref(), Access::AllowAny)?;
    let info = ProductInfoUseCase {
        repo: state.product_repo(),
    }
    .execute()
    .await?;
    Ok(Json(info.into()))
}

// ── GET /product/{id}/ ───────────────────────────────────────────────────────

pub async fn get_product(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ShopError> {
    authorize(caller.as_ref(), Access::AllowAny)?;
    let product = GetProductUseCase {
        repo: state.product_repo(),
    }
    .execute(product_id(&id)?)
    .await?;
    Ok(Json(product.into()))
}

// ── PUT /product/{id}/ ───────────────────────────────────────────────────────

pub async fn replace_product(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ProductRequest>,
) -> Result<Json<ProductResponse>, ShopError> {
    update(caller.as_ref(), state, &id, body, false).await
}

// ── PATCH /product/{id}/ ─────────────────────────────────────────────────────

pub async fn patch_product(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ProductRequest>,
) -> Result<Json<ProductResponse>, ShopError> {
    update(caller.as_ref(), state, &id, body, true).await
}

async fn update(
    caller: Option<&Caller>,
    state: AppState,
    id: &str,
    body: ProductRequest,
    partial: bool,
) -> Result<Json<ProductResponse>, ShopError> {
    authorize(caller, Access::Admin)?;
    let product = UpdateProductUseCase {
        repo: state.product_repo(),
        cache: state.product_list_cache(),
    }
    .execute(product_id(id)?, body.into(), partial)
    .await?;
    Ok(Json(product.into()))
}

// ── DELETE /product/{id}/ ────────────────────────────────────────────────────

pub async fn delete_product(
    MaybeCaller(caller): MaybeCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ShopError> {
    authorize(caller.as_ref(), Access::Admin)?;
    DeleteProductUseCase {
        repo: state.product_repo(),
        cache: state.product_list_cache(),
    }
    .execute(product_id(&id)?)
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
