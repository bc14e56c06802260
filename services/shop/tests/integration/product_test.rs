use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use shop::domain::filter::ProductQuery;
use shop::domain::types::ProductDraft;
use shop::error::ShopError;
use shop::usecase::product::{
    CreateProductUseCase, DeleteProductUseCase, GetProductUseCase, ListProductsUseCase,
    ProductInfoUseCase, UpdateProductUseCase,
};
use shop_domain::id::ProductId;

use crate::helpers::{MockProductListCache, MockProductRepo, product};

fn query(pairs: &[(&str, &str)]) -> ProductQuery {
    let params: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    ProductQuery::from_params(&params).unwrap()
}

fn catalogue() -> MockProductRepo {
    MockProductRepo::new(vec![
        product(1, "Coffee Mug", 12, 5),
        product(2, "Tea Cup", 8, 0),
        product(3, "Water Bottle", 20, 3),
        product(4, "Mug Rack", 35, 1),
    ])
}

fn draft(name: &str, price: i64, stock: i64) -> ProductDraft {
    ProductDraft {
        name: Some(name.to_owned()),
        description: Some("Ceramic".to_owned()),
        price: Some(Decimal::from(price)),
        stock: Some(stock),
        image: None,
    }
}

// ── ListProducts ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_only_products_in_stock() {
    let uc = ListProductsUseCase {
        repo: catalogue(),
        page_size: 10,
    };
    let page = uc.execute(&query(&[])).await.unwrap();
    assert_eq!(page.count, 3);
    assert!(page.items.iter().all(|p| p.stock > 0));
}

#[tokio::test]
async fn should_paginate_in_pages_of_page_size() {
    let uc = ListProductsUseCase {
        repo: catalogue(),
        page_size: 2,
    };
    let first = uc.execute(&query(&[])).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.num_pages, 2);
    assert!(first.has_next());
    assert!(!first.has_previous());

    let last = uc.execute(&query(&[("page", "last")])).await.unwrap();
    assert_eq!(last.page, 2);
    assert_eq!(last.items.len(), 1);
    assert!(!last.has_next());
}

#[tokio::test]
async fn should_reject_page_past_the_end() {
    let uc = ListProductsUseCase {
        repo: catalogue(),
        page_size: 2,
    };
    let result = uc.execute(&query(&[("page", "3")])).await;
    assert!(matches!(result, Err(ShopError::InvalidPage)));
}

#[tokio::test]
async fn should_filter_by_name_and_price_range() {
    let uc = ListProductsUseCase {
        repo: catalogue(),
        page_size: 10,
    };
    let page = uc
        .execute(&query(&[("name__icontains", "mug"), ("price__lt", "30")]))
        .await
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Coffee Mug"]);
}

#[tokio::test]
async fn should_order_by_descending_price() {
    let uc = ListProductsUseCase {
        repo: catalogue(),
        page_size: 10,
    };
    let page = uc.execute(&query(&[("ordering", "-price")])).await.unwrap();
    let ids: Vec<i32> = page.items.iter().map(|p| p.id.0).collect();
    assert_eq!(ids, vec![4, 3, 1]);
}

#[tokio::test]
async fn should_search_name_and_description() {
    let uc = ListProductsUseCase {
        repo: catalogue(),
        page_size: 10,
    };
    let page = uc
        .execute(&query(&[("search", "bottle")]))
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.items[0].id, ProductId(3));
}

// ── GetProduct / ProductInfo ─────────────────────────────────────────────────

#[tokio::test]
async fn should_get_out_of_stock_product_by_id() {
    let uc = GetProductUseCase { repo: catalogue() };
    let product = uc.execute(ProductId(2)).await.unwrap();
    assert_eq!(product.name, "Tea Cup");
    assert!(!product.in_stock());
}

#[tokio::test]
async fn should_report_missing_product() {
    let uc = GetProductUseCase { repo: catalogue() };
    let result = uc.execute(ProductId(99)).await;
    assert!(matches!(result, Err(ShopError::ProductNotFound)));
}

#[tokio::test]
async fn should_summarise_whole_catalogue() {
    let uc = ProductInfoUseCase { repo: catalogue() };
    let info = uc.execute().await.unwrap();
    assert_eq!(info.count, 4);
    assert_eq!(info.max_price, Some(Decimal::from(35)));
}

#[tokio::test]
async fn should_have_no_max_price_for_empty_catalogue() {
    let uc = ProductInfoUseCase {
        repo: MockProductRepo::empty(),
    };
    let info = uc.execute().await.unwrap();
    assert_eq!(info.count, 0);
    assert_eq!(info.max_price, None);
}

// ── CreateProduct ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_product_and_invalidate_listings() {
    let repo = MockProductRepo::empty();
    let products = repo.products_handle();
    let cache = MockProductListCache::default();
    let uc = CreateProductUseCase {
        repo,
        cache: cache.clone(),
    };

    let created = uc.execute(draft("Mug", 10, 5)).await.unwrap();

    assert_eq!(created.id, ProductId(1));
    assert_eq!(products.lock().unwrap().len(), 1);
    assert_eq!(cache.invalidation_count(), 1);
}

#[tokio::test]
async fn should_not_create_product_with_negative_price() {
    let repo = MockProductRepo::empty();
    let products = repo.products_handle();
    let cache = MockProductListCache::default();
    let uc = CreateProductUseCase {
        repo,
        cache: cache.clone(),
    };

    let result = uc.execute(draft("Mug", -10, 5)).await;

    let Err(ShopError::Validation(errors)) = result else {
        panic!("expected validation error");
    };
    assert_eq!(
        errors.get("price").unwrap()[0],
        "Price must be a positive number."
    );
    assert!(products.lock().unwrap().is_empty());
    assert_eq!(cache.invalidation_count(), 0);
}

// ── UpdateProduct ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_patch_only_submitted_fields() {
    let repo = catalogue();
    let uc = UpdateProductUseCase {
        repo,
        cache: MockProductListCache::default(),
    };
    let patch = ProductDraft {
        price: Some(Decimal::from_str("14.50").unwrap()),
        ..Default::default()
    };

    let updated = uc.execute(ProductId(1), patch, true).await.unwrap();

    assert_eq!(updated.name, "Coffee Mug");
    assert_eq!(updated.stock, 5);
    assert_eq!(updated.price, Decimal::from_str("14.50").unwrap());
}

#[tokio::test]
async fn should_require_every_field_on_replace() {
    let uc = UpdateProductUseCase {
        repo: catalogue(),
        cache: MockProductListCache::default(),
    };
    let patch = ProductDraft {
        price: Some(Decimal::from(3)),
        ..Default::default()
    };

    let result = uc.execute(ProductId(1), patch, false).await;

    let Err(ShopError::Validation(errors)) = result else {
        panic!("expected validation error");
    };
    assert!(errors.get("name").is_some());
    assert!(errors.get("price").is_none());
}

#[tokio::test]
async fn should_not_update_missing_product() {
    let cache = MockProductListCache::default();
    let uc = UpdateProductUseCase {
        repo: catalogue(),
        cache: cache.clone(),
    };
    let result = uc.execute(ProductId(99), draft("Mug", 1, 1), false).await;
    assert!(matches!(result, Err(ShopError::ProductNotFound)));
    assert_eq!(cache.invalidation_count(), 0);
}

// ── DeleteProduct ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_delete_product_and_invalidate_listings() {
    let repo = catalogue();
    let products = repo.products_handle();
    let cache = MockProductListCache::default();
    let uc = DeleteProductUseCase {
        repo,
        cache: cache.clone(),
    };

    uc.execute(ProductId(2)).await.unwrap();

    assert_eq!(products.lock().unwrap().len(), 3);
    assert_eq!(cache.invalidation_count(), 1);
}

#[tokio::test]
async fn should_report_missing_product_on_delete() {
    let uc = DeleteProductUseCase {
        repo: catalogue(),
        cache: MockProductListCache::default(),
    };
    let result = uc.execute(ProductId(99)).await;
    assert!(matches!(result, Err(ShopError::ProductNotFound)));
}
