use shop_core::error::FieldErrors;
use shop_domain::id::ProductId;
use shop_domain::pagination::{Page, num_pages};
use shop_domain::product::ProductOrdering;

use crate::domain::filter::{ProductFilter, ProductQuery};
use crate::domain::money::validate_price;
use crate::domain::repository::{ProductListCache, ProductRepository};
use crate::domain::types::{Product, ProductDraft, ProductInfo, ProductInput};
use crate::error::ShopError;

pub const NAME_MAX_CHARS: usize = 200;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_chars: Option<usize>,
) -> String {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return String::new();
    };
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    } else if let Some(max) = max_chars.filter(|max| value.chars().count() > *max) {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
    }
    value
}

/// Check every field of a complete draft and collect all problems at once.
pub fn validate_product(draft: ProductDraft) -> Result<ProductInput, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = required_text(&mut errors, "name", draft.name, Some(NAME_MAX_CHARS));
    let description = required_text(&mut errors, "description", draft.description, None);

    let price = match draft.price {
        None => {
            errors.add("price", REQUIRED);
            None
        }
        Some(price) => validate_price(price)
            .map_err(|msg| errors.add("price", msg))
            .ok(),
    };

    let stock = match draft.stock {
        None => {
            errors.add("stock", REQUIRED);
            None
        }
        Some(n) if n < 0 => {
            errors.add("stock", "Ensure this value is greater than or equal to 0.");
            None
        }
        Some(n) => match i32::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                errors.add(
                    "stock",
                    format!("Ensure this value is less than or equal to {}.", i32::MAX),
                );
                None
            }
        },
    };

    let image = draft.image.flatten().filter(|s| !s.trim().is_empty());

    match (price, stock) {
        (Some(price), Some(stock)) if errors.is_empty() => Ok(ProductInput {
            name,
            description,
            price,
            stock,
            image,
        }),
        _ => Err(errors),
    }
}

/// Drop cached listings after a write. A cache failure is logged, not returned.
async fn invalidate_listings<C: ProductListCache>(cache: &C) {
    if let Err(e) = cache.invalidate().await {
        tracing::warn!(error = %e, "product list cache invalidation failed");
    }
}

// ── ListProducts ─────────────────────────────────────────────────────────────

pub struct ListProductsUseCase<R: ProductRepository> {
    pub repo: R,
    pub page_size: u64,
}

impl<R: ProductRepository> ListProductsUseCase<R> {
    pub async fn execute(&self, query: &ProductQuery) -> Result<Page<Product>, ShopError> {
        let count = self.repo.count(&query.filter).await?;
        let page = query.page.resolve(count, self.page_size)?;
        let items = self
            .repo
            .list(&query.filter, &query.ordering, Some(page))
            .await?;
        Ok(Page {
            count,
            page: page.page,
            num_pages: num_pages(count, page.page_size),
            items,
        })
    }
}

// ── GetProduct ───────────────────────────────────────────────────────────────

pub struct GetProductUseCase<R: ProductRepository> {
    pub repo: R,
}

impl<R: ProductRepository> GetProductUseCase<R> {
    pub async fn execute(&self, id: ProductId) -> Result<Product, ShopError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ShopError::ProductNotFound)
    }
}

// ── ProductInfo ──────────────────────────────────────────────────────────────

pub struct ProductInfoUseCase<R: ProductRepository> {
    pub repo: R,
}

impl<R: ProductRepository> ProductInfoUseCase<R> {
    /// Every product, in stock or not, with the count and the highest price.
    pub async fn execute(&self) -> Result<ProductInfo, ShopError> {
        let products = self
            .repo
            .list(&ProductFilter::default(), &ProductOrdering::default(), None)
            .await?;
        let max_price = products.iter().map(|p| p.price).max();
        Ok(ProductInfo {
            count: products.len(),
            max_price,
            products,
        })
    }
}

// ── CreateProduct ────────────────────────────────────────────────────────────

pub struct CreateProductUseCase<R: ProductRepository, C: ProductListCache> {
    pub repo: R,
    pub cache: C,
}

impl<R: ProductRepository, C: ProductListCache> CreateProductUseCase<R, C> {
    pub async fn execute(&self, draft: ProductDraft) -> Result<Product, ShopError> {
        let input = validate_product(draft)?;
        let product = self.repo.create(&input).await?;
        invalidate_listings(&self.cache).await;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }
}

// ── UpdateProduct ────────────────────────────────────────────────────────────

pub struct UpdateProductUseCase<R: ProductRepository, C: ProductListCache> {
    pub repo: R,
    pub cache: C,
}

impl<R: ProductRepository, C: ProductListCache> UpdateProductUseCase<R, C> {
    /// `partial` fills absent fields from the stored product (PATCH);
    /// otherwise every field is required (PUT).
    pub async fn execute(
        &self,
        id: ProductId,
        draft: ProductDraft,
        partial: bool,
    ) -> Result<Product, ShopError> {
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(ShopError::ProductNotFound)?;
        let draft = if partial {
            draft.merged_over(&current)
        } else {
            draft
        };
        let input = validate_product(draft)?;
        let product = self
            .repo
            .update(id, &input)
            .await?
            .ok_or(ShopError::ProductNotFound)?;
        invalidate_listings(&self.cache).await;
        Ok(product)
    }
}

// ── DeleteProduct ────────────────────────────────────────────────────────────

pub struct DeleteProductUseCase<R: ProductRepository, C: ProductListCache> {
    pub repo: R,
    pub cache: C,
}

impl<R: ProductRepository, C: ProductListCache> DeleteProductUseCase<R, C> {
    pub async fn execute(&self, id: ProductId) -> Result<(), ShopError> {
        if !self.repo.delete(id).await? {
            return Err(ShopError::ProductNotFound);
        }
        invalidate_listings(&self.cache).await;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}
