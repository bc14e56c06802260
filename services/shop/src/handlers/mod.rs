pub mod order;
pub mod product;
pub mod token;
pub mod user;

use shop_core::error::FieldErrors;

use crate::domain::filter::QueryParams;
use crate::error::ShopError;

/// Decode a raw query string into flat `key -> value` pairs.
pub(crate) fn parse_query(raw_query: Option<&str>) -> Result<QueryParams, ShopError> {
    let Some(raw) = raw_query.filter(|q| !q.is_empty()) else {
        return Ok(QueryParams::new());
    };
    serde_qs::from_str(raw).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.add("query", e.to_string());
        ShopError::Validation(errors)
    })
}
