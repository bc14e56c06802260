//! Query-string filters for product and order listings.
//!
//! Keys follow the `field__lookup` convention. Unknown keys are ignored;
//! known keys with unusable values are reported per key.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use shop_core::error::FieldErrors;
use shop_domain::lookup::{Comparison, Lookup, split_key};
use shop_domain::order::OrderStatus;
use shop_domain::pagination::PageNumber;
use shop_domain::product::ProductOrdering;

use crate::error::ShopError;

pub type QueryParams = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub name_iexact: Option<String>,
    pub name_icontains: Option<String>,
    pub price: Vec<Lookup<Decimal>>,
    pub stock: Vec<Lookup<i32>>,
    /// Every term must match name or description.
    pub search: Vec<String>,
    pub in_stock_only: bool,
}

/// Everything a product listing request asks for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub ordering: ProductOrdering,
    pub page: PageNumber,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Compared against the UTC calendar day of `created_at`.
    pub created_at: Vec<Lookup<NaiveDate>>,
}

/// Split a search parameter into terms on whitespace and commas.
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

fn lookup_for<T: std::str::FromStr>(
    key: &str,
    suffix: Option<&str>,
    raw: &str,
    errors: &mut FieldErrors,
) -> Option<Lookup<T>> {
    let comparison = Comparison::from_suffix(suffix)?;
    match comparison.parse::<T>(raw) {
        Ok(lookup) => Some(lookup),
        Err(e) => {
            errors.add(key, e.to_string());
            None
        }
    }
}

impl ProductQuery {
    pub fn from_params(params: &QueryParams) -> Result<Self, ShopError> {
        let mut filter = ProductFilter {
            in_stock_only: true,
            ..Default::default()
        };
        let mut errors = FieldErrors::new();

        for (key, raw) in params {
            match split_key(key) {
                ("name", Some("iexact")) => filter.name_iexact = Some(raw.clone()),
                ("name", Some("icontains")) => filter.name_icontains = Some(raw.clone()),
                ("price", suffix) => {
                    if let Some(l) = lookup_for::<Decimal>(key, suffix, raw, &mut errors) {
                        filter.price.push(l);
                    }
                }
                ("stock", suffix) => {
                    if let Some(l) = lookup_for::<i32>(key, suffix, raw, &mut errors) {
                        filter.stock.push(l);
                    }
                }
                ("search", None) => filter.search = search_terms(raw),
                _ => {}
            }
        }
        errors.into_result()?;

        let ordering = params
            .get("ordering")
            .map(|raw| ProductOrdering::parse(raw))
            .unwrap_or_default();
        let page = match params.get("page") {
            Some(raw) => raw.parse::<PageNumber>()?,
            None => PageNumber::First,
        };
        Ok(Self {
            filter,
            ordering,
            page,
        })
    }
}

impl OrderFilter {
    pub fn from_params(params: &QueryParams) -> Result<Self, FieldErrors> {
        let mut filter = Self::default();
        let mut errors = FieldErrors::new();

        for (key, raw) in params {
            match split_key(key) {
                ("status", None | Some("exact")) => match raw.parse::<OrderStatus>() {
                    Ok(status) => filter.status = Some(status),
                    Err(e) => errors.add(key.as_str(), e.to_string()),
                },
                ("created_at", suffix) => {
                    if let Some(l) = lookup_for::<NaiveDate>(key, suffix, raw, &mut errors) {
                        filter.created_at.push(l);
                    }
                }
                _ => {}
            }
        }
        errors.into_result().map(|()| filter)
    }
}
