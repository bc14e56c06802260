//! Product listing order.

use crate::pagination::Sort;

/// Columns a product listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductSortField {
    Name,
    Price,
    Stock,
}

impl ProductSortField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "stock" => Some(Self::Stock),
            _ => None,
        }
    }
}

/// Parsed `ordering` parameter, e.g. `name,-price`.
///
/// Unknown fields are dropped, as is any repeat of a field already listed.
/// An empty ordering means primary-key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductOrdering(pub Vec<(ProductSortField, Sort)>);

impl ProductOrdering {
    pub fn parse(raw: &str) -> Self {
        let mut terms: Vec<(ProductSortField, Sort)> = Vec::new();
        for term in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, sort) = match term.strip_prefix('-') {
                Some(rest) => (rest, Sort::Desc),
                None => (term, Sort::Asc),
            };
            let Some(field) = ProductSortField::from_name(name) else {
                continue;
            };
            if terms.iter().all(|(f, _)| *f != field) {
                terms.push((field, sort));
            }
        }
        Self(terms)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
