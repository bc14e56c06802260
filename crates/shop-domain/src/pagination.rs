//! Page-number pagination and sort direction types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Generic sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sort {
    Asc,
    Desc,
}

/// Requested page, as given in the `page` query parameter.
///
/// Accepts a 1-based integer or the literal `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageNumber {
    #[default]
    First,
    Number(u64),
    Last,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid page.")]
pub struct InvalidPage;

impl FromStr for PageNumber {
    type Err = InvalidPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "last" {
            return Ok(Self::Last);
        }
        match s.parse::<u64>() {
            Ok(0) | Err(_) => Err(InvalidPage),
            Ok(n) => Ok(Self::Number(n)),
        }
    }
}

/// A resolved page window: which page, and how many rows per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

/// Number of pages for `count` rows. An empty result still has one (empty) page.
pub fn num_pages(count: u64, page_size: u64) -> u64 {
    count.div_ceil(page_size.max(1)).max(1)
}

impl PageNumber {
    /// Resolve against the total row count. Pages past the end are invalid,
    /// except the first page of an empty result.
    pub fn resolve(self, count: u64, page_size: u64) -> Result<PageRequest, InvalidPage> {
        let last = num_pages(count, page_size);
        let page = match self {
            Self::First => 1,
            Self::Number(n) => n,
            Self::Last => last,
        };
        if page > last {
            return Err(InvalidPage);
        }
        Ok(PageRequest {
            page,
            page_size: page_size.max(1),
        })
    }
}

/// One page of results plus the totals needed to render navigation links.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub num_pages: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
