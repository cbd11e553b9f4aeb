//! Inputs and metadata for the paginated post listing.
//!
//! Everything here is pure: raw query-string values go in, normalized
//! paging and filter values come out. The SQL side lives in the `db` crate.

use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 6;
pub const DEFAULT_MAX_LIMIT: i64 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error("unknown filter mode: {0}")]
    UnknownFilterMode(String),
    #[error("category must be a numeric id, got {0:?}")]
    InvalidCategoryId(String),
}

/// Which column the `category` query parameter is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// `categories.name ILIKE $n`
    #[default]
    CategoryName,
    /// `posts.category_id = $n`
    CategoryId,
}

impl FromStr for FilterMode {
    type Err = ListingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "category_name" | "name" => Ok(FilterMode::CategoryName),
            "category_id" | "id" => Ok(FilterMode::CategoryId),
            other => Err(ListingError::UnknownFilterMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Values are read up to the first non-digit, so `2abc` and `2.5` both
    /// mean 2. Missing, non-numeric and non-positive values fall back to the
    /// defaults. `limit` is additionally capped at `max_limit`.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, max_limit: i64) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(limit)
            .unwrap_or(DEFAULT_LIMIT)
            .min(max_limit.max(1));
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    let value = raw?.trim_start();
    let unsigned = value.strip_prefix('+').unwrap_or(value);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..end];
    if digits.is_empty() {
        return None;
    }
    // Only overflow can fail here, and an oversized number is still positive.
    let parsed = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(parsed).filter(|value| *value > 0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    Name(String),
    Id(i32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub category: Option<CategoryFilter>,
    pub keyword: Option<String>,
}

impl ListingFilter {
    /// Blank values are treated as absent.
    pub fn from_raw(
        category: Option<&str>,
        keyword: Option<&str>,
        mode: FilterMode,
    ) -> Result<Self, ListingError> {
        let category = match non_blank(category) {
            None => None,
            Some(value) => Some(match mode {
                FilterMode::CategoryName => CategoryFilter::Name(value.to_string()),
                FilterMode::CategoryId => CategoryFilter::Id(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ListingError::InvalidCategoryId(value.to_string()))?,
                ),
            }),
        };

        Ok(Self {
            category,
            keyword: non_blank(keyword).map(str::to_string),
        })
    }

    /// `%keyword%` with LIKE metacharacters escaped, so the keyword matches
    /// as a literal substring.
    pub fn keyword_pattern(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .map(|keyword| format!("%{}%", escape_like(keyword)))
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.keyword.is_none()
    }
}

// Whitespace only decides blankness; the value itself is kept as sent.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub fn total_pages(total_items: i64, limit: i64) -> i64 {
    if total_items <= 0 || limit <= 0 {
        return 0;
    }
    total_items / limit + i64::from(total_items % limit != 0)
}

/// One page of results plus the metadata derived from the total count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResult<T> {
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
    pub items: Vec<T>,
    pub next_page: Option<i64>,
}

impl<T> ListingResult<T> {
    pub fn new(total_items: i64, page: PageRequest, items: Vec<T>) -> Self {
        let total_pages = total_pages(total_items, page.limit);
        let next_page = (page.page < total_pages).then(|| page.page + 1);

        Self {
            total_items,
            total_pages,
            current_page: page.page,
            limit: page.limit,
            items,
            next_page,
        }
    }
}
