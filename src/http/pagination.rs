//! Pagination contract for list endpoints.
//!
//! Requested values are clamped into configured bounds; non-numeric input
//! is a validation error rather than a silent default.

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::http::error::ApiError;

/// Sort direction shared by all list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a `sort_order` query value. Unlike `sort_by`, an invalid
    /// direction is a contract violation, not a fallback.
    pub fn parse(value: Option<&str>) -> Result<Self, ApiError> {
        match value {
            None => Ok(SortOrder::Desc),
            Some("asc") => Ok(SortOrder::Asc),
            Some("desc") => Ok(SortOrder::Desc),
            Some(other) => Err(ApiError::Validation(format!(
                "sort_order must be 'asc' or 'desc', got {other:?}"
            ))),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated page/size pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub size: u32,
}

impl PageParams {
    /// Build from raw query strings: non-numeric input → 422, numeric
    /// out-of-range input is clamped into bounds.
    pub fn from_query(
        page: Option<&str>,
        size: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<Self, ApiError> {
        let page = match page {
            None => 1,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ApiError::Validation(format!("page must be a positive integer, got {raw:?}")))?
                .max(1),
        };
        let size = match size {
            None => config.default_page_size,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ApiError::Validation(format!("size must be a positive integer, got {raw:?}")))?
                .clamp(1, config.max_page_size),
        };
        Ok(Self { page, size })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.size as i64
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

/// Pagination envelope: the items plus pre-pagination totals.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            size: params.size,
            total_pages: total_pages(total, params.size),
        }
    }
}

/// `ceil(total / size)`, with zero matching rows yielding zero pages.
fn total_pages(total: i64, size: u32) -> i64 {
    if total <= 0 {
        return 0;
    }
    (total + size as i64 - 1) / size as i64
}
