use crate::config::PaginationConfig;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A validated, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: Option<u64>,
    pub previous_page: Option<u64>,
    /// 1-based index of the first item on this page, 0 when the page is empty
    pub start_index: u64,
    /// 1-based index of the last item on this page, 0 when the page is empty
    pub end_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

fn parse_positive(name: &str, raw: Option<&str>) -> AppResult<Option<u64>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n >= 1 => Ok(Some(n)),
            _ => Err(AppError::InvalidInput(format!(
                "{name} must be a positive integer, got '{v}'"
            ))),
        },
    }
}

impl PageRequest {
    /// Parses raw query values. Missing values fall back to page 1 and the
    /// configured default limit; limits above the maximum are clamped.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        config: &PaginationConfig,
    ) -> AppResult<Self> {
        let page = parse_positive("page", page)?.unwrap_or(1);
        let max_limit = config.max_limit.max(1);
        let limit = parse_positive("limit", limit)?
            .unwrap_or(config.default_limit)
            .clamp(1, max_limit);
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl PaginationInfo {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let PageRequest { page, limit } = request;
        let total_pages = total.div_ceil(limit);
        let has_next = page < total_pages;
        let has_previous = page > 1;

        let first = request.offset() + 1;
        let (start_index, end_index) = if first > total {
            (0, 0)
        } else {
            (first, (first + limit - 1).min(total))
        };

        Self {
            total,
            page,
            limit,
            total_pages,
            has_next,
            has_previous,
            next_page: has_next.then(|| page + 1),
            previous_page: has_previous.then(|| page - 1),
            start_index,
            end_index,
        }
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            pagination: PaginationInfo::new(request, total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
