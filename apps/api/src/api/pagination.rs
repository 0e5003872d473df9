// Page-based pagination for collection endpoints
// Query: ?page=N&per-page=M; metadata returned in X-Pagination-* and Link headers

use axum::http::{header::LINK, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

pub const TOTAL_COUNT: &str = "x-pagination-total-count";
pub const PAGE_COUNT: &str = "x-pagination-page-count";
pub const CURRENT_PAGE: &str = "x-pagination-current-page";
pub const PER_PAGE: &str = "x-pagination-per-page";

/// Raw pagination query parameters
///
/// Kept as strings so a malformed value falls back to the default instead
/// of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    #[serde(rename = "per-page")]
    pub per_page: Option<String>,
}

impl PageQuery {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.map(|n| n.to_string()),
            per_page: per_page.map(|n| n.to_string()),
        }
    }

    /// Requested page; negative values count as 0
    pub fn page(&self) -> Option<u64> {
        parse_number(self.page.as_deref())
    }

    /// Requested page size; negative values count as 0
    pub fn per_page(&self) -> Option<u64> {
        parse_number(self.per_page.as_deref())
    }
}

fn parse_number(raw: Option<&str>) -> Option<u64> {
    let n: i64 = raw?.trim().parse().ok()?;
    Some(n.max(0) as u64)
}

/// Resolved page window over a collection of `total_count` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number
    pub page: u64,
    pub per_page: u64,
    pub total_count: u64,
}

impl Pagination {
    /// Resolves a query against the collection size
    ///
    /// `per-page` is clamped to `1..=max_page_size` and `page` to the
    /// existing pages (at least 1).
    ///
    /// # Example
    /// ```
    /// use token_api::api::pagination::{PageQuery, Pagination};
    ///
    /// let query = PageQuery::new(Some(9), Some(10));
    /// let pagination = Pagination::resolve(&query, 25, 20, 50);
    /// assert_eq!(pagination.page, 3);
    /// assert_eq!(pagination.offset(), 20);
    /// ```
    pub fn resolve(
        query: &PageQuery,
        total_count: u64,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Self {
        let max = u64::from(max_page_size.max(1));
        let per_page = query
            .per_page()
            .unwrap_or(u64::from(default_page_size))
            .clamp(1, max);
        let page_count = total_count.div_ceil(per_page).max(1);
        let page = query.page().unwrap_or(1).clamp(1, page_count);

        Self {
            page,
            per_page,
            total_count,
        }
    }

    pub fn page_count(&self) -> u64 {
        self.total_count.div_ceil(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        ((self.page - 1) * self.per_page) as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    /// `X-Pagination-*` and `Link` headers for a collection at `path`
    pub fn headers(&self, path: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            (TOTAL_COUNT, self.total_count),
            (PAGE_COUNT, self.page_count()),
            (CURRENT_PAGE, self.page),
            (PER_PAGE, self.per_page),
        ] {
            headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
        }

        if let Ok(link) = HeaderValue::from_str(&self.link(path)) {
            headers.insert(LINK, link);
        }
        headers
    }

    fn link(&self, path: &str) -> String {
        let last = self.page_count().max(1);
        let url = |page: u64| format!("<{path}?page={page}&per-page={}>", self.per_page);

        let mut links = vec![
            format!("{}; rel=self", url(self.page)),
            format!("{}; rel=first", url(1)),
        ];
        if self.page > 1 {
            links.push(format!("{}; rel=prev", url(self.page - 1)));
        }
        if self.page < last {
            links.push(format!("{}; rel=next", url(self.page + 1)));
        }
        links.push(format!("{}; rel=last", url(last)));
        links.join(", ")
    }
}
