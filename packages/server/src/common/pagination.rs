//! Page/limit pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Raw `?page=&limit=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageArgs {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageArgs {
    /// Normalize with defaults applied and bounds enforced
    /// (page >= 1, 1 <= limit <= 100, default limit 20).
    pub fn validate(&self) -> Page {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        Page { page, limit }
    }
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination block included in list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: &Page, total_count: i64) -> Self {
        Pagination {
            current_page: page.page,
            total_pages: (total_count + page.limit - 1) / page.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let page = PageArgs::default().validate();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 20);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn limit_clamped() {
        let page = PageArgs {
            page: Some(3),
            limit: Some(500),
        }
        .validate();
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset(), 200);

        let page = PageArgs {
            page: Some(0),
            limit: Some(0),
        }
        .validate();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageArgs {
            page: Some(1),
            limit: Some(10),
        }
        .validate();
        assert_eq!(Pagination::new(&page, 0).total_pages, 0);
        assert_eq!(Pagination::new(&page, 10).total_pages, 1);
        assert_eq!(Pagination::new(&page, 11).total_pages, 2);
    }
}
