// src/models/mod.rs

pub mod app_setting;
pub mod category;
pub mod chapter;
pub mod class;
pub mod question;
pub mod quiz;
pub mod quiz_record;
pub mod subject;
pub mod user;

use serde::Deserialize;

/// Shared `page`/`limit` query parameters for paginated listings.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Page number, 1-based.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, capped to keep a single response bounded.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(12).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit() - 1) / self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_are_absent() {
        let params = PageParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 12);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn offset_and_total_pages_follow_page_size() {
        let params = PageParams {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(params.offset(), 20);
        assert_eq!(params.total_pages(25), 3);
        assert_eq!(params.total_pages(30), 3);
        assert_eq!(params.total_pages(31), 4);
    }

    #[test]
    fn out_of_range_params_are_clamped() {
        let params = PageParams {
            page: Some(0),
            limit: Some(100_000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 100);
    }
}
