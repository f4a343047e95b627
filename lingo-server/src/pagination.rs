//! Limit/offset pagination for list endpoints

use serde::Deserialize;

/// Upper bound on `limit` for every list endpoint
pub const MAX_LIMIT: i64 = 100;

/// Raw `limit`/`offset` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Sanitized window for a SQL `LIMIT ? OFFSET ?`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl PageParams {
    /// Apply the endpoint default and clamp into range
    ///
    /// `limit` ends up in `1..=MAX_LIMIT`; a negative `offset` becomes 0.
    ///
    /// ```
    /// use lingo_server::pagination::PageParams;
    ///
    /// let page = PageParams { limit: Some(500), offset: Some(-3) }.resolve(30);
    /// assert_eq!(page.limit, 100);
    /// assert_eq!(page.offset, 0);
    /// ```
    pub fn resolve(self, default_limit: i64) -> Page {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        Page { limit, offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let page = PageParams::default().resolve(30);
        assert_eq!(page, Page { limit: 30, offset: 0 });
    }

    #[test]
    fn test_limit_capped() {
        let page = PageParams { limit: Some(1000), offset: None }.resolve(50);
        assert_eq!(page.limit, MAX_LIMIT);
    }

    #[test]
    fn test_non_positive_limit_raised_to_one() {
        assert_eq!(PageParams { limit: Some(0), offset: None }.resolve(20).limit, 1);
        assert_eq!(PageParams { limit: Some(-5), offset: None }.resolve(20).limit, 1);
    }

    #[test]
    fn test_negative_offset_clamped() {
        let page = PageParams { limit: None, offset: Some(-10) }.resolve(20);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_offset_passes_through() {
        let page = PageParams { limit: Some(10), offset: Some(40) }.resolve(20);
        assert_eq!(page, Page { limit: 10, offset: 40 });
    }
}
