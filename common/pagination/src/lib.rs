use serde::Serialize;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 50;

/// Normalized page/limit pair shared by every paginated listing
/// (search, parts listing, inventory listing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Normalize raw query-string values. Missing or non-numeric input falls
    /// back to the defaults; `page` is floored to 1 and `limit` clamped to
    /// `[1, MAX_LIMIT]`.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page.and_then(|v| v.trim().parse::<i64>().ok());
        let limit = limit.and_then(|v| v.trim().parse::<i64>().ok());
        Self::normalize(page, limit)
    }

    pub fn normalize(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::normalize(None, None)
    }
}

/// Pagination block returned alongside every paginated result set.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageInfo {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl PageInfo {
    pub fn new(total: i64, pg: &Pagination) -> Self {
        Self {
            total,
            page: pg.page,
            limit: pg.limit,
            // ceil(total / limit) without floats
            pages: (total + pg.limit - 1) / pg.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing() {
        let pg = Pagination::from_raw(None, None);
        assert_eq!(pg, Pagination { page: 1, limit: 20 });
        assert_eq!(pg.offset(), 0);
    }

    #[test]
    fn non_numeric_falls_back() {
        let pg = Pagination::from_raw(Some("abc"), Some("lots"));
        assert_eq!(pg, Pagination { page: 1, limit: 20 });
    }

    #[test]
    fn limit_clamped_to_max() {
        let pg = Pagination::from_raw(Some("2"), Some("1000"));
        assert_eq!(pg.limit, 50);
        assert_eq!(pg.offset(), 50);
    }

    #[test]
    fn zero_and_negative_page_floored() {
        assert_eq!(Pagination::from_raw(Some("0"), None).page, 1);
        assert_eq!(Pagination::from_raw(Some("-3"), None).page, 1);
    }

    #[test]
    fn zero_limit_floored_to_one() {
        assert_eq!(Pagination::from_raw(None, Some("0")).limit, 1);
    }

    #[test]
    fn offset_math() {
        let pg = Pagination::normalize(Some(3), Some(25));
        assert_eq!(pg.offset(), 50);
    }

    #[test]
    fn page_info_rounds_up() {
        let pg = Pagination::normalize(Some(1), Some(20));
        assert_eq!(PageInfo::new(41, &pg).pages, 3);
        assert_eq!(PageInfo::new(40, &pg).pages, 2);
        assert_eq!(PageInfo::new(0, &pg).pages, 0);
    }
}
