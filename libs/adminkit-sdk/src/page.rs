use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
///
/// Decoding is forgiving about the envelope: `page`, `limit` and `total` may
/// be numbers or numeric strings, and `totalPages` is always recomputed as
/// `ceil(total / limit)` rather than trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "RawPage<T>",
    bound(deserialize = "T: Deserialize<'de>"),
    rename_all = "camelCase"
)]
pub struct Page<T> {
    #[serde(rename = "data")]
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Deserialize)]
struct RawPage<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default, deserialize_with = "crate::lenient::opt_u64")]
    total: Option<u64>,
    #[serde(default, deserialize_with = "crate::lenient::opt_u32")]
    page: Option<u32>,
    #[serde(default, deserialize_with = "crate::lenient::opt_u32")]
    limit: Option<u32>,
}

impl<T> From<RawPage<T>> for Page<T> {
    fn from(raw: RawPage<T>) -> Self {
        let len = u32::try_from(raw.data.len()).unwrap_or(u32::MAX);
        let total = raw.total.unwrap_or(u64::from(len));
        let page = raw.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = raw.limit.filter(|l| *l > 0).unwrap_or(len.max(1));
        Self::new(raw.data, total, page, limit)
    }
}

impl<T> Page<T> {
    /// Build a page, deriving `total_pages` from `total` and `limit`.
    /// `page` and `limit` are clamped to at least 1.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
        Self {
            items,
            total,
            page: page.max(1),
            limit,
            total_pages,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a page after this one exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.items.is_empty() && self.page < self.total_pages
    }
}
