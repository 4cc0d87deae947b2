use serde::{Deserialize, Serialize};

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub total_pages: u32,
    pub last_page: u32,
}

impl PageMeta {
    /// `last_page` is ceil(total / limit); a page past it is legal and
    /// simply yields no data.
    pub fn compute(page: u32, limit: u32, total: u64) -> Self {
        let limit = u64::from(limit.max(1));
        let last_page = (total.div_ceil(limit)) as u32;
        Self {
            page,
            total_pages: last_page,
            last_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_five_rows_at_ten_per_page_is_three_pages() {
        let meta = PageMeta::compute(1, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.last_page, 3);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        assert_eq!(PageMeta::compute(1, 10, 30).last_page, 3);
    }

    #[test]
    fn empty_table_has_zero_pages() {
        assert_eq!(PageMeta::compute(1, 10, 0).last_page, 0);
    }
}
