//! Page-number pagination for post listings.
//!
//! Page selection is forgiving: a missing or malformed page number selects
//! the first page, an out-of-range number selects the last one. An empty
//! listing still has a single (empty) page.

use serde::Serialize;

/// Default number of items per page.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// A requested page as it arrives from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub requested: Option<String>,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(requested: Option<String>, per_page: u64) -> Self {
        Self {
            requested,
            per_page: per_page.max(1),
        }
    }

    /// Request the first page.
    pub fn first(per_page: u64) -> Self {
        Self::new(None, per_page)
    }

    /// Number of pages needed for `total` items.
    pub fn num_pages(&self, total: u64) -> u64 {
        if total == 0 {
            1
        } else {
            total.div_ceil(self.per_page)
        }
    }

    /// Resolve the 1-based page number to show for `total` items.
    pub fn resolve(&self, total: u64) -> u64 {
        let last = self.num_pages(total);
        match self.requested.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 && (n as u64) <= last => n as u64,
                Ok(_) => last,
                // Integers past i64 are still integers, just out of range
                Err(_) if is_integer(raw) => last,
                Err(_) => 1,
            },
        }
    }

    /// Zero-based offset of the first item on `number`.
    pub fn offset(&self, number: u64) -> u64 {
        number.saturating_sub(1) * self.per_page
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total_items: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, total_items: u64, request: &PageRequest) -> Self {
        Self {
            items,
            number,
            num_pages: request.num_pages(total_items),
            total_items,
            per_page: request.per_page,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    /// Transform the items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total_items: self.total_items,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(raw: Option<&str>) -> PageRequest {
        PageRequest::new(raw.map(str::to_string), 10)
    }

    #[test]
    fn empty_listing_has_one_page() {
        assert_eq!(request(None).num_pages(0), 1);
        assert_eq!(request(Some("3")).resolve(0), 1);
    }

    #[test]
    fn num_pages_rounds_up() {
        assert_eq!(request(None).num_pages(10), 1);
        assert_eq!(request(None).num_pages(11), 2);
        assert_eq!(request(None).num_pages(25), 3);
    }

    #[test]
    fn missing_or_malformed_page_is_first() {
        assert_eq!(request(None).resolve(35), 1);
        assert_eq!(request(Some("")).resolve(35), 1);
        assert_eq!(request(Some("abc")).resolve(35), 1);
    }

    #[test]
    fn out_of_range_page_is_last() {
        assert_eq!(request(Some("99")).resolve(35), 4);
        assert_eq!(request(Some("0")).resolve(35), 4);
        assert_eq!(request(Some("-2")).resolve(35), 4);
    }

    #[test]
    fn page_number_past_i64_is_last() {
        assert_eq!(request(Some("99999999999999999999")).resolve(35), 4);
        assert_eq!(request(Some("-99999999999999999999")).resolve(35), 4);
        assert_eq!(request(Some("+")).resolve(35), 1);
        assert_eq!(request(Some("1e99")).resolve(35), 1);
    }

    #[test]
    fn in_range_page_is_kept() {
        let req = request(Some("2"));
        assert_eq!(req.resolve(35), 2);
        assert_eq!(req.offset(2), 10);
    }

    #[test]
    fn page_navigation() {
        let req = request(Some("2"));
        let page = Page::new(vec![1, 2, 3], 2, 23, &req);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.previous_number(), Some(1));
        assert_eq!(page.next_number(), Some(3));

        let last = Page::new(vec![1], 3, 23, &req).map(|n| n * 2);
        assert!(!last.has_next());
        assert_eq!(last.items, vec![2]);
    }

    #[test]
    fn zero_per_page_is_clamped() {
        assert_eq!(PageRequest::new(None, 0).per_page, 1);
    }
}
