//! Fixed-size page windows over a list.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    total: usize,
    per_page: usize,
    current: usize,
}

impl Pagination {
    /// `per_page` below 1 is treated as 1; `requested` below 1 as page 1.
    pub fn new(total: usize, per_page: usize, requested: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
            current: requested.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    /// Half-open item range of the current page, clamped to the list.
    pub fn range(&self) -> Range<usize> {
        let start = (self.current - 1)
            .saturating_mul(self.per_page)
            .min(self.total);
        let end = start.saturating_add(self.per_page).min(self.total);
        start..end
    }

    pub fn is_out_of_range(&self) -> bool {
        self.total > 0 && self.current > self.page_count()
    }

    pub fn prev(&self) -> Option<usize> {
        (self.current > 1 && !self.is_out_of_range()).then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<usize> {
        (self.current < self.page_count()).then(|| self.current + 1)
    }
}
