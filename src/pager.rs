use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct Pager {
    page: usize, // 1-indexed
    page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, nrows: usize) -> usize {
        nrows.div_ceil(self.page_size)
    }

    pub fn has_next(&self, nrows: usize) -> bool {
        self.page < self.total_pages(nrows)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Returns false if already on the last page.
    pub fn next(&mut self, nrows: usize) -> bool {
        if self.has_next(nrows) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Returns false if already on the first page.
    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Row positions shown on the current page. Empty once the page lies
    /// behind the last row, the page number itself is left alone.
    pub fn range(&self, nrows: usize) -> Range<usize> {
        let begin = std::cmp::min((self.page - 1) * self.page_size, nrows);
        let end = std::cmp::min(self.page * self.page_size, nrows);
        begin..end
    }
}
