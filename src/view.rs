use tracing::trace;

use crate::filter::{self, FilterMode, FilterState};
use crate::pager::Pager;
use crate::sort::SortState;
use crate::table::{Record, discover_columns, row_cells};

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView {
    pub columns: Vec<String>,
    /// Indices into the raw records, filtered and sorted, all pages
    pub rows: Vec<usize>,
    /// Cell text of the rows on the current page
    pub page_rows: Vec<Vec<String>>,
    pub page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl DerivedView {
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// The current page lies behind the last page.
    pub fn is_page_out_of_range(&self) -> bool {
        self.page_rows.is_empty() && !self.rows.is_empty()
    }
}

/// Filters `raw`, sorts the survivors and cuts out the current page.
pub fn derive_view(
    raw: &[Record],
    filters: &FilterState,
    mode: FilterMode,
    sort: &SortState,
    pager: &Pager,
) -> DerivedView {
    let columns = discover_columns(raw);
    let mut rows = filter::apply(raw, filters, mode);
    sort.apply(raw, &mut rows);

    let range = pager.range(rows.len());
    let page_rows = rows[range]
        .iter()
        .map(|&idx| row_cells(&raw[idx], &columns))
        .collect();

    let view = DerivedView {
        columns,
        page: pager.page(),
        total_pages: pager.total_pages(rows.len()),
        has_previous: pager.has_previous(),
        has_next: pager.has_next(rows.len()),
        rows,
        page_rows,
    };
    trace!(
        "Derived view: {} rows, page {}/{}",
        view.nrows(),
        view.page,
        view.total_pages
    );
    view
}
