use std::cmp::Ordering;

use crate::models::LoanRow;

/// Column the loan table is ordered by.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum SortColumn {
    #[default]
    Id,
    Student,
    Book,
    BorrowDate,
    ReturnDate,
    Fine,
}

impl SortColumn {
    pub(crate) fn next(self) -> Self {
        match self {
            SortColumn::Id => SortColumn::Student,
            SortColumn::Student => SortColumn::Book,
            SortColumn::Book => SortColumn::BorrowDate,
            SortColumn::BorrowDate => SortColumn::ReturnDate,
            SortColumn::ReturnDate => SortColumn::Fine,
            SortColumn::Fine => SortColumn::Id,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            SortColumn::Id => "ID",
            SortColumn::Student => "Student",
            SortColumn::Book => "Book",
            SortColumn::BorrowDate => "Borrow Date",
            SortColumn::ReturnDate => "Return Date",
            SortColumn::Fine => "Fine",
        }
    }

    fn compare(self, a: &LoanRow, b: &LoanRow) -> Ordering {
        match self {
            SortColumn::Id => a.id.cmp(&b.id),
            SortColumn::Student => a
                .borrower_name
                .to_lowercase()
                .cmp(&b.borrower_name.to_lowercase()),
            SortColumn::Book => a
                .item_title
                .to_lowercase()
                .cmp(&b.item_title.to_lowercase()),
            SortColumn::BorrowDate => a.borrow_date.cmp(&b.borrow_date),
            SortColumn::ReturnDate => a.return_date.cmp(&b.return_date),
            SortColumn::Fine => a.fine.total_cmp(&b.fine),
        }
    }
}

/// Loan records as last fetched, plus the search and ordering the user has
/// applied on top.
pub(crate) struct LoanTable {
    pub(crate) rows: Vec<LoanRow>,
    pub(crate) visible: Vec<LoanRow>,
    pub(crate) filter: Option<String>,
    pub(crate) sort: SortColumn,
    pub(crate) descending: bool,
    pub(crate) selected: usize,
}

impl Default for LoanTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LoanTable {
    pub(crate) fn new(rows: Vec<LoanRow>) -> Self {
        let mut table = Self {
            rows,
            visible: Vec::new(),
            filter: None,
            sort: SortColumn::Id,
            descending: true,
            selected: 0,
        };
        table.apply_view();
        table
    }

    /// Rebuild `visible` from `rows`: filter first, then order. Ties keep the
    /// fetch order because the sort is stable.
    pub(crate) fn apply_view(&mut self) {
        let query = self.filter.as_deref().unwrap_or("").trim();
        let mut visible: Vec<LoanRow> = self
            .rows
            .iter()
            .filter(|row| row.matches_search(query))
            .cloned()
            .collect();

        let column = self.sort;
        let descending = self.descending;
        visible.sort_by(|a, b| {
            let ordering = column.compare(a, b);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        self.visible = visible;
        self.ensure_in_bounds();
    }

    pub(crate) fn set_rows(&mut self, rows: Vec<LoanRow>) {
        self.rows = rows;
        self.apply_view();
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_view();
    }

    pub(crate) fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.apply_view();
    }

    pub(crate) fn toggle_direction(&mut self) {
        self.descending = !self.descending;
        self.apply_view();
    }

    pub(crate) fn current_row(&self) -> Option<&LoanRow> {
        self.visible.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }
}
