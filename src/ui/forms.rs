use chrono::NaiveDate;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::error::LedgerError;
use crate::models::{Item, NewLoan};
use crate::validation::{parse_date, validate_record_id, LoanRequest};

/// Date format shown in and accepted by the date fields.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Internal representation of the borrow form fields.
#[derive(Clone)]
pub(crate) struct LoanForm {
    pub(crate) borrower: String,
    /// Index into the list of available books.
    pub(crate) item_index: usize,
    pub(crate) borrow_date: String,
    pub(crate) return_date: String,
    pub(crate) active: LoanField,
    pub(crate) error: Option<String>,
}

/// Fields available within the borrow form.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum LoanField {
    #[default]
    Borrower,
    Book,
    BorrowDate,
    ReturnDate,
}

impl LoanField {
    /// Label printed in front of the field value.
    pub(crate) fn label(self) -> &'static str {
        match self {
            LoanField::Borrower => "Student Name",
            LoanField::Book => "Select Book",
            LoanField::BorrowDate => "Borrow Date",
            LoanField::ReturnDate => "Return Date",
        }
    }

    fn next(self) -> Self {
        match self {
            LoanField::Borrower => LoanField::Book,
            LoanField::Book => LoanField::BorrowDate,
            LoanField::BorrowDate => LoanField::ReturnDate,
            LoanField::ReturnDate => LoanField::Borrower,
        }
    }

    fn previous(self) -> Self {
        match self {
            LoanField::Borrower => LoanField::ReturnDate,
            LoanField::Book => LoanField::Borrower,
            LoanField::BorrowDate => LoanField::Book,
            LoanField::ReturnDate => LoanField::BorrowDate,
        }
    }
}

impl LoanForm {
    /// A blank form with both dates set to `today`.
    pub(crate) fn new(today: NaiveDate) -> Self {
        let today = today.format(DATE_FORMAT).to_string();
        Self {
            borrower: String::new(),
            item_index: 0,
            borrow_date: today.clone(),
            return_date: today,
            active: LoanField::Borrower,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    /// Step through the available books, wrapping at either end.
    pub(crate) fn cycle_item(&mut self, offset: isize, count: usize) {
        if count == 0 {
            self.item_index = 0;
            return;
        }
        let count = count as isize;
        let current = (self.item_index as isize).min(count - 1);
        self.item_index = (current + offset).rem_euclid(count) as usize;
    }

    /// The book the form currently points at, if any is on offer.
    pub(crate) fn selected_item<'a>(&self, items: &'a [Item]) -> Option<&'a Item> {
        if items.is_empty() {
            None
        } else {
            items.get(self.item_index.min(items.len() - 1))
        }
    }

    /// Append a character to the active field. Date fields only take digits
    /// and dashes; the book field is driven by the arrow keys.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            LoanField::Borrower => {
                self.borrower.push(ch);
                true
            }
            LoanField::Book => false,
            LoanField::BorrowDate | LoanField::ReturnDate => {
                if ch.is_ascii_digit() || ch == '-' {
                    self.date_field_mut().push(ch);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoanField::Borrower => {
                self.borrower.pop();
            }
            LoanField::Book => {}
            LoanField::BorrowDate | LoanField::ReturnDate => {
                self.date_field_mut().pop();
            }
        }
    }

    fn date_field_mut(&mut self) -> &mut String {
        if self.active == LoanField::ReturnDate {
            &mut self.return_date
        } else {
            &mut self.borrow_date
        }
    }

    /// Validate the inputs and return a loan ready for persistence.
    pub(crate) fn parse_inputs(&self, items: &[Item], today: NaiveDate) -> Result<NewLoan, LedgerError> {
        let borrow_date = parse_date(LoanField::BorrowDate.label(), &self.borrow_date)?;
        let return_date = parse_date(LoanField::ReturnDate.label(), &self.return_date)?;
        LoanRequest {
            borrower: self.borrower.clone(),
            item_id: self.selected_item(items).map(|item| item.id),
            borrow_date,
            return_date,
        }
        .validate(today)
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: LoanField, items: &[Item]) -> Line<'static> {
        let is_active = self.active == field;
        let (display, placeholder) = match field {
            LoanField::Borrower => (self.borrower.clone(), "<required>"),
            LoanField::Book => match self.selected_item(items) {
                Some(item) => (
                    format!("< {} ({} left) >", item.title, item.quantity),
                    "",
                ),
                None => (String::new(), "No books available to borrow."),
            },
            LoanField::BorrowDate => (self.borrow_date.clone(), "YYYY-MM-DD"),
            LoanField::ReturnDate => (self.return_date.clone(), "YYYY-MM-DD"),
        };

        let (text, style) = if display.is_empty() {
            (placeholder.to_string(), Style::default().fg(Color::DarkGray))
        } else if is_active {
            (display, Style::default().fg(Color::Yellow))
        } else {
            (display, Style::default())
        };

        let label_style = if is_active {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::styled(format!("{}: ", field.label()), label_style),
            Span::styled(text, style),
        ])
    }

    /// Cursor column offset for the active text field.
    pub(crate) fn value_len(&self, field: LoanField) -> usize {
        match field {
            LoanField::Borrower => self.borrower.chars().count(),
            LoanField::Book => 0,
            LoanField::BorrowDate => self.borrow_date.chars().count(),
            LoanField::ReturnDate => self.return_date.chars().count(),
        }
    }
}

/// Record id entry for the delete control.
#[derive(Default, Clone)]
pub(crate) struct DeleteForm {
    pub(crate) record_id: String,
    pub(crate) error: Option<String>,
}

impl DeleteForm {
    /// Prefill with the id of the highlighted table row.
    pub(crate) fn with_record(record_id: Option<i64>) -> Self {
        Self {
            record_id: record_id.map(|id| id.to_string()).unwrap_or_default(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_ascii_digit() {
            self.record_id.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.record_id.pop();
    }

    /// An empty field counts as zero, which is rejected like any other
    /// non-positive id.
    pub(crate) fn parse_inputs(&self) -> Result<i64, LedgerError> {
        let raw = self.record_id.trim();
        let id = if raw.is_empty() {
            0
        } else {
            raw.parse::<i64>().map_err(|_| LedgerError::InvalidRecordId)?
        };
        validate_record_id(id)
    }
}
