use std::mem;

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{debug, error};

use crate::config;
use crate::db::{create_loan, delete_loan, fetch_available_items, fetch_loans, fetch_stats, Store};
use crate::models::{format_money, Item, LedgerStats};

use super::forms::{DeleteForm, LoanField, LoanForm};
use super::helpers::{
    centered_rect, header_style, overdue_style, stat_card, surface_error, BACKGROUND,
};
use super::screens::LoanTable;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the row of statistic cards.
const STATS_HEIGHT: u16 = 4;
/// Rows skipped by PageUp/PageDown in the loan table.
const PAGE_STEP: isize = 5;

/// What the keyboard is currently driving.
enum Mode {
    Normal,
    Borrowing(LoanForm),
    Deleting(DeleteForm),
    Searching(SearchState),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Dashboard state. Everything shown on screen is a read model that
/// [`App::refresh`] rebuilds from the store after each write; the store itself
/// is only touched through short-lived connections.
pub struct App {
    store: Store,
    clock: fn() -> NaiveDate,
    stats: LedgerStats,
    available: Vec<Item>,
    table: LoanTable,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the dashboard on the local calendar and load the first read model.
    pub fn new(store: Store) -> Result<Self> {
        Self::with_clock(store, config::today)
    }

    /// Same as [`App::new`] with a custom source for "today".
    pub fn with_clock(store: Store, clock: fn() -> NaiveDate) -> Result<Self> {
        let mut app = Self {
            store,
            clock,
            stats: LedgerStats::default(),
            available: Vec::new(),
            table: LoanTable::default(),
            mode: Mode::Normal,
            status: None,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Borrowing(form) => self.handle_borrow(code, form),
            Mode::Deleting(form) => self.handle_delete(code, form),
            Mode::Searching(state) => self.handle_search(code, state),
        };

        Ok(exit)
    }

    /// Ctrl+L empties the borrow form, mirroring a "Clear Form" button.
    pub(crate) fn handle_ctrl_l(&mut self) {
        if let Mode::Borrowing(form) = &mut self.mode {
            *form = LoanForm::new((self.clock)());
            self.set_status("Form cleared.", StatusKind::Info);
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.table.move_selection(-1),
            KeyCode::Down => self.table.move_selection(1),
            KeyCode::PageUp => self.table.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.table.move_selection(PAGE_STEP),
            KeyCode::Home => self.table.select_first(),
            KeyCode::End => self.table.select_last(),
            KeyCode::Char('+') | KeyCode::Char('b') => {
                self.clear_status();
                return Mode::Borrowing(LoanForm::new((self.clock)()));
            }
            KeyCode::Char('-') | KeyCode::Char('d') => {
                self.clear_status();
                let selected = self.table.current_row().map(|row| row.id);
                return Mode::Deleting(DeleteForm::with_record(selected));
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                let query = self.table.filter.clone().unwrap_or_default();
                return Mode::Searching(SearchState { query });
            }
            KeyCode::Char('o') => {
                self.table.cycle_sort();
                self.set_status(
                    format!("Sorted by {}.", self.table.sort.label()),
                    StatusKind::Info,
                );
            }
            KeyCode::Char('r') => self.table.toggle_direction(),
            KeyCode::F(5) => match self.refresh() {
                Ok(()) => self.set_status("Refreshed.", StatusKind::Info),
                Err(err) => self.report_failure(&err),
            },
            _ => {}
        }
        Mode::Normal
    }

    fn handle_borrow(&mut self, code: KeyCode, mut form: LoanForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Borrow cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left if form.active == LoanField::Book => {
                form.cycle_item(-1, self.available.len())
            }
            KeyCode::Right if form.active == LoanField::Book => {
                form.cycle_item(1, self.available.len())
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_loan(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::Borrowing(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_delete(&mut self, code: KeyCode, mut form: DeleteForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.perform_delete(&form) {
                Ok(true) => keep_open = false,
                Ok(false) => {
                    let message = "Record ID not found.".to_string();
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Mode::Deleting(form)
        } else {
            Mode::Normal
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.table.set_filter(None);
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => {
                self.table.move_selection(-1);
                return Mode::Searching(state);
            }
            KeyCode::Down => {
                self.table.move_selection(1);
                return Mode::Searching(state);
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }

        if state.query.trim().is_empty() {
            self.table.set_filter(None);
        } else {
            self.table.set_filter(Some(state.query.clone()));
        }
        Mode::Searching(state)
    }

    fn save_new_loan(&mut self, form: &LoanForm) -> Result<()> {
        let today = (self.clock)();
        let loan = form.parse_inputs(&self.available, today)?;
        let title = form
            .selected_item(&self.available)
            .map(|item| item.title.clone())
            .unwrap_or_default();

        let mut conn = self.store.connect()?;
        create_loan(&mut conn, &loan, today)?;
        self.after_write(
            &conn,
            today,
            format!("'{title}' borrowed for {}.", loan.borrower_name),
        );
        Ok(())
    }

    fn perform_delete(&mut self, form: &DeleteForm) -> Result<bool> {
        let record_id = form.parse_inputs()?;
        let mut conn = self.store.connect()?;
        if !delete_loan(&mut conn, record_id)? {
            return Ok(false);
        }
        self.after_write(&conn, (self.clock)(), format!("Record {record_id} deleted."));
        Ok(true)
    }

    /// Reload after a committed write. The write stands even when the reload
    /// fails, so the failure is reported next to the success message instead of
    /// being returned to the form.
    fn after_write(&mut self, conn: &Connection, today: NaiveDate, done: String) {
        match self.refresh_with(conn, today) {
            Ok(()) => self.set_status(done, StatusKind::Info),
            Err(err) => {
                error!("{err:#}");
                self.set_status(
                    format!("{done} Reload failed: {}", surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    /// Reload counters, available books and loan rows from the store.
    pub fn refresh(&mut self) -> Result<()> {
        let conn = self.store.connect()?;
        self.refresh_with(&conn, (self.clock)())
    }

    fn refresh_with(&mut self, conn: &Connection, today: NaiveDate) -> Result<()> {
        self.stats = fetch_stats(conn, today)?;
        self.available = fetch_available_items(conn)?;
        self.table.set_rows(fetch_loans(conn, "")?);
        debug!(rows = self.table.rows.len(), "refreshed dashboard");
        Ok(())
    }

    fn report_failure(&mut self, err: &anyhow::Error) {
        error!("{err:#}");
        self.set_status(surface_error(err), StatusKind::Error);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(
            Block::default().style(Style::default().bg(BACKGROUND)),
            area,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(STATS_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        let title = Paragraph::new(Line::from(Span::styled(
            "Library Management System",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(title, chunks[0]);

        self.draw_stats(frame, chunks[1]);
        self.draw_loan_table(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);

        match &self.mode {
            Mode::Borrowing(form) => self.draw_loan_form(frame, area, form),
            Mode::Deleting(form) => self.draw_delete_form(frame, area, form),
            Mode::Searching(state) => self.draw_search_bar(frame, chunks[2], state),
            Mode::Normal => {}
        }
    }

    fn draw_stats(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        let cards = [
            ("Total Available Books", self.stats.total_available.to_string()),
            ("Borrowed Records", self.stats.total_borrowed.to_string()),
            ("Overdue", self.stats.overdue_count.to_string()),
            ("Total Fines (R)", format_money(self.stats.total_fines)),
        ];
        for ((label, value), column) in cards.into_iter().zip(columns.iter()) {
            frame.render_widget(stat_card(label, value), *column);
        }
    }

    fn draw_loan_table(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Borrowed Books");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let direction = if self.table.descending { "desc" } else { "asc" };
        let mut summary = vec![
            Span::raw(format!("Total Records: {}", self.table.visible.len())),
            Span::styled(
                format!("   sorted by {} ({direction})", self.table.sort.label()),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if let Some(filter) = &self.table.filter {
            summary.push(Span::styled(
                format!("   search: \"{filter}\""),
                Style::default().fg(Color::Yellow),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(summary)), chunks[0]);

        if self.table.visible.is_empty() {
            let message = Paragraph::new("No records to show.").alignment(Alignment::Center);
            frame.render_widget(message, chunks[1]);
            return;
        }

        let today = (self.clock)();
        let header = Row::new(["ID", "Student", "Book", "Borrow Date", "Return Date", "Fine"])
            .style(header_style());
        let rows = self.table.visible.iter().map(|loan| {
            let row = Row::new(vec![
                Cell::from(loan.id.to_string()),
                Cell::from(loan.borrower_name.clone()),
                Cell::from(loan.item_title.clone()),
                Cell::from(loan.borrow_date.to_string()),
                Cell::from(loan.return_date.to_string()),
                Cell::from(format_money(loan.fine)),
            ]);
            if loan.is_overdue(today) {
                row.style(overdue_style())
            } else {
                row
            }
        });
        let widths = [
            Constraint::Length(5),
            Constraint::Min(14),
            Constraint::Min(18),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(9),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(Some(self.table.selected));
        frame.render_stateful_widget(table, chunks[1], &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match &self.mode {
            Mode::Borrowing(_) => &[
                ("[Tab]", " Next Field   "),
                ("[←→]", " Choose Book   "),
                ("[Enter]", " Add   "),
                ("[Ctrl+L]", " Clear Form   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::Deleting(_) => &[("[Enter]", " Delete   "), ("[Esc]", " Cancel")],
            Mode::Searching(_) => &[
                ("[↑↓]", " Select   "),
                ("[Enter]", " Keep Search   "),
                ("[Esc]", " Clear Search"),
            ],
            Mode::Normal => &[
                ("[↑↓]", " Select   "),
                ("[+]", " Borrow   "),
                ("[-]", " Delete   "),
                ("[f]", " Search   "),
                ("[o]", " Sort   "),
                ("[r]", " Reverse   "),
                ("[F5]", " Refresh   "),
                ("[q]", " Quit"),
            ],
        };

        let spans = hints
            .iter()
            .flat_map(|(key, action)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(action.to_string()),
                ]
            })
            .collect::<Vec<_>>();
        Line::from(spans)
    }

    fn draw_loan_form(&self, frame: &mut Frame, area: Rect, form: &LoanForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Borrow Book Form")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let fields = [
            LoanField::Borrower,
            LoanField::Book,
            LoanField::BorrowDate,
            LoanField::ReturnDate,
        ];
        let mut lines: Vec<Line> = fields
            .iter()
            .map(|field| form.build_line(*field, &self.available))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to add • Tab to switch • Ctrl+L to clear • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if form.active != LoanField::Book {
            let row = fields
                .iter()
                .position(|field| *field == form.active)
                .unwrap_or(0) as u16;
            let prefix = format!("{}: ", form.active.label()).len() as u16;
            frame.set_cursor_position((
                inner.x + prefix + form.value_len(form.active) as u16,
                inner.y + row,
            ));
        }
    }

    fn draw_delete_form(&self, frame: &mut Frame, area: Rect, form: &DeleteForm) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Delete a record")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let display = if form.record_id.is_empty() {
            Span::styled("<required>", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(form.record_id.clone(), Style::default().fg(Color::Yellow))
        };
        let mut lines = vec![
            Line::from(vec![Span::raw("Record ID to delete: "), display]),
            Line::from(""),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to delete • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let prefix = "Record ID to delete: ".len() as u16;
        frame.set_cursor_position((
            inner.x + prefix + form.record_id.chars().count() as u16,
            inner.y,
        ));
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Search by student or book");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }
}
