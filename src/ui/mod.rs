//! Ratatui front-end: one dashboard screen with counters, the loan table and
//! modal borrow/delete forms.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
