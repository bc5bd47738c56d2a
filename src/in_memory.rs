use std::fmt::{Debug, Formatter};
use std::io::Write;
use std::sync::{Arc, Mutex};

use vt100::Parser;

use crate::TermLike;

/// A thin wrapper around [`vt100::Parser`].
///
/// This is just an [`Arc`] around its internal state, so it can be freely cloned.
/// It interprets the escape sequences a progress bar writes, which makes it a
/// good draw target for checking what a user would actually see.
#[derive(Debug, Clone)]
pub struct InMemoryTerm {
    state: Arc<Mutex<InMemoryTermState>>,
}

impl InMemoryTerm {
    pub fn new(rows: u16, cols: u16) -> InMemoryTerm {
        assert!(rows > 0, "rows must be > 0");
        assert!(cols > 0, "cols must be > 0");
        InMemoryTerm {
            state: Arc::new(Mutex::new(InMemoryTermState::new(rows, cols))),
        }
    }

    /// The visible screen, one line per row with trailing empty rows removed.
    pub fn contents(&self) -> String {
        let state = self.state.lock().unwrap();

        // `Screen::contents` drops the row boundaries, so rebuild them row by row
        let mut rows = state
            .parser
            .screen()
            .rows(0, state.cols)
            .collect::<Vec<_>>();
        while rows.last().map_or(false, |row| row.is_empty()) {
            rows.pop();
        }
        rows.join("\n")
    }

    /// The zero based `(row, col)` of the cursor.
    pub fn cursor_position(&self) -> (u16, u16) {
        self.state.lock().unwrap().parser.screen().cursor_position()
    }

    pub fn is_cursor_hidden(&self) -> bool {
        self.state.lock().unwrap().parser.screen().hide_cursor()
    }
}

impl TermLike for InMemoryTerm {
    fn width(&self) -> u16 {
        self.state.lock().unwrap().cols
    }

    fn height(&self) -> u16 {
        self.state.lock().unwrap().rows
    }

    fn move_cursor_to(&self, row: usize, col: usize) -> std::io::Result<()> {
        self.state
            .lock()
            .unwrap()
            .write_str(&format!("\x1b[{};{}H", row + 1, col + 1))
    }

    fn hide_cursor(&self) -> std::io::Result<()> {
        self.state.lock().unwrap().write_str("\x1b[?25l")
    }

    fn show_cursor(&self) -> std::io::Result<()> {
        self.state.lock().unwrap().write_str("\x1b[?25h")
    }

    fn write_str(&self, s: &str) -> std::io::Result<()> {
        self.state.lock().unwrap().write_str(s)
    }

    fn flush(&self) -> std::io::Result<()> {
        self.state.lock().unwrap().parser.flush()
    }
}

struct InMemoryTermState {
    rows: u16,
    cols: u16,
    parser: vt100::Parser,
}

impl InMemoryTermState {
    pub(crate) fn new(rows: u16, cols: u16) -> InMemoryTermState {
        InMemoryTermState {
            rows,
            cols,
            parser: Parser::new(rows, cols, 0),
        }
    }

    pub(crate) fn write_str(&mut self, s: &str) -> std::io::Result<()> {
        self.parser.write_all(s.as_bytes())
    }
}

impl Debug for InMemoryTermState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTermState").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{with_bar_width, with_pos, ProgressBar, ProgressDrawTarget};

    #[test]
    fn line_wrapping() {
        let in_mem = InMemoryTerm::new(10, 5);
        assert_eq!(in_mem.cursor_position(), (0, 0));

        in_mem.write_str("ABCDE").unwrap();
        assert_eq!(in_mem.contents(), "ABCDE");
        assert_eq!(in_mem.cursor_position(), (0, 5));

        // Should wrap onto next line
        in_mem.write_str("FG").unwrap();
        assert_eq!(in_mem.contents(), "ABCDE\nFG");
        assert_eq!(in_mem.cursor_position(), (1, 2));
    }

    #[test]
    fn carriage_return_overwrites_line() {
        let in_mem = InMemoryTerm::new(4, 20);
        in_mem.write_str("first frame").unwrap();
        in_mem.carriage_return().unwrap();
        in_mem.write_str("second").unwrap();
        in_mem.clear_to_end_of_line().unwrap();
        assert_eq!(in_mem.contents(), "second");
    }

    #[test]
    fn absolute_positioning() {
        let in_mem = InMemoryTerm::new(5, 10);
        in_mem.move_cursor_to(2, 3).unwrap();
        in_mem.write_str("X").unwrap();
        assert_eq!(in_mem.contents(), "\n\n   X");
        assert_eq!(in_mem.cursor_position(), (2, 4));
    }

    #[test]
    fn cursor_visibility() {
        let in_mem = InMemoryTerm::new(2, 2);
        assert!(!in_mem.is_cursor_hidden());
        in_mem.hide_cursor().unwrap();
        assert!(in_mem.is_cursor_hidden());
        in_mem.show_cursor().unwrap();
        assert!(!in_mem.is_cursor_hidden());
    }

    #[test]
    fn basic_progress_bar() {
        let in_mem = InMemoryTerm::new(10, 80);
        let bar = ProgressBar::new("[%bar] %current/%total", [with_bar_width(10)])
            .unwrap()
            .with_draw_target(ProgressDrawTarget::term_like(Box::new(in_mem.clone())));

        let mut runner = bar.start(10).unwrap();
        assert_eq!(in_mem.contents(), "[----------] 0/10");

        runner.update(5);
        assert_eq!(in_mem.contents(), "[=====-----] 5/10");

        runner.update(10);
        assert_eq!(in_mem.contents(), "[==========] 10/10");
    }

    #[test]
    fn positioned_progress_bar() {
        let in_mem = InMemoryTerm::new(10, 40);
        let bar = ProgressBar::new("%current/%total", [with_pos(3, 2)])
            .unwrap()
            .with_draw_target(ProgressDrawTarget::term_like(Box::new(in_mem.clone())));
        bar.iterate(2, || ());
        assert_eq!(in_mem.contents(), "\n\n\n  2/2");
    }
}
