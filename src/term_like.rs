use std::fmt::Debug;
use std::io;

use console::Term;

/// A trait for minimal terminal-like behavior.
///
/// This is everything a progress bar needs from the console: its geometry,
/// cursor placement and a way to write text. Anything that implements this
/// trait can be used as a draw target via [`ProgressDrawTarget::term_like`].
///
/// [`ProgressDrawTarget::term_like`]: crate::ProgressDrawTarget::term_like
pub trait TermLike: Debug + Send + Sync {
    /// Return the terminal width, or 0 when it cannot be determined
    fn width(&self) -> u16;
    /// Return the terminal height, or 0 when it cannot be determined
    fn height(&self) -> u16 {
        0
    }

    /// Move the cursor to the zero based `row` and `col`
    fn move_cursor_to(&self, row: usize, col: usize) -> io::Result<()>;
    fn hide_cursor(&self) -> io::Result<()>;
    fn show_cursor(&self) -> io::Result<()>;

    /// Write a string
    fn write_str(&self, s: &str) -> io::Result<()>;
    /// Move the cursor back to the start of the current line
    fn carriage_return(&self) -> io::Result<()> {
        self.write_str("\r")
    }
    /// Clear from the cursor to the end of the line
    fn clear_to_end_of_line(&self) -> io::Result<()> {
        self.write_str("\x1b[K")
    }

    fn flush(&self) -> io::Result<()>;
}

impl TermLike for Term {
    fn width(&self) -> u16 {
        self.size_checked().map_or(0, |(_, cols)| cols)
    }

    fn height(&self) -> u16 {
        self.size_checked().map_or(0, |(rows, _)| rows)
    }

    fn move_cursor_to(&self, row: usize, col: usize) -> io::Result<()> {
        Term::move_cursor_to(self, col, row)
    }

    fn hide_cursor(&self) -> io::Result<()> {
        Term::hide_cursor(self)
    }

    fn show_cursor(&self) -> io::Result<()> {
        Term::show_cursor(self)
    }

    fn write_str(&self, s: &str) -> io::Result<()> {
        Term::write_str(self, s)
    }

    fn flush(&self) -> io::Result<()> {
        Term::flush(self)
    }
}
