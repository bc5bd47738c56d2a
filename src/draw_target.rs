use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::panicking;

use console::Term;
use once_cell::sync::Lazy;

use crate::TermLike;

static GLOBAL_OUTPUT_LOCK: Lazy<OutputLock> = Lazy::new(OutputLock::new);

/// Serializes frame output to a shared terminal.
///
/// Every frame (cursor placement plus text) is written while holding this
/// lock, so frames of different bars never interleave their escape sequences.
/// Bars that share a terminal must share the lock; [`OutputLock::global`] is
/// the process-wide instance used by the default draw targets.
#[derive(Clone, Debug, Default)]
pub struct OutputLock {
    inner: Arc<Mutex<()>>,
}

impl OutputLock {
    /// Creates a lock independent from every other lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide output lock.
    pub fn global() -> Self {
        GLOBAL_OUTPUT_LOCK.clone()
    }

    /// Acquires the lock for the lifetime of the returned guard.
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        // the guarded value is `()`, a poisoned lock has nothing to repair
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` while holding the lock.
    ///
    /// Use this to write to the terminal from outside a progress bar without
    /// tearing a frame that is being drawn concurrently.
    pub fn hold<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.acquire();
        f()
    }
}

/// Target for draw operations
///
/// This tells a progress bar where to paint to and which [`OutputLock`]
/// guards the destination. Cloning a draw target is cheap, every drive
/// invocation of a bar gets its own clone.
#[derive(Clone, Debug)]
pub struct ProgressDrawTarget {
    kind: TargetKind,
    lock: OutputLock,
}

impl ProgressDrawTarget {
    /// Draw to a buffered stdout terminal.
    ///
    /// This is the default draw target for progress bars. Like every
    /// [`Term`] target it stays silent when stdout is not a terminal.
    pub fn stdout() -> Self {
        Self::term(Term::buffered_stdout())
    }

    /// Draw to a buffered stderr terminal.
    pub fn stderr() -> Self {
        Self::term(Term::buffered_stderr())
    }

    /// Draw to a terminal.
    ///
    /// Progress bars are by default drawn to terminals however if the
    /// terminal is not user attended the entire progress bar will be
    /// hidden.  This is done so that piping to a file will not produce
    /// useless escape codes in that file.
    pub fn term(term: Term) -> Self {
        Self {
            kind: TargetKind::Term { term },
            lock: OutputLock::global(),
        }
    }

    /// Draw to a boxed object that implements the [`TermLike`] trait.
    pub fn term_like(term_like: Box<dyn TermLike>) -> Self {
        Self {
            kind: TargetKind::TermLike {
                inner: Arc::from(term_like),
            },
            lock: OutputLock::global(),
        }
    }

    /// A hidden draw target.
    ///
    /// This forces a progress bar to be not rendered at all.
    pub fn hidden() -> Self {
        Self {
            kind: TargetKind::Hidden,
            lock: OutputLock::global(),
        }
    }

    /// Replaces the output lock guarding this target.
    pub fn with_lock(mut self, lock: OutputLock) -> Self {
        self.lock = lock;
        self
    }

    /// Returns the output lock guarding this target.
    pub fn lock(&self) -> &OutputLock {
        &self.lock
    }

    /// Returns true if the draw target is hidden.
    pub fn is_hidden(&self) -> bool {
        match self.kind {
            TargetKind::Hidden => true,
            TargetKind::Term { ref term } => !term.is_term(),
            TargetKind::TermLike { .. } => false,
        }
    }

    /// Returns the current width of the draw target, 0 if unknown.
    pub(crate) fn width(&self) -> u16 {
        match self.kind {
            TargetKind::Term { ref term } => TermLike::width(term),
            TargetKind::TermLike { ref inner } => inner.width(),
            TargetKind::Hidden => 0,
        }
    }

    fn term_like_ref(&self) -> Option<&dyn TermLike> {
        match self.kind {
            TargetKind::Term { ref term } if term.is_term() => Some(term as &dyn TermLike),
            TargetKind::TermLike { ref inner } => Some(&**inner),
            _ => None,
        }
    }

    /// Writes one complete frame while holding the output lock.
    pub(crate) fn draw(&self, frame: &Frame) -> io::Result<()> {
        if panicking() {
            return Ok(());
        }
        let term = match self.term_like_ref() {
            Some(term) => term,
            None => return Ok(()),
        };

        let _guard = self.lock.acquire();
        match frame.position {
            Some((row, col)) => term.move_cursor_to(row, col)?,
            None => term.carriage_return()?,
        }
        term.write_str(&frame.prefix)?;
        term.write_str(&frame.bar)?;
        term.write_str(&frame.suffix)?;
        if frame.clear_tail {
            term.clear_to_end_of_line()?;
        }
        term.flush()
    }

    /// Hides the cursor of the target terminal.
    pub fn hide_cursor(&self) -> io::Result<()> {
        match self.term_like_ref() {
            Some(term) => self.lock.hold(|| {
                term.hide_cursor()?;
                term.flush()
            }),
            None => Ok(()),
        }
    }

    /// Shows the cursor of the target terminal.
    pub fn show_cursor(&self) -> io::Result<()> {
        match self.term_like_ref() {
            Some(term) => self.lock.hold(|| {
                term.show_cursor()?;
                term.flush()
            }),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug)]
enum TargetKind {
    Term { term: Term },
    TermLike { inner: Arc<dyn TermLike> },
    Hidden,
}

/// One rendered line of a progress bar, split around the bar body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) prefix: String,
    pub(crate) bar: String,
    pub(crate) suffix: String,
    /// Absolute `(row, col)` to draw at, or the start of the current line.
    pub(crate) position: Option<(usize, usize)>,
    /// Clear the rest of the line after the frame.
    pub(crate) clear_tail: bool,
}

impl Frame {
    /// The frame text without cursor movement.
    pub(crate) fn text(&self) -> String {
        let mut s = String::with_capacity(self.prefix.len() + self.bar.len() + self.suffix.len());
        s.push_str(&self.prefix);
        s.push_str(&self.bar);
        s.push_str(&self.suffix);
        s
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::thread;

    /// Records every call made on the terminal.
    #[derive(Debug, Default, Clone)]
    pub(crate) struct Recorder {
        pub(crate) calls: Arc<Mutex<Vec<String>>>,
        pub(crate) width: u16,
    }

    impl Recorder {
        pub(crate) fn with_width(width: u16) -> Self {
            Self {
                width,
                ..Self::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, s: String) -> io::Result<()> {
            self.calls.lock().unwrap().push(s);
            Ok(())
        }
    }

    impl TermLike for Recorder {
        fn width(&self) -> u16 {
            self.width
        }

        fn height(&self) -> u16 {
            24
        }

        fn move_cursor_to(&self, row: usize, col: usize) -> io::Result<()> {
            self.push(format!("goto({row},{col})"))
        }

        fn hide_cursor(&self) -> io::Result<()> {
            self.push("hide".into())
        }

        fn show_cursor(&self) -> io::Result<()> {
            self.push("show".into())
        }

        fn write_str(&self, s: &str) -> io::Result<()> {
            self.push(s.into())
        }

        fn carriage_return(&self) -> io::Result<()> {
            self.push("\r".into())
        }

        fn clear_to_end_of_line(&self) -> io::Result<()> {
            self.push("clear".into())
        }

        fn flush(&self) -> io::Result<()> {
            self.push("flush".into())
        }
    }

    fn frame(text: &str) -> Frame {
        Frame {
            prefix: text.into(),
            ..Frame::default()
        }
    }

    #[test]
    fn hidden_target_draws_nothing() {
        let target = ProgressDrawTarget::hidden();
        assert!(target.is_hidden());
        assert_eq!(target.width(), 0);
        target.draw(&frame("x")).unwrap();
    }

    #[test]
    fn frame_at_position_then_clear() {
        let rec = Recorder::with_width(40);
        let target = ProgressDrawTarget::term_like(Box::new(rec.clone()));
        let f = Frame {
            prefix: "[".into(),
            bar: "==".into(),
            suffix: "]".into(),
            position: Some((2, 3)),
            clear_tail: true,
        };
        target.draw(&f).unwrap();
        assert_eq!(
            rec.calls(),
            vec!["goto(2,3)", "[", "==", "]", "clear", "flush"]
        );
        assert_eq!(f.text(), "[==]");
    }

    #[test]
    fn frames_sharing_a_lock_do_not_interleave() {
        let rec = Recorder::with_width(40);
        let lock = OutputLock::new();
        let handles: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let target =
                    ProgressDrawTarget::term_like(Box::new(rec.clone())).with_lock(lock.clone());
                thread::spawn(move || {
                    for _ in 0..50 {
                        target
                            .draw(&Frame {
                                prefix: name.into(),
                                bar: name.into(),
                                suffix: name.into(),
                                ..Frame::default()
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let calls = rec.calls();
        assert_eq!(calls.len(), 3 * 50 * 5);
        for chunk in calls.chunks(5) {
            assert_eq!(chunk[0], "\r");
            assert_eq!(chunk[1], chunk[2]);
            assert_eq!(chunk[2], chunk[3]);
            assert_eq!(chunk[4], "flush");
        }
    }
}
