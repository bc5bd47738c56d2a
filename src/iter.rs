use std::iter::FusedIterator;

use crossbeam_channel::{bounded, Receiver};

use crate::progress_bar::StopHandle;

/// The values of a progress bar run, yielded from 0 to the total.
///
/// Returned by [`ProgressBar::iter`](crate::ProgressBar::iter). Every value is
/// drawn before it is yielded, so consuming the iterator moves the bar. The
/// run is cancelled when the iterator is dropped or [`stop`](Self::stop)ped
/// early.
#[derive(Debug)]
#[must_use = "iterators are lazy and dropping this one stops the run"]
pub struct ProgressIter {
    items: Receiver<i64>,
    handle: Option<StopHandle>,
}

impl ProgressIter {
    pub(crate) fn new(items: Receiver<i64>, handle: StopHandle) -> Self {
        Self {
            items,
            handle: Some(handle),
        }
    }

    /// An iterator yielding nothing.
    pub(crate) fn empty() -> Self {
        let (_, items) = bounded(0);
        Self {
            items,
            handle: None,
        }
    }

    /// Cancels the run and waits for its worker to exit.
    pub fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

impl Iterator for ProgressIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        self.items.recv().ok()
    }
}

impl FusedIterator for ProgressIter {}
