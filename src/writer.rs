use std::io;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};

use crate::error::{Error, Result};

/// An [`io::Write`] sink that reports written byte counts to a running bar.
///
/// Returned by [`ProgressBar::run_with_writer`]. The bytes themselves are
/// discarded; pair it with [`io::copy`] or a tee to track a transfer:
///
/// ```rust,no_run
/// use std::io;
/// use termbar::{with_bytes, ProgressBar};
///
/// let bar = ProgressBar::new("%bytes %bar", [with_bytes()])?;
/// let data = vec![0u8; 4096];
/// if let Some((mut writer, handle)) = bar.run_with_writer(data.len() as i64) {
///     io::copy(&mut data.as_slice(), &mut writer)?;
///     handle.wait();
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// The writer is closed once the bar reaches its total, when the run is
/// stopped or by calling [`BytesWriter::close`]. Writes to a closed writer
/// fail with [`io::ErrorKind::BrokenPipe`].
///
/// [`ProgressBar::run_with_writer`]: crate::ProgressBar::run_with_writer
#[derive(Debug, Clone)]
pub struct BytesWriter {
    bytes: Sender<usize>,
    closed: Receiver<()>,
    closer: Closer,
}

impl BytesWriter {
    /// Creates a writer, the receiving end of its byte counts and the closer
    /// shared with the worker.
    pub(crate) fn channel() -> (Self, Receiver<usize>, Closer) {
        let (bytes_tx, bytes_rx) = bounded(1);
        let (signal_tx, closed_rx) = bounded(0);
        let closer = Closer {
            signal: Arc::new(Mutex::new(Some(signal_tx))),
            closed: closed_rx.clone(),
        };
        let writer = Self {
            bytes: bytes_tx,
            closed: closed_rx,
            closer: closer.clone(),
        };
        (writer, bytes_rx, closer)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.closed.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Closes the writer, failing with [`Error::AlreadyClosed`] when it was
    /// closed before.
    pub fn close(&self) -> Result<()> {
        self.closer.close()
    }

    fn report(&self, n: usize) -> Result<()> {
        if self.is_closed() {
            return Err(Error::WriterClosed);
        }
        select! {
            send(self.bytes, n) -> res => res.map_err(|_| Error::WriterClosed),
            recv(self.closed) -> _ => Err(Error::WriterClosed),
        }
    }
}

impl io::Write for BytesWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.report(buf.len())
            .map_err(|err| io::Error::new(io::ErrorKind::BrokenPipe, err))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Closes a [`BytesWriter`] exactly once.
#[derive(Debug, Clone)]
pub(crate) struct Closer {
    signal: Arc<Mutex<Option<Sender<()>>>>,
    closed: Receiver<()>,
}

impl Closer {
    /// Disconnects once the writer is closed, from either side.
    pub(crate) fn closed(&self) -> &Receiver<()> {
        &self.closed
    }

    pub(crate) fn close(&self) -> Result<()> {
        match self.signal.lock().unwrap().take() {
            Some(signal) => {
                drop(signal);
                Ok(())
            }
            None => Err(Error::AlreadyClosed),
        }
    }
}
