use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::config::{Config, Modifier, DEFAULT_BAR_FORMAT, DEFAULT_UNCERTAIN_FORMAT};
use crate::draw_target::ProgressDrawTarget;
use crate::error::{Error, Result};
use crate::iter::ProgressIter;
use crate::state::{BarState, Context};
use crate::token::{Token, TokenRegistry};
use crate::writer::{BytesWriter, Closer};

/// Tick period used by [`ProgressBar::run`] when none is given.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// The bar used by the free function [`iterate`].
pub static DEFAULT_BAR: Lazy<ProgressBar> = Lazy::new(|| {
    ProgressBar::from_config(
        Config {
            format: DEFAULT_BAR_FORMAT.into(),
            ..Config::default_bar()
        },
        TokenRegistry::new(),
    )
});

/// The bar used by the free function [`go`].
pub static DEFAULT_UNCERTAIN_BAR: Lazy<ProgressBar> = Lazy::new(|| {
    ProgressBar::from_config(
        Config {
            format: DEFAULT_UNCERTAIN_FORMAT.into(),
            ..Config::default_uncertain_bar()
        },
        TokenRegistry::new(),
    )
});

/// A progress bar
///
/// The bar itself only holds configuration: its format, style and tokens.
/// Progress happens in runs started by the drive operations ([`iter`],
/// [`run`], [`run_with_writer`], [`start`]), each working on its own
/// snapshot of the bar. Cloning a bar just increments a refcount, the clones
/// share configuration.
///
/// ```rust,no_run
/// use termbar::{with_bar_width, ProgressBar};
///
/// let bar = ProgressBar::new("[%bar] %current/%total", [with_bar_width(40)])?;
/// bar.iterate(100, || std::thread::sleep(std::time::Duration::from_millis(10)));
/// # Ok::<(), termbar::Error>(())
/// ```
///
/// [`iter`]: ProgressBar::iter
/// [`run`]: ProgressBar::run
/// [`run_with_writer`]: ProgressBar::run_with_writer
/// [`start`]: ProgressBar::start
#[derive(Clone)]
pub struct ProgressBar {
    state: Arc<Mutex<BarState>>,
}

impl fmt::Debug for ProgressBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressBar").finish()
    }
}

impl ProgressBar {
    /// Creates a bar drawing `format` with the built-in tokens.
    ///
    /// The bar draws to stdout. Fails with [`Error::EmptyFormat`] when
    /// `format` is empty.
    pub fn new(format: &str, modifiers: impl IntoIterator<Item = Modifier>) -> Result<Self> {
        Self::with_registry(format, TokenRegistry::new(), modifiers)
    }

    /// Creates a bar parsing `format` against a custom token registry.
    pub fn with_registry(
        format: &str,
        registry: TokenRegistry,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> Result<Self> {
        if format.is_empty() {
            return Err(Error::EmptyFormat);
        }
        let mut config = Config::default();
        for modifier in modifiers {
            modifier.apply(&mut config);
        }
        config.format = format.to_owned();
        Ok(Self::from_config(config, registry))
    }

    fn from_config(mut config: Config, registry: TokenRegistry) -> Self {
        config.normalize();
        ProgressBar {
            state: Arc::new(Mutex::new(BarState::new(
                config,
                registry,
                ProgressDrawTarget::stdout(),
            ))),
        }
    }

    /// A convenience builder-like function for a bar with a given draw target
    pub fn with_draw_target(self, target: ProgressDrawTarget) -> Self {
        self.set_draw_target(target);
        self
    }

    /// Sets the draw target used by runs started afterwards.
    pub fn set_draw_target(&self, target: ProgressDrawTarget) {
        self.state().draw_target = target;
    }

    /// Applies `modifiers` to the configuration.
    ///
    /// The template is reparsed when the format changed. A modifier leaving
    /// the format empty keeps the previous one. Runs already in progress keep
    /// the configuration they started with.
    pub fn update(&self, modifiers: impl IntoIterator<Item = Modifier>) {
        let mut guard = self.state();
        let state = &mut *guard;
        let previous = state.config.format.clone();
        for modifier in modifiers {
            modifier.apply(&mut state.config);
        }
        if state.config.format.is_empty() {
            state.config.format = previous.clone();
        }
        state.config.normalize();
        if state.config.format != previous {
            debug!(format = %state.config.format, "format changed");
            state.template = state.registry.parse(&state.config.format);
        }
    }

    /// Registers `token` with this bar's registry and reparses the format.
    pub fn register(&self, name: &str, token: impl Token + 'static) {
        let mut guard = self.state();
        let state = &mut *guard;
        state.registry.register(name, token);
        state.template = state.registry.parse(&state.config.format);
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> Config {
        self.state().config.clone()
    }

    pub fn is_uncertain(&self) -> bool {
        self.state().config.uncertain
    }

    /// Iterates from 0 to `n` inclusive, drawing each value before yielding
    /// it.
    ///
    /// Uncertain bars yield nothing; see [`try_iter`](Self::try_iter) for the
    /// reason.
    pub fn iter(&self, n: i64) -> ProgressIter {
        self.try_iter(n).unwrap_or_else(|_| ProgressIter::empty())
    }

    /// Like [`iter`](Self::iter) but fails with [`Error::ModeMismatch`] on
    /// uncertain bars.
    pub fn try_iter(&self, n: i64) -> Result<ProgressIter> {
        let ctx = self.context("iter", false, false, n)?;
        if n < 0 {
            return Ok(ProgressIter::empty());
        }
        let (items_tx, items_rx) = bounded(0);
        let (stop_tx, stop_rx) = bounded(0);
        let worker = thread::spawn(move || iterate_worker(ctx, items_tx, stop_rx));
        Ok(ProgressIter::new(items_rx, StopHandle::new(stop_tx, worker)))
    }

    /// Calls `f` `n` times, moving the bar from 0 to `n`.
    ///
    /// Does nothing when `n` is not positive or the bar is uncertain.
    pub fn iterate(&self, n: i64, mut f: impl FnMut()) {
        if n <= 0 {
            return;
        }
        for i in self.iter(n) {
            if i < n {
                f();
            }
        }
    }

    /// Animates an uncertain bar every `period` until stopped.
    ///
    /// A zero period means [`DEFAULT_TICK`]. Returns `None` for certain bars.
    #[must_use = "dropping the handle stops the run"]
    pub fn run(&self, period: Duration) -> Option<StopHandle> {
        self.try_run(period).ok()
    }

    /// Like [`run`](Self::run) but fails with [`Error::ModeMismatch`] on
    /// certain bars.
    pub fn try_run(&self, period: Duration) -> Result<StopHandle> {
        let ctx = self.context("run", true, false, 0)?;
        let period = if period.is_zero() { DEFAULT_TICK } else { period };
        let (stop_tx, stop_rx) = bounded(0);
        let worker = thread::spawn(move || periodic_worker(ctx, period, stop_rx));
        Ok(StopHandle::new(stop_tx, worker))
    }

    /// Starts a byte counting run of `total` bytes.
    ///
    /// Every write to the returned [`BytesWriter`] advances the bar by the
    /// number of bytes written. Returns `None` unless the bar is certain and
    /// counts bytes.
    #[must_use = "dropping the handle stops the run"]
    pub fn run_with_writer(&self, total: i64) -> Option<(BytesWriter, StopHandle)> {
        self.try_run_with_writer(total).ok()
    }

    /// Like [`run_with_writer`](Self::run_with_writer) but fails with
    /// [`Error::ModeMismatch`] on bars in the wrong mode.
    pub fn try_run_with_writer(&self, total: i64) -> Result<(BytesWriter, StopHandle)> {
        let ctx = self.context("run_with_writer", false, true, total)?;
        let (writer, bytes, closer) = BytesWriter::channel();
        let (stop_tx, stop_rx) = bounded(0);
        let worker = thread::spawn(move || bytes_worker(ctx, bytes, closer, stop_rx));
        Ok((writer, StopHandle::new(stop_tx, worker)))
    }

    /// Starts a manually updated run of `n` steps and draws its first frame.
    ///
    /// Fails with [`Error::ModeMismatch`] on uncertain bars.
    pub fn start(&self, n: i64) -> Result<Runner> {
        let mut ctx = self.context("start", false, false, n)?;
        debug!(total = n, "manual run started");
        ctx.draw();
        Ok(Runner { ctx })
    }

    /// Animates an uncertain bar while `f` runs.
    ///
    /// # Panics
    ///
    /// Panics if the bar is not uncertain.
    pub fn go<R>(&self, f: impl FnOnce() -> R) -> R {
        let handle = match self.try_run(Duration::ZERO) {
            Ok(handle) => handle,
            Err(_) => panic!("progress bar is not uncertain"),
        };
        let result = f();
        handle.stop();
        result
    }

    /// Checks the bar's mode and snapshots it for a run of `total` steps.
    fn context(
        &self,
        operation: &'static str,
        uncertain: bool,
        bytes: bool,
        total: i64,
    ) -> Result<Context> {
        let state = self.state();
        let config = &state.config;
        let expected = match (uncertain, bytes) {
            (true, _) => "an uncertain",
            (false, true) => "a certain byte counting",
            (false, false) => "a certain",
        };
        if config.uncertain != uncertain || (bytes && !config.bytes) {
            return Err(Error::ModeMismatch { operation, expected });
        }
        Ok(state.context(total))
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, BarState> {
        self.state.lock().unwrap()
    }
}

/// Calls `f` `n` times while [`DEFAULT_BAR`] moves from 0 to `n`.
pub fn iterate(n: i64, f: impl FnMut()) {
    DEFAULT_BAR.iterate(n, f)
}

/// Runs `f` while [`DEFAULT_UNCERTAIN_BAR`] animates.
pub fn go<R>(f: impl FnOnce() -> R) -> R {
    DEFAULT_UNCERTAIN_BAR.go(f)
}

fn iterate_worker(mut ctx: Context, items: Sender<i64>, stop: Receiver<()>) {
    debug!(total = ctx.total(), "iteration started");
    loop {
        ctx.draw();
        let i = ctx.current();
        select! {
            send(items, i) -> res => if res.is_err() {
                debug!(current = i, "iterator dropped");
                return;
            },
            recv(stop) -> _ => {
                debug!(current = i, "iteration stopped");
                return;
            },
        }
        if i >= ctx.total() {
            break;
        }
        ctx.advance();
    }
    debug!(elapsed = ?ctx.elapsed(), "iteration finished");
}

fn periodic_worker(mut ctx: Context, period: Duration, stop: Receiver<()>) {
    debug!(?period, "animation started");
    let ticker = tick(period);
    let _ = ctx.draw_target().hide_cursor();
    ctx.draw();
    loop {
        select! {
            recv(ticker) -> _ => {
                ctx.advance();
                ctx.draw();
            },
            recv(stop) -> _ => break,
        }
    }
    let _ = ctx.draw_target().show_cursor();
    debug!(elapsed = ?ctx.elapsed(), "animation stopped");
}

fn bytes_worker(mut ctx: Context, bytes: Receiver<usize>, closer: Closer, stop: Receiver<()>) {
    debug!(total = ctx.total(), "byte count started");
    ctx.draw();
    while ctx.current() < ctx.total() {
        select! {
            recv(bytes) -> n => match n {
                Ok(n) => {
                    ctx.add(i64::try_from(n).unwrap_or(i64::MAX));
                    ctx.draw();
                }
                Err(_) => {
                    debug!(current = ctx.current(), "all writers dropped");
                    return;
                }
            },
            recv(closer.closed()) -> _ => {
                debug!(current = ctx.current(), "writer closed");
                return;
            },
            recv(stop) -> _ => {
                debug!(current = ctx.current(), "byte count stopped");
                let _ = closer.close();
                return;
            },
        }
    }
    let _ = closer.close();
    debug!(elapsed = ?ctx.elapsed(), "byte count finished");
}

/// Cancels a run when stopped or dropped.
///
/// Stopping consumes the handle, so a run can be stopped at most once.
/// [`stop`](Self::stop) and drop both wait for the run's worker to exit, so no
/// frame is drawn afterwards.
#[derive(Debug)]
#[must_use = "dropping the handle stops the run"]
pub struct StopHandle {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl StopHandle {
    fn new(stop: Sender<()>, worker: JoinHandle<()>) -> Self {
        Self {
            stop: Some(stop),
            worker: Some(worker),
        }
    }

    /// Cancels the run and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Waits for the run to finish on its own, without cancelling it.
    ///
    /// Animations of uncertain bars never finish; use [`stop`](Self::stop)
    /// for those.
    pub fn wait(mut self) {
        self.join();
    }

    /// Returns true once the run's worker has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn shutdown(&mut self) {
        drop(self.stop.take());
        self.join();
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("progress bar worker panicked");
            }
        }
    }
}

impl Drop for StopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A manually updated run, returned by [`ProgressBar::start`].
///
/// Every update draws a frame on the calling thread.
#[derive(Debug)]
pub struct Runner {
    ctx: Context,
}

impl Runner {
    /// Sets the current value, clamped to `0..=total`, and draws.
    pub fn update(&mut self, value: i64) {
        self.ctx.set(value);
        self.ctx.draw();
    }

    /// Adds `delta` to the current value, clamped to `0..=total`, and draws.
    pub fn update_add(&mut self, delta: i64) {
        self.ctx.add(delta);
        self.ctx.draw();
    }

    pub fn current(&self) -> i64 {
        self.ctx.current()
    }

    pub fn total(&self) -> i64 {
        self.ctx.total()
    }

    /// Ends the run.
    pub fn stop(self) {
        debug!(current = self.ctx.current(), "manual run stopped");
    }
}
