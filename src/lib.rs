//! termbar draws single line progress bars described by format strings.
//!
//! A format string mixes literal text with `%` tokens:
//!
//! ```text
//! [%bar] %current/%total %elapsed
//! ```
//!
//! # Built-in tokens
//!
//! * `%bar`: the bar body. Certain bars fill up, uncertain bars animate a
//!   marker travelling along the track.
//! * `%current`, `%total`: the current and total values.
//! * `%percent`: truncated completion, padded to three digits.
//! * `%elapsed`: seconds since the run started, e.g. `3.2s`.
//! * `%rate`: steps per second, or bytes per second for byte counting bars.
//! * `%spinner`: a rotating `\|/-` character.
//! * `%bytes`: human readable byte counts, e.g. `1.5kB/3.0kB`.
//!
//! Unknown tokens are kept as literal text. Custom tokens implement [`Token`]
//! and are added to a [`TokenRegistry`].
//!
//! # Driving a bar
//!
//! A [`ProgressBar`] only holds configuration. Progress happens in runs, each
//! with its own snapshot of the bar and, except for [`ProgressBar::start`], its
//! own worker thread:
//!
//! * [`ProgressBar::iter`] and [`ProgressBar::iterate`] step a certain bar from 0
//!   to its total.
//! * [`ProgressBar::run`] and [`ProgressBar::go`] animate an uncertain bar.
//! * [`ProgressBar::run_with_writer`] returns a [`BytesWriter`] whose writes move
//!   a byte counting bar.
//! * [`ProgressBar::start`] returns a [`Runner`] updated by hand.
//!
//! ```rust,no_run
//! use std::thread;
//! use std::time::Duration;
//!
//! termbar::iterate(100, || thread::sleep(Duration::from_millis(20)));
//! let answer = termbar::go(|| {
//!     thread::sleep(Duration::from_secs(1));
//!     42
//! });
//! ```
//!
//! Frames are written under an [`OutputLock`]. Bars drawing to the same
//! terminal share the global lock by default, so several bars pinned to
//! different rows with [`with_pos`] can run concurrently.
//!
//! # Logging
//!
//! Runs emit [`tracing`] events: `debug` when they start and end, `trace` per
//! frame and `warn` when a frame could not be written. No subscriber is
//! installed by this crate.

mod config;
mod draw_target;
mod error;
mod format;
#[cfg(feature = "in_memory")]
mod in_memory;
mod iter;
mod progress_bar;
mod state;
mod style;
mod term_like;
mod token;
mod writer;

pub use crate::config::{
    with_bar_width, with_bytes, with_config, with_default, with_format, with_pos, with_style,
    with_uncertain, with_width, Config, Modifier, DEFAULT_BAR_FORMAT, DEFAULT_UNCERTAIN_FORMAT,
};
pub use crate::draw_target::{OutputLock, ProgressDrawTarget};
pub use crate::error::{Error, Result};
pub use crate::format::{HumanBytes, PerSec, Seconds};
#[cfg(feature = "in_memory")]
pub use crate::in_memory::InMemoryTerm;
pub use crate::iter::ProgressIter;
pub use crate::progress_bar::{
    go, iterate, ProgressBar, Runner, StopHandle, DEFAULT_BAR, DEFAULT_TICK,
    DEFAULT_UNCERTAIN_BAR,
};
pub use crate::state::Context;
pub use crate::style::{decorate, Style};
pub use crate::term_like::TermLike;
pub use crate::token::{
    BarToken, BytesToken, CurrentToken, ElapsedToken, Literal, PercentToken, RateToken,
    SpinnerToken, Template, Token, TokenClone, TokenRegistry, TotalToken, TOKEN_PREFIX,
};
pub use crate::writer::BytesWriter;
