use std::fmt;

use console::Style as Paint;

use crate::style::Style;

/// Format of [`DEFAULT_BAR`](crate::DEFAULT_BAR).
pub const DEFAULT_BAR_FORMAT: &str = "%percent|%bar|%current/%total %elapsed %rate";
/// Format of [`DEFAULT_UNCERTAIN_BAR`](crate::DEFAULT_UNCERTAIN_BAR).
pub const DEFAULT_UNCERTAIN_FORMAT: &str = "[%bar]";

/// The rendering configuration of a progress bar.
///
/// Every drive invocation takes a snapshot of the configuration, so updating
/// a bar never affects a run that is already in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The format string the bar's template is parsed from.
    pub format: String,
    /// Draw every frame at [`Config::pos`] instead of the current line.
    pub bind_pos: bool,
    /// Zero based `(row, col)` frames are drawn at when `bind_pos` is set.
    pub pos: (usize, usize),
    /// Line width override, 0 to use the terminal width.
    pub width: usize,
    /// Fixed width of the bar body, 0 to fill the remaining line.
    pub bar_width: usize,
    /// Whether the total is unknown and the bar animates instead of filling.
    pub uncertain: bool,
    /// Whether progress counts bytes.
    pub bytes: bool,
    pub style: Style,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: String::new(),
            bind_pos: false,
            pos: (0, 0),
            width: 0,
            bar_width: 0,
            uncertain: false,
            bytes: false,
            style: Style::default(),
        }
    }
}

impl Config {
    /// The configuration of the default bar: a white block filling a blank
    /// track.
    pub fn default_bar() -> Self {
        Self {
            style: Style::default()
                .complete(" ")
                .complete_style(Paint::new().on_white())
                .incomplete(" "),
            ..Self::default()
        }
    }

    /// The configuration of the default uncertain bar: a white block
    /// travelling along a blank track.
    pub fn default_uncertain_bar() -> Self {
        Self {
            uncertain: true,
            style: Style::default()
                .incomplete(" ")
                .uncertain("   ")
                .uncertain_style(Paint::new().on_white()),
            ..Self::default()
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.style.normalize();
    }
}

/// A deferred change to a [`Config`].
///
/// Modifiers are passed to [`ProgressBar::new`](crate::ProgressBar::new) and
/// [`ProgressBar::update`](crate::ProgressBar::update) and applied in order,
/// so later modifiers win.
pub struct Modifier(Box<dyn FnOnce(&mut Config) + Send>);

impl Modifier {
    /// Wraps an arbitrary change to the configuration.
    pub fn new(f: impl FnOnce(&mut Config) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub(crate) fn apply(self, config: &mut Config) {
        (self.0)(config)
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier").finish_non_exhaustive()
    }
}

/// Resets the configuration to the default bar's.
pub fn with_default() -> Modifier {
    Modifier::new(|c| *c = Config::default_bar())
}

/// Replaces the whole configuration.
pub fn with_config(config: Config) -> Modifier {
    Modifier::new(move |c| *c = config)
}

/// Pins every frame to the zero based `row` and `col`.
pub fn with_pos(row: usize, col: usize) -> Modifier {
    Modifier::new(move |c| {
        c.bind_pos = true;
        c.pos = (row, col);
    })
}

/// Overrides the line width used to size the bar body.
pub fn with_width(width: usize) -> Modifier {
    Modifier::new(move |c| c.width = width)
}

/// Fixes the width of the bar body.
pub fn with_bar_width(width: usize) -> Modifier {
    Modifier::new(move |c| c.bar_width = width)
}

pub fn with_uncertain() -> Modifier {
    Modifier::new(|c| c.uncertain = true)
}

pub fn with_bytes() -> Modifier {
    Modifier::new(|c| c.bytes = true)
}

pub fn with_style(style: Style) -> Modifier {
    Modifier::new(move |c| c.style = style)
}

pub fn with_format(format: &str) -> Modifier {
    let format = format.to_owned();
    Modifier::new(move |c| c.format = format)
}
