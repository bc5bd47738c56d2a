use std::mem;
use std::time::{Duration, Instant};

use console::measure_text_width;
use tracing::{trace, warn};

use crate::config::Config;
use crate::draw_target::{Frame, ProgressDrawTarget};
use crate::token::{Template, TokenRegistry};

/// The shared, updatable part of a progress bar.
#[derive(Debug)]
pub(crate) struct BarState {
    pub(crate) config: Config,
    pub(crate) template: Template,
    pub(crate) registry: TokenRegistry,
    pub(crate) draw_target: ProgressDrawTarget,
}

impl BarState {
    pub(crate) fn new(config: Config, registry: TokenRegistry, draw_target: ProgressDrawTarget) -> Self {
        let template = registry.parse(&config.format);
        Self {
            config,
            template,
            registry,
            draw_target,
        }
    }

    /// Takes a snapshot for one drive invocation.
    pub(crate) fn context(&self, total: i64) -> Context {
        Context::new(
            self.config.clone(),
            self.template.clone(),
            self.draw_target.clone(),
            total,
        )
    }
}

/// The state of one run of a progress bar.
///
/// A context owns snapshots of the bar's configuration and tokens, so several
/// runs of the same bar never share state. Tokens receive the context when
/// rendering.
#[derive(Debug)]
pub struct Context {
    config: Config,
    template: Template,
    total: i64,
    current: i64,
    window_width: usize,
    width_without_bar: usize,
    started: Instant,
    draw_target: ProgressDrawTarget,
}

impl Context {
    pub(crate) fn new(
        config: Config,
        template: Template,
        draw_target: ProgressDrawTarget,
        total: i64,
    ) -> Self {
        let window_width = match config.width {
            0 => draw_target.width() as usize,
            width => width,
        };
        Self {
            config,
            template,
            total,
            current: 0,
            window_width,
            width_without_bar: 0,
            started: Instant::now(),
            draw_target,
        }
    }

    /// The configuration snapshot of this run.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn is_uncertain(&self) -> bool {
        self.config.uncertain
    }

    /// The instant the run started.
    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The line width measured when the run started.
    pub fn window_width(&self) -> usize {
        self.window_width
    }

    /// The display width of everything but the bar in the last frame.
    pub fn width_without_bar(&self) -> usize {
        self.width_without_bar
    }

    /// The width available to the bar body.
    pub fn bar_width(&self) -> usize {
        match self.config.bar_width {
            0 => self.window_width.saturating_sub(self.width_without_bar),
            width => width,
        }
    }

    /// Moves one step forward.
    ///
    /// Certain bars stop at the total, uncertain bars keep counting to drive
    /// their animation.
    pub(crate) fn advance(&mut self) {
        if self.config.uncertain {
            self.current = self.current.saturating_add(1);
        } else {
            self.current = self.current.saturating_add(1).min(self.total);
        }
    }

    /// Adds `delta` to the current value, clamped to `0..=total`.
    pub(crate) fn add(&mut self, delta: i64) {
        if self.config.uncertain {
            self.advance();
        } else {
            self.current = self.clamp(self.current.saturating_add(delta));
        }
    }

    /// Sets the current value, clamped to `0..=total`.
    pub(crate) fn set(&mut self, value: i64) {
        if self.config.uncertain {
            if value != self.current {
                self.advance();
            }
        } else {
            self.current = self.clamp(value);
        }
    }

    fn clamp(&self, value: i64) -> i64 {
        value.clamp(0, self.total.max(0))
    }

    /// Renders every token into a frame.
    ///
    /// The first bar token is rendered last so that it can fill whatever the
    /// other tokens left of the line.
    pub(crate) fn render(&mut self) -> Frame {
        let mut template = mem::take(&mut self.template);
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut bar_index = None;

        for (i, token) in template.tokens.iter_mut().enumerate() {
            if bar_index.is_none() && token.is_bar() {
                bar_index = Some(i);
                continue;
            }
            let text = token.render(self);
            match bar_index {
                Some(_) => suffix.push_str(&text),
                None => prefix.push_str(&text),
            }
        }

        self.width_without_bar = measure_text_width(&prefix) + measure_text_width(&suffix);
        let bar = match bar_index {
            Some(i) => template.tokens[i].render(self),
            None => String::new(),
        };
        self.template = template;

        Frame {
            prefix,
            bar,
            suffix,
            position: self.config.bind_pos.then_some(self.config.pos),
            clear_tail: self.config.bar_width != 0,
        }
    }

    /// Renders a frame and writes it to the draw target.
    ///
    /// Output errors drop the frame; the next one is attempted as usual.
    pub(crate) fn draw(&mut self) {
        let frame = self.render();
        trace!(current = self.current, total = self.total, "drawing frame");
        if let Err(err) = self.draw_target.draw(&frame) {
            warn!(%err, "failed to draw progress frame");
        }
    }

    pub(crate) fn draw_target(&self) -> &ProgressDrawTarget {
        &self.draw_target
    }
}
