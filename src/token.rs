//! Format string tokens and the parser turning a format into a [`Template`].
//!
//! A format such as `"[%bar] %current/%total"` is split into tokens: every
//! `%name` whose name is registered in a [`TokenRegistry`] becomes a clone of
//! the registered token, everything else is kept as literal text.

use std::fmt;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::format::{HumanBytes, PerSec, Seconds};
use crate::state::Context;

/// The character introducing a token in a format string.
pub const TOKEN_PREFIX: char = '%';

const RATE_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);
const SPINNER_FRAMES: [char; 4] = ['\\', '|', '/', '-'];

/// A self-rendering unit of a parsed format string.
///
/// Tokens may keep state between renders (the spinner keeps its frame, the
/// rate keeps its last sample). Every bar and every running context owns its
/// own clone, so that state is never shared between two bars or two runs.
///
/// ```rust
/// use termbar::{Context, Token, TokenRegistry};
///
/// #[derive(Clone, Default)]
/// struct Remaining;
///
/// impl Token for Remaining {
///     fn render(&mut self, ctx: &Context) -> String {
///         (ctx.total() - ctx.current()).to_string()
///     }
/// }
///
/// let mut registry = TokenRegistry::new();
/// registry.register("remaining", Remaining);
/// assert_eq!(registry.parse("%remaining left").len(), 2);
/// ```
pub trait Token: TokenClone + Send + Sync {
    /// Renders the token for the current state of `ctx`.
    fn render(&mut self, ctx: &Context) -> String;

    /// Whether this token is the bar body.
    ///
    /// The first bar token of a template is rendered last, once the width of
    /// everything around it is known.
    fn is_bar(&self) -> bool {
        false
    }

    /// The text of a literal token, `None` for dynamic tokens.
    fn literal(&self) -> Option<&str> {
        None
    }
}

/// Clone support for boxed tokens, implemented for every `Token + Clone`.
pub trait TokenClone {
    fn clone_box(&self) -> Box<dyn Token>;
}

impl<T> TokenClone for T
where
    T: Token + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn Token> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Token> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// The bar body, `%bar`.
#[derive(Clone, Debug, Default)]
pub struct BarToken;

impl Token for BarToken {
    fn render(&mut self, ctx: &Context) -> String {
        let style = &ctx.config().style;
        let width = ctx.bar_width();
        if ctx.is_uncertain() {
            style.format_uncertain(ctx.current(), width)
        } else {
            style.format_certain(ctx.current(), ctx.total(), width)
        }
    }

    fn is_bar(&self) -> bool {
        true
    }
}

/// The current value, `%current`.
#[derive(Clone, Debug, Default)]
pub struct CurrentToken;

impl Token for CurrentToken {
    fn render(&mut self, ctx: &Context) -> String {
        ctx.current().to_string()
    }
}

/// The total value, `%total`.
#[derive(Clone, Debug, Default)]
pub struct TotalToken;

impl Token for TotalToken {
    fn render(&mut self, ctx: &Context) -> String {
        ctx.total().to_string()
    }
}

/// The truncated completion percentage, `%percent`.
#[derive(Clone, Debug, Default)]
pub struct PercentToken;

impl Token for PercentToken {
    fn render(&mut self, ctx: &Context) -> String {
        let percent = if ctx.current() == 0 || ctx.total() <= 0 {
            0
        } else {
            (ctx.current() as f64 / ctx.total() as f64 * 100.0) as i64
        };
        format!("{:3}%", percent)
    }
}

/// Seconds since the run started, `%elapsed`.
#[derive(Clone, Debug, Default)]
pub struct ElapsedToken;

impl Token for ElapsedToken {
    fn render(&mut self, ctx: &Context) -> String {
        Seconds(ctx.elapsed()).to_string()
    }
}

/// Throughput in steps (or bytes) per second, `%rate`.
///
/// The rate is resampled at most every 100ms; renders in between repeat the
/// cached value.
#[derive(Clone, Debug, Default)]
pub struct RateToken {
    last: Option<(Instant, i64)>,
    rate: f64,
}

impl Token for RateToken {
    fn render(&mut self, ctx: &Context) -> String {
        let now = Instant::now();
        let (at, value) = *self.last.get_or_insert((ctx.started(), 0));
        let dt = now.saturating_duration_since(at);
        if dt >= RATE_SAMPLE_INTERVAL {
            self.rate = (ctx.current() - value) as f64 / dt.as_secs_f64();
            self.last = Some((now, ctx.current()));
        }

        if ctx.config().bytes {
            format!("{}/s", HumanBytes(self.rate.max(0.0) as u64))
        } else {
            PerSec(self.rate).to_string()
        }
    }
}

/// A rotating character, `%spinner`. Advances one frame per render.
#[derive(Clone, Debug, Default)]
pub struct SpinnerToken {
    frame: usize,
}

impl Token for SpinnerToken {
    fn render(&mut self, _: &Context) -> String {
        let c = SPINNER_FRAMES[self.frame];
        self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
        c.to_string()
    }
}

/// Human readable byte counts, `%bytes`.
#[derive(Clone, Debug, Default)]
pub struct BytesToken;

impl Token for BytesToken {
    fn render(&mut self, ctx: &Context) -> String {
        let current = HumanBytes(ctx.current().max(0) as u64);
        if ctx.is_uncertain() {
            current.to_string()
        } else {
            format!("{}/{}", current, HumanBytes(ctx.total().max(0) as u64))
        }
    }
}

/// Plain text copied from the format string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal(pub String);

impl Token for Literal {
    fn render(&mut self, _: &Context) -> String {
        self.0.clone()
    }

    fn literal(&self) -> Option<&str> {
        Some(&self.0)
    }
}

/// The ordered tokens of a parsed format string.
#[derive(Clone, Default)]
pub struct Template {
    pub(crate) tokens: Vec<Box<dyn Token>>,
}

impl Template {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether the template contains a `%bar` token.
    pub fn has_bar(&self) -> bool {
        self.tokens.iter().any(|t| t.is_bar())
    }

    /// The literal segments of the template, in order.
    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| t.literal())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("len", &self.tokens.len())
            .field("has_bar", &self.has_bar())
            .finish()
    }
}

/// The set of token names a format string is parsed against.
///
/// Names are matched in registration order and the first name that prefixes
/// the text after a `%` wins. Names that are prefixes of one another (say
/// `cur` and `current`) therefore shadow each other; register the longer one
/// first or avoid the overlap.
#[derive(Clone)]
pub struct TokenRegistry {
    tokens: IndexMap<String, Box<dyn Token>>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("bar", BarToken);
        registry.register("current", CurrentToken);
        registry.register("total", TotalToken);
        registry.register("percent", PercentToken);
        registry.register("elapsed", ElapsedToken);
        registry.register("rate", RateToken::default());
        registry.register("spinner", SpinnerToken::default());
        registry.register("bytes", BytesToken);
        registry
    }
}

impl TokenRegistry {
    /// Creates a registry holding the built-in tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry without any token.
    pub fn empty() -> Self {
        Self {
            tokens: IndexMap::new(),
        }
    }

    /// Registers `token` under `name`, with or without the leading `%`.
    ///
    /// A token already registered under the same name is replaced and keeps
    /// its matching position.
    pub fn register(&mut self, name: &str, token: impl Token + 'static) {
        let name = name.strip_prefix(TOKEN_PREFIX).unwrap_or(name);
        if name.is_empty() {
            tracing::warn!("ignoring token registered with an empty name");
            return;
        }
        self.tokens.insert(name.to_owned(), Box::new(token));
    }

    /// The registered names in matching order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    /// Parses `format` into a template of freshly cloned tokens.
    ///
    /// Unknown `%` sequences are kept as literal text, so parsing never fails.
    pub fn parse(&self, format: &str) -> Template {
        let mut tokens: Vec<Box<dyn Token>> = Vec::new();
        let mut rest = format;

        while !rest.is_empty() {
            let Some(after) = rest.strip_prefix(TOKEN_PREFIX) else {
                let end = rest.find(TOKEN_PREFIX).unwrap_or(rest.len());
                tokens.push(Box::new(Literal(rest[..end].to_owned())));
                rest = &rest[end..];
                continue;
            };

            match self.tokens.iter().find(|(name, _)| after.starts_with(name.as_str())) {
                Some((name, token)) => {
                    tokens.push(token.clone());
                    rest = &after[name.len()..];
                }
                None => {
                    let end = after.find(TOKEN_PREFIX).map_or(rest.len(), |i| i + 1);
                    tokens.push(Box::new(Literal(rest[..end].to_owned())));
                    rest = &rest[end..];
                }
            }
        }

        Template { tokens }
    }
}

impl fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tokens.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::draw_target::ProgressDrawTarget;
    use pretty_assertions::assert_eq;

    fn ctx(total: i64) -> Context {
        let config = Config {
            width: 40,
            ..Config::default()
        };
        Context::new(config, Template::default(), ProgressDrawTarget::hidden(), total)
    }

    fn literals(t: &Template) -> Vec<&str> {
        t.literals().collect()
    }

    #[test]
    fn plain_format_is_one_literal() {
        let t = TokenRegistry::new().parse("downloading files");
        assert_eq!(t.len(), 1);
        assert_eq!(literals(&t), vec!["downloading files"]);
        assert!(!t.has_bar());
    }

    #[test]
    fn empty_format_is_empty_template() {
        assert!(TokenRegistry::new().parse("").is_empty());
    }

    #[test]
    fn literals_survive_between_tokens() {
        let t = TokenRegistry::new().parse("[%bar] %current/%total");
        assert_eq!(t.len(), 6);
        assert!(t.has_bar());
        assert_eq!(literals(&t), vec!["[", "] ", "/"]);
    }

    #[test]
    fn unknown_token_is_literal_up_to_next_prefix() {
        let t = TokenRegistry::new().parse("%foo bar%percent%%x");
        assert_eq!(literals(&t), vec!["%foo bar", "%", "%x"]);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn first_registered_prefix_wins() {
        let mut registry = TokenRegistry::empty();
        registry.register("%cur", Literal("short".into()));
        registry.register("current", Literal("long".into()));
        let t = registry.parse("%current");
        assert_eq!(literals(&t), vec!["short", "rent"]);
    }

    #[test]
    fn register_replaces_builtin() {
        let mut registry = TokenRegistry::new();
        registry.register("bar", Literal("no bar".into()));
        let t = registry.parse("%bar");
        assert!(!t.has_bar());
        assert_eq!(registry.names().next(), Some("bar"));
        registry.register("", Literal("ignored".into()));
        assert_eq!(registry.names().count(), 8);
    }

    #[test]
    fn percent_truncates_and_handles_zero_total() {
        let mut token = PercentToken;
        let mut c = ctx(0);
        assert_eq!(token.render(&c), "  0%");
        c = ctx(3);
        c.set(0);
        assert_eq!(token.render(&c), "  0%");
        c.set(2);
        assert_eq!(token.render(&c), " 66%");
        c.set(3);
        assert_eq!(token.render(&c), "100%");
    }

    #[test]
    fn spinner_cycles_per_clone() {
        let c = ctx(10);
        let mut a = SpinnerToken::default();
        let frames: String = (0..5).map(|_| a.render(&c)).collect();
        assert_eq!(frames, "\\|/-\\");

        let mut b = SpinnerToken::default().clone_box();
        assert_eq!(b.render(&c), "\\");
    }

    #[test]
    fn bytes_shows_total_for_certain_bars() {
        let mut c = ctx(2048);
        c.set(1024);
        assert_eq!(BytesToken.render(&c), "1.0kB/2.0kB");
    }

    #[test]
    fn rate_is_cached_between_samples() {
        let mut c = ctx(100);
        c.set(50);
        let mut rate = RateToken {
            last: Some((Instant::now() - Duration::from_secs(1), 0)),
            rate: 0.0,
        };
        let first = rate.render(&c);
        assert_ne!(first, "0.0/s");
        c.set(100);
        assert_eq!(rate.render(&c), first);
    }
}
