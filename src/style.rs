use console::Style as Paint;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const DEFAULT_COMPLETE: &str = "=";
const DEFAULT_INCOMPLETE: &str = "-";
const DEFAULT_UNCERTAIN: &str = "<->";

/// Controls how the `%bar` token is drawn.
///
/// A style holds the glyphs used for the completed part, the head marking
/// the fill boundary, the incomplete part and the travelling marker of
/// uncertain bars, each with its own [`console::Style`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Style {
    pub(crate) complete: String,
    pub(crate) complete_head: String,
    pub(crate) incomplete: String,
    pub(crate) uncertain: String,
    pub(crate) complete_style: Paint,
    pub(crate) complete_head_style: Paint,
    pub(crate) incomplete_style: Paint,
    pub(crate) uncertain_style: Paint,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            complete: DEFAULT_COMPLETE.into(),
            complete_head: String::new(),
            incomplete: DEFAULT_INCOMPLETE.into(),
            uncertain: DEFAULT_UNCERTAIN.into(),
            complete_style: Paint::new().white(),
            complete_head_style: Paint::new().white(),
            incomplete_style: Paint::new().black().bright(),
            uncertain_style: Paint::new().white(),
        }
    }
}

impl Style {
    /// Sets the glyph repeated over the completed part of the bar.
    pub fn complete(mut self, s: &str) -> Self {
        self.complete = s.into();
        self
    }

    /// Sets the glyph drawn at the fill boundary. Empty by default.
    pub fn complete_head(mut self, s: &str) -> Self {
        self.complete_head = s.into();
        self
    }

    /// Sets the glyph repeated over the incomplete part of the bar.
    pub fn incomplete(mut self, s: &str) -> Self {
        self.incomplete = s.into();
        self
    }

    /// Sets the marker that travels along an uncertain bar.
    pub fn uncertain(mut self, s: &str) -> Self {
        self.uncertain = s.into();
        self
    }

    pub fn complete_style(mut self, style: Paint) -> Self {
        self.complete_style = style;
        self
    }

    pub fn complete_head_style(mut self, style: Paint) -> Self {
        self.complete_head_style = style;
        self
    }

    pub fn incomplete_style(mut self, style: Paint) -> Self {
        self.incomplete_style = style;
        self
    }

    pub fn uncertain_style(mut self, style: Paint) -> Self {
        self.uncertain_style = style;
        self
    }

    /// Replaces empty glyphs with the library defaults.
    pub(crate) fn normalize(&mut self) {
        if self.complete.is_empty() {
            self.complete = DEFAULT_COMPLETE.into();
        }
        if self.incomplete.is_empty() {
            self.incomplete = DEFAULT_INCOMPLETE.into();
        }
        if self.uncertain.is_empty() {
            self.uncertain = DEFAULT_UNCERTAIN.into();
        }
    }

    pub(crate) fn format_certain(&self, current: i64, total: i64, width: usize) -> String {
        let fill = if total <= 0 {
            0
        } else {
            let fraction = (current as f64 / total as f64).clamp(0.0, 1.0);
            (fraction * width as f64) as usize
        };
        let head = self.complete_head.width().min(width);
        let complete = fill.saturating_sub(head);
        let rest = width.saturating_sub(complete).saturating_sub(head);

        let mut out = decorate(&repeat_to_width(&self.complete, complete), &self.complete_style);
        out.push_str(&decorate(
            &repeat_to_width(&self.complete_head, head),
            &self.complete_head_style,
        ));
        out.push_str(&decorate(&repeat_to_width(&self.incomplete, rest), &self.incomplete_style));
        out
    }

    pub(crate) fn format_uncertain(&self, current: i64, width: usize) -> String {
        if width == 0 {
            return String::new();
        }
        let left = current.rem_euclid(width as i64) as usize;
        let marker = self.uncertain.width().min(width - left);
        let right = width - left - marker;

        let mut out = decorate(&repeat_to_width(&self.incomplete, left), &self.incomplete_style);
        out.push_str(&decorate(
            &repeat_to_width(&self.uncertain, marker),
            &self.uncertain_style,
        ));
        out.push_str(&decorate(&repeat_to_width(&self.incomplete, right), &self.incomplete_style));
        out
    }
}

/// Wraps `text` in the escape codes of `style`, resetting afterwards.
///
/// Empty text stays empty so that unused segments add no escape codes.
pub fn decorate(text: &str, style: &Paint) -> String {
    if text.is_empty() {
        return String::new();
    }
    style.apply_to(text).to_string()
}

/// Repeats `glyph` until exactly `width` columns are filled.
///
/// The last copy is cut short when the glyph does not divide `width`; a
/// character that would overflow the target is dropped.
pub(crate) fn repeat_to_width(glyph: &str, width: usize) -> String {
    let mut out = String::new();
    if glyph.width() == 0 {
        return out;
    }
    let mut used = 0;
    for c in glyph.chars().cycle() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
        if used == width {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::strip_ansi_codes;
    use pretty_assertions::assert_eq;

    fn plain(s: &str) -> String {
        strip_ansi_codes(s).into_owned()
    }

    #[test]
    fn repeat_truncates_last_copy() {
        assert_eq!(repeat_to_width("ab", 5), "ababa");
        assert_eq!(repeat_to_width("<->", 2), "<-");
        assert_eq!(repeat_to_width("=", 0), "");
        assert_eq!(repeat_to_width("", 4), "");
    }

    #[test]
    fn normalize_fills_empty_glyphs() {
        let mut style = Style::default().complete("").incomplete("").uncertain("");
        style.normalize();
        assert_eq!(style.complete, "=");
        assert_eq!(style.incomplete, "-");
        assert_eq!(style.uncertain, "<->");
        assert_eq!(style.complete_head, "");
    }

    #[test]
    fn certain_bar_half_full() {
        let style = Style::default();
        assert_eq!(plain(&style.format_certain(5, 10, 10)), "=====-----");
    }

    #[test]
    fn certain_bar_bounds() {
        let style = Style::default().complete("#").complete_head(">");
        assert_eq!(plain(&style.format_certain(0, 10, 8)), ">-------");
        assert_eq!(plain(&style.format_certain(10, 10, 8)), "#######>");
        assert_eq!(plain(&style.format_certain(3, 0, 4)), ">---");
    }

    #[test]
    fn uncertain_marker_wraps() {
        let style = Style::default().incomplete(" ").uncertain("<=>");
        assert_eq!(plain(&style.format_uncertain(0, 6)), "<=>   ");
        assert_eq!(plain(&style.format_uncertain(4, 6)), "    <=");
        assert_eq!(plain(&style.format_uncertain(6, 6)), "<=>   ");
        assert_eq!(plain(&style.format_uncertain(3, 0)), "");
    }
}
