use std::fmt;
use std::time::Duration;

use number_prefix::{NumberPrefix, Prefix};

/// Formats a byte count for human readability.
///
/// Uses a binary (1024) base with one decimal place and the short unit names
/// `B`, `kB`, `MB`, `GB` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanBytes(pub u64);

/// Formats a duration as seconds with one decimal place, e.g. `3.2s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seconds(pub Duration);

/// Formats a throughput value with one decimal place, e.g. `12.5/s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerSec(pub f64);

fn unit(prefix: Prefix) -> &'static str {
    match prefix {
        Prefix::Kilo | Prefix::Kibi => "k",
        Prefix::Mega | Prefix::Mebi => "M",
        Prefix::Giga | Prefix::Gibi => "G",
        Prefix::Tera | Prefix::Tebi => "T",
        Prefix::Peta | Prefix::Pebi => "P",
        Prefix::Exa | Prefix::Exbi => "E",
        Prefix::Zetta | Prefix::Zebi => "Z",
        Prefix::Yotta | Prefix::Yobi => "Y",
    }
}

impl fmt::Display for HumanBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NumberPrefix::binary(self.0 as f64) {
            NumberPrefix::Standalone(number) => write!(f, "{:.0}B", number),
            NumberPrefix::Prefixed(prefix, number) => write!(f, "{:.1}{}B", number, unit(prefix)),
        }
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}s", self.0.as_secs_f64())
    }
}

impl fmt::Display for PerSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}/s", self.0)
    }
}
