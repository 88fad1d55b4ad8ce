//! Per-file strictness marker (`# typed: <level>`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Strictness levels, ordered from laxest to strictest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Ignore,
    False,
    True,
    Strict,
    Strong,
}

impl Default for Strictness {
    /// Files without a sigil behave as `typed: false`.
    fn default() -> Self {
        Strictness::False
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strictness::Ignore => "ignore",
            Strictness::False => "false",
            Strictness::True => "true",
            Strictness::Strict => "strict",
            Strictness::Strong => "strong",
        };
        f.write_str(label)
    }
}

impl FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Strictness::Ignore),
            "false" => Ok(Strictness::False),
            "true" => Ok(Strictness::True),
            "strict" => Ok(Strictness::Strict),
            "strong" => Ok(Strictness::Strong),
            other => Err(format!("unknown strictness level '{other}'")),
        }
    }
}

fn sigil_regex() -> &'static Regex {
    static SIGIL: OnceLock<Regex> = OnceLock::new();
    SIGIL.get_or_init(|| {
        Regex::new(r"(?m)^\s*#\s*typed:\s*([a-z]+)\s*$").expect("sigil pattern is valid")
    })
}

/// Reads the first `# typed:` sigil in `source`. Unknown levels are ignored.
pub fn detect(source: &str) -> Option<Strictness> {
    sigil_regex()
        .captures_iter(source)
        .find_map(|caps| caps.get(1)?.as_str().parse().ok())
}

/// Comments that configure the interpreter rather than document code.
pub fn is_magic_comment(text: &str) -> bool {
    let body = text.trim_start_matches('#').trim_start();
    ["typed:", "frozen_string_literal:", "encoding:", "coding:", "warn_indent:"]
        .iter()
        .any(|prefix| body.starts_with(prefix))
}
