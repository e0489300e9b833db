//! Route spec parsing and path matching.
//!
//! # Responsibilities
//! - Parse a route spec string into a tagged [`RouteSpec`]
//! - Compile the spec once, at registration time
//! - Match request paths against the compiled form
//!
//! # Route spec grammar
//! ```text
//! "*"                          → matches every path
//! <d><body><d><flags>          → regex <body> with <flags>
//!     <d>     one of  / ~ @ ; % # '
//!     <flags> zero or more of  g i m s u y   (duplicates collapsed)
//! anything else                → regex built from the whole string, no flags
//! ```
//!
//! The body of a delimited spec is the shortest text between the opening
//! delimiter and a later occurrence of it that is followed only by flag
//! letters. Matching is unanchored unless the `y` flag is given.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// The spec that matches every path.
pub const MATCH_ALL: &str = "*";

/// Characters accepted as the opening/closing delimiter of a pattern.
pub const DELIMITERS: &[char] = &['/', '~', '@', ';', '%', '#', '\''];

/// Flag letters accepted after the closing delimiter.
pub const FLAGS: &[char] = &['g', 'i', 'm', 's', 'u', 'y'];

/// Raised when a route spec does not compile.
#[derive(Debug, Error)]
#[error("invalid route pattern {spec:?}: {source}")]
pub struct RouteCompilationError {
    pub spec: String,
    #[source]
    pub source: regex::Error,
}

/// A parsed, not yet compiled, route spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSpec {
    /// The `*` wildcard.
    Any,
    /// A regular expression body with deduplicated flags.
    Pattern { body: String, flags: String },
}

impl RouteSpec {
    pub fn parse(spec: &str) -> Self {
        if spec == MATCH_ALL {
            return RouteSpec::Any;
        }

        match split_delimited(spec) {
            Some((body, flags)) => RouteSpec::Pattern {
                body: body.to_string(),
                flags: dedup_flags(flags),
            },
            None => RouteSpec::Pattern {
                body: spec.to_string(),
                flags: String::new(),
            },
        }
    }
}

/// Split `<d><body><d><flags>` into body and raw flags.
fn split_delimited(spec: &str) -> Option<(&str, &str)> {
    let delimiter = spec.chars().next()?;
    if !DELIMITERS.contains(&delimiter) {
        return None;
    }

    let start = delimiter.len_utf8();
    spec[start..]
        .char_indices()
        .filter(|&(_, c)| c == delimiter)
        .map(|(idx, _)| start + idx)
        .find(|&close| {
            spec[close + delimiter.len_utf8()..]
                .chars()
                .all(|c| FLAGS.contains(&c))
        })
        .map(|close| (&spec[start..close], &spec[close + delimiter.len_utf8()..]))
}

/// Collapse repeated flag letters, keeping first-occurrence order.
fn dedup_flags(flags: &str) -> String {
    let mut out = String::with_capacity(flags.len());
    for c in flags.chars() {
        if !out.contains(c) {
            out.push(c);
        }
    }
    out
}

/// A compiled route predicate over request paths.
#[derive(Debug, Clone)]
pub enum RouteMatcher {
    Any,
    Pattern { regex: Regex, flags: String },
}

impl RouteMatcher {
    /// Parse and compile `spec`.
    pub fn compile(spec: &str) -> Result<Self, RouteCompilationError> {
        match RouteSpec::parse(spec) {
            RouteSpec::Any => Ok(RouteMatcher::Any),
            RouteSpec::Pattern { body, flags } => {
                // `y` (sticky) only accepts matches starting at offset 0.
                let source = if flags.contains('y') {
                    format!(r"\A(?:{})", body)
                } else {
                    body
                };

                let regex = RegexBuilder::new(&source)
                    .case_insensitive(flags.contains('i'))
                    .multi_line(flags.contains('m'))
                    .dot_matches_new_line(flags.contains('s'))
                    .build()
                    .map_err(|source| RouteCompilationError {
                        spec: spec.to_string(),
                        source,
                    })?;

                Ok(RouteMatcher::Pattern { regex, flags })
            }
        }
    }

    /// Returns true if `path` is accepted.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RouteMatcher::Any => true,
            RouteMatcher::Pattern { regex, .. } => regex.is_match(path),
        }
    }

    /// The effective flags, deduplicated. Empty for `*`.
    pub fn flags(&self) -> &str {
        match self {
            RouteMatcher::Any => "",
            RouteMatcher::Pattern { flags, .. } => flags,
        }
    }
}
