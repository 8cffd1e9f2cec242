use std::cmp::Ordering;

use serde::Serialize;

/// Prefix marking a recording as unusable.
pub const QUALITY_PREFIX: &str = "bad_";

// ---------------------------------------------------------------------------
// Quality prefix
// ---------------------------------------------------------------------------

/// Whether `name` carries the quality prefix.
pub fn has_prefix(name: &str) -> bool {
    name.starts_with(QUALITY_PREFIX)
}

/// Canonical name: `name` with one leading quality prefix removed.
pub fn strip_prefix(name: &str) -> &str {
    name.strip_prefix(QUALITY_PREFIX).unwrap_or(name)
}

/// Prefixed form of `name`. Already-prefixed names are returned unchanged.
pub fn apply_prefix(name: &str) -> String {
    if has_prefix(name) {
        name.to_string()
    } else {
        format!("{QUALITY_PREFIX}{name}")
    }
}

/// The name `name` would carry with its quality flag set to `bad`.
pub fn with_quality(name: &str, bad: bool) -> String {
    if bad {
        apply_prefix(name)
    } else {
        strip_prefix(name).to_string()
    }
}

/// The name with the opposite quality flag.
pub fn counterpart(name: &str) -> String {
    with_quality(name, !has_prefix(name))
}

/// Listing order: canonical name first, then unprefixed before prefixed.
pub fn listing_order(a: &str, b: &str) -> Ordering {
    strip_prefix(a)
        .cmp(strip_prefix(b))
        .then_with(|| has_prefix(a).cmp(&has_prefix(b)))
}

// ---------------------------------------------------------------------------
// Night / pointing metadata
// ---------------------------------------------------------------------------

/// Metadata encoded in a recording's file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    /// Second-to-last `_` field of the canonical name.
    pub night: Option<String>,
    /// Last character of the last field's stem, e.g. `0` for `p0.json`.
    pub pointing: Option<char>,
    /// The name carries the quality prefix.
    pub bad: bool,
}

impl FileMeta {
    pub fn parse(name: &str) -> Self {
        let canonical = strip_prefix(name);
        let fields: Vec<&str> = canonical.split('_').collect();

        let night = if fields.len() >= 2 {
            Some(fields[fields.len() - 2].to_string()).filter(|s| !s.is_empty())
        } else {
            None
        };

        let pointing = if fields.len() >= 2 {
            fields
                .last()
                .map(|last| last.split('.').next().unwrap_or(last))
                .and_then(|stem| stem.chars().last())
        } else {
            None
        };

        FileMeta {
            night,
            pointing,
            bad: has_prefix(name),
        }
    }
}
