//! Pattern translation into the engine's RE2-class dialect.
//!
//! # Accepted dialect
//! Match patterns are mostly literal text. `.` and `-` are escaped, `(.*)` is
//! the only capture construct, and every other character passes through
//! untouched. A pattern that is not valid regex after translation is rejected
//! by the engine at install time, not here.
//!
//! # Design Decisions
//! - Both functions are total: any input yields a string
//! - No validation of `$N` references against capture group count

use std::sync::OnceLock;

use regex::Regex;

const CAPTURE_GROUP: &str = "(.*)";
const ESCAPED_CAPTURE_GROUP: &str = "(\\.*)";

/// Translate a user match pattern into an engine regex filter.
///
/// Dots and dashes are escaped, then any `(.*)` group mangled by the dot pass
/// is restored.
pub fn to_engine_filter(pattern: &str) -> String {
    pattern
        .replace('.', "\\.")
        .replace('-', "\\-")
        .replace(ESCAPED_CAPTURE_GROUP, CAPTURE_GROUP)
}

/// Translate a replacement template into an engine regex substitution.
///
/// `$N` references become `\N`. Backslashes already present are not escaped.
pub fn to_engine_substitution(template: &str) -> String {
    capture_reference()
        .replace_all(template, "\\${1}")
        .into_owned()
}

fn capture_reference() -> &'static Regex {
    static CAPTURE_REF: OnceLock<Regex> = OnceLock::new();
    CAPTURE_REF.get_or_init(|| Regex::new(r"\$(\d+)").expect("capture reference regex is valid"))
}
