use std::sync::LazyLock;

use regex::Regex;

/// Strict `YYYY-MM-DD` shape. Calendar validity is checked separately.
pub static ISO_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern is valid"));
