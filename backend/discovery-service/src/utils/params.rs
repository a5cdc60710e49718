//! Lenient query-string parsing.
//!
//! Discovery endpoints never reject a request over a malformed knob: bad
//! numbers fall back to defaults and out-of-range values are clamped.

/// Trimmed, non-empty value
pub fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse an integer knob and clamp it to `[min, max]`; unparsable input yields `default`
pub fn bounded_usize(raw: Option<&str>, default: usize, min: usize, max: usize) -> usize {
    let value = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => match s.parse::<i64>() {
            Ok(v) => v,
            Err(_) => return default.clamp(min, max),
        },
        None => return default.clamp(min, max),
    };

    if value < min as i64 {
        min
    } else if value > max as i64 {
        max
    } else {
        value as usize
    }
}

/// Offsets are never negative
pub fn offset(raw: Option<&str>) -> usize {
    bounded_usize(raw, 0, 0, usize::MAX / 2)
}

pub fn float(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// `true`/`false` (also `1`/`0`), anything else keeps `default`
pub fn flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

/// Comma separated ids, blanks dropped
pub fn id_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
