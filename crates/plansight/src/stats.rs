//! Statistics Extractor
//!
//! Pulls numeric cost/row/time statistics out of free-text node captions,
//! e.g. `Seq Scan on users  (cost=0.00..10.50 rows=100) (actual
//! time=0.01..0.12 rows=95 loops=1)`. Matched tokens are removed from the
//! caption so the remaining label is clean prose.
//!
//! Extraction is tolerant by design: a statistic that is absent or fails
//! to parse leaves its field unset. Plan verbosity varies wildly between
//! engines and versions, so a miss is normal, never an error.

/// Numeric fields recognized in a node caption.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStats {
    pub startup_cost: Option<f64>,
    pub total_cost: Option<f64>,
    pub plan_rows: Option<u64>,
    pub actual_rows: Option<u64>,
    pub actual_time_ms: Option<f64>,
    /// Per-loop startup value of an `actual time=a..b` range
    pub actual_startup_time_ms: Option<f64>,
    pub loops: Option<u64>,
}

/// Extracts the recognized statistics from `caption` and returns them
/// together with the cleaned display label.
///
/// Recognized anchors:
/// - `cost=a..b` → startup and total cost; `cost=a` sets only the total
///   (the single-value form never synthesizes a startup cost)
/// - `rows=n` → plan rows, or actual rows once an `actual` section began
/// - `actual time=a..b` → the cumulative second value; the per-loop first
///   value is reported separately for the caller to retain
/// - `loops=n`
///
/// Numbers may be signed, fractional, or in scientific notation (`1e3`).
/// Values that violate the model are refused like any other miss: an
/// inverted `cost=A..B` range (A > B) sets nothing, and `loops=0` leaves
/// the loop count unset.
pub fn extract_stats(caption: &str) -> (NodeStats, String) {
    let mut stats = NodeStats::default();
    let mut removed: Vec<(usize, usize)> = Vec::new();
    let mut in_actual_section = false;

    let bytes = caption.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !caption.is_char_boundary(i) || !at_word_boundary(bytes, i) {
            i += 1;
            continue;
        }

        let rest = &caption[i..];
        if let Some(len) = match_anchor(rest, "actual time=") {
            in_actual_section = true;
            if let Some((first, second, consumed)) = scan_value(&rest[len..]) {
                match second {
                    Some(total) => {
                        stats.actual_startup_time_ms = Some(first);
                        stats.actual_time_ms = Some(total);
                    }
                    None => stats.actual_time_ms = Some(first),
                }
                removed.push((i, i + len + consumed));
                i += len + consumed;
                continue;
            }
        } else if let Some(len) = match_anchor(rest, "cost=") {
            if let Some((first, second, consumed)) = scan_value(&rest[len..]) {
                match second {
                    // An inverted range is nonsense; refuse it and leave
                    // the token in the label so the caller can see it.
                    Some(total) if total < first => {
                        i += 1;
                        continue;
                    }
                    Some(total) => {
                        stats.startup_cost = Some(first);
                        stats.total_cost = Some(total);
                    }
                    None => stats.total_cost = Some(first),
                }
                removed.push((i, i + len + consumed));
                i += len + consumed;
                continue;
            }
        } else if let Some(len) = match_anchor(rest, "rows=") {
            if let Some((value, _, consumed)) = scan_value(&rest[len..]) {
                let rows = as_count(value);
                if in_actual_section {
                    stats.actual_rows = rows;
                } else {
                    stats.plan_rows = rows;
                }
                removed.push((i, i + len + consumed));
                i += len + consumed;
                continue;
            }
        } else if let Some(len) = match_anchor(rest, "loops=") {
            if let Some((value, _, consumed)) = scan_value(&rest[len..]) {
                // A zero loop count cannot have produced the node's
                // actuals; absent already means "ran once".
                stats.loops = as_count(value).filter(|&n| n > 0);
                removed.push((i, i + len + consumed));
                i += len + consumed;
                continue;
            }
        } else if rest.starts_with("actual") {
            // "actual rows=..." without a time range still switches the
            // rows= interpretation over.
            in_actual_section = true;
        }

        i += 1;
    }

    (stats, cleanup_label(caption, &removed))
}

/// Matches `anchor` case-insensitively at the start of `s`. Compares
/// bytes, so a multi-byte character part-way into the window cannot
/// split a char.
fn match_anchor(s: &str, anchor: &str) -> Option<usize> {
    let len = anchor.len();
    if s.len() >= len && s.as_bytes()[..len].eq_ignore_ascii_case(anchor.as_bytes()) {
        Some(len)
    } else {
        None
    }
}

/// An anchor must not continue a preceding identifier, so `subcost=` does
/// not match `cost=`.
fn at_word_boundary(bytes: &[u8], i: usize) -> bool {
    i == 0 || !(bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_')
}

/// Scans a numeric value or `a..b` range. Returns the first value, the
/// optional second value, and the number of bytes consumed.
fn scan_value(s: &str) -> Option<(f64, Option<f64>, usize)> {
    let (first, mut consumed) = scan_number(s)?;
    let mut second = None;
    if let Some(after) = s[consumed..].strip_prefix("..")
        && let Some((b, b_len)) = scan_number(after)
    {
        second = Some(b);
        consumed += 2 + b_len;
    }
    Some((first, second, consumed))
}

/// Scans one numeric literal: optional sign, digits, optional fraction,
/// optional exponent. Returns the value and its byte length.
fn scan_number(s: &str) -> Option<(f64, usize)> {
    let bytes = s.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == int_start {
        return None;
    }

    // Fraction, but not a `..` range separator.
    if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    // Exponent
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    s[..i].parse::<f64>().ok().map(|v| (v, i))
}

/// Converts a scanned value to a row/loop count. Scientific notation is
/// accepted (`1e3` rows is 1000 rows); negative values are nonsense for
/// counts and are discarded.
fn as_count(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 {
        Some(value as u64)
    } else {
        None
    }
}

/// Rebuilds the caption without the matched spans, then tidies up the
/// debris they leave behind: emptied parentheses and doubled spaces.
fn cleanup_label(caption: &str, removed: &[(usize, usize)]) -> String {
    if removed.is_empty() {
        return caption.to_string();
    }

    let mut label = String::with_capacity(caption.len());
    let mut pos = 0;
    for &(start, end) in removed {
        label.push_str(&caption[pos..start]);
        pos = end;
    }
    label.push_str(&caption[pos..]);

    tidy_label(&label)
}

pub(crate) fn tidy_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_space = false;
    for c in label.chars() {
        if c == ' ' {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }

    // Parentheses that held nothing but statistics are now empty shells.
    let out = out.replace("( )", "").replace("()", "");

    let mut cleaned = String::with_capacity(out.len());
    let mut last_space = false;
    for c in out.chars() {
        if c == ' ' {
            if !last_space {
                cleaned.push(' ');
            }
            last_space = true;
        } else {
            cleaned.push(c);
            last_space = false;
        }
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests;
