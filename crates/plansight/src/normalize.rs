//! Source Normalizer
//!
//! Strips engine- and client-specific decoration from raw EXPLAIN text
//! before structural parsing: box-drawing borders, ASCII separator rules,
//! and localized trailing row-count annotations. Works line by line and
//! never reorders the content lines it keeps.
//!
//! Normalization is best-effort and never fails; garbage input comes back
//! essentially unchanged.

use crate::plan::NormalizedSource;

/// Characters that make up separator/border rules (`+---+`, `┌────┐`, ...).
const SEPARATOR_CHARS: &[char] = &['-', '+', '┌', '┐', '└', '┘', '─', '│', '├', '┤'];

/// Row-count units by locale. Adding a locale is a data change here, not a
/// logic change anywhere else.
const ROW_COUNT_UNITS: &[&str] = &[
    "row", "rows", // English
    "ligne", "lignes", // French
    "fila", "filas", // Spanish
    "zeile", "zeilen", // German
];

/// Normalizes raw EXPLAIN output for structural parsing.
///
/// Separator lines are dropped, border pipes are stripped off content
/// lines, trailing `(<N> rows)`-style annotations are removed in any
/// supported locale, and blank lines (original or newly produced) are
/// dropped entirely - the structural parsers key off content lines only.
pub fn normalize(raw: &str) -> NormalizedSource {
    let mut kept: Vec<String> = Vec::new();

    for line in raw.lines() {
        if is_separator_line(line) {
            continue;
        }
        let line = strip_border_pipes(line);
        let line = strip_row_count(line);
        if line.trim().is_empty() {
            continue;
        }
        kept.push(line.to_string());
    }

    NormalizedSource::new(kept.join("\n"))
}

/// A separator line consists solely of rule/border characters and
/// whitespace, e.g. `+----+----+` or `┌─────────┐`.
fn is_separator_line(line: &str) -> bool {
    let mut saw_decoration = false;
    for c in line.chars() {
        if SEPARATOR_CHARS.contains(&c) {
            saw_decoration = true;
        } else if !c.is_whitespace() {
            return false;
        }
    }
    saw_decoration
}

/// Strips a leading/trailing table-border pipe (`|` or `│`) plus the one
/// padding space next to it. Only pipes that sit against whitespace (or
/// the line edge) count as borders; `|--`-style tree markers keep theirs.
fn strip_border_pipes(line: &str) -> &str {
    let mut s = line;

    if let Some(rest) = s.strip_prefix('|').or_else(|| s.strip_prefix('│'))
        && (rest.is_empty() || rest.starts_with(' '))
    {
        s = rest.strip_prefix(' ').unwrap_or(rest);
    }

    if let Some(rest) = s.strip_suffix('|').or_else(|| s.strip_suffix('│'))
        && (rest.is_empty() || rest.ends_with(' '))
    {
        s = rest.strip_suffix(' ').unwrap_or(rest);
    }

    s
}

/// Removes a trailing `(<N> <unit>)` row-count annotation. The match is
/// anchored to end of line (trailing whitespace allowed), so mid-line
/// occurrences of the same words are left untouched.
fn strip_row_count(line: &str) -> &str {
    let trimmed = line.trim_end();
    let Some(body) = trimmed.strip_suffix(')') else {
        return line;
    };
    let Some(open) = body.rfind('(') else {
        return line;
    };

    let mut parts = body[open + 1..].split_whitespace();
    let (Some(count), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return line;
    };

    if count.chars().all(|c| c.is_ascii_digit())
        && !count.is_empty()
        && ROW_COUNT_UNITS
            .iter()
            .any(|u| u.eq_ignore_ascii_case(unit))
    {
        trimmed[..open].trim_end()
    } else {
        line
    }
}
