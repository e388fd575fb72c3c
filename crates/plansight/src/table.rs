//! Fixed-width table rendering
//!
//! The acquisition side of the shared textual contract: engine adapters
//! that only get a result set back from EXPLAIN shape it into a
//! fixed-width text table, and the normalizer strips that shaping back
//! out. Columns are padded to the wider of header and values, joined with
//! `" | "`, and the header is underlined with a dashed rule of matching
//! widths.

/// Renders headers and rows as a fixed-width text table.
///
/// ```
/// use plansight::render_table;
///
/// let out = render_table(&["id", "table"], &[vec!["1".into(), "users".into()]]);
/// assert_eq!(out, "id | table\n---+------\n1  | users\n");
/// ```
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut out = String::new();
    append_row(&mut out, headers.iter().copied(), &widths);
    append_separator(&mut out, &widths);
    for row in rows {
        append_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn append_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push_str(" | ");
        }
        let width = widths.get(i).copied().unwrap_or(cell.len());
        out.push_str(cell);
        for _ in cell.len()..width {
            out.push(' ');
        }
    }
    out.push('\n');
}

fn append_separator(out: &mut String, widths: &[usize]) {
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            out.push_str("-+-");
        }
        for _ in 0..*width {
            out.push('-');
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests;
