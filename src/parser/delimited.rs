//! Primary row parser backed by the `csv` crate

use csv::{ReaderBuilder, StringRecord};

use crate::utils::error::RowParseError;

fn is_terminator(byte: &u8) -> bool {
    matches!(byte, b'\r' | b'\n')
}

/// Empty rows for the blank lines in a run of line terminators
///
/// `after_row` is set when the run ends a row, in which case its first
/// newline belongs to that row.
fn blank_rows(run: &[u8], after_row: bool) -> usize {
    let newlines = run.iter().filter(|b| **b == b'\n').count();
    if after_row {
        newlines.saturating_sub(1)
    } else {
        newlines
    }
}

/// Parse comma-delimited text with a standards-compliant reader
///
/// The reader is configured without header handling so the header row is
/// returned like any other row, and with flexible record lengths so ragged
/// rows are kept rather than rejected.
///
/// The reader skips blank lines on its own. They are put back as rows with a
/// single empty cell, recovered from the byte span each record consumed.
pub fn parse(text: &str) -> Result<Vec<Vec<String>>, RowParseError> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let bytes = text.as_bytes();

    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .double_quote(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    // byte offset where the previous row's content ended
    let mut content_end: Option<usize> = None;

    loop {
        let start = reader.position().byte() as usize;
        if !reader.read_record(&mut record)? {
            break;
        }
        let end = reader.position().byte() as usize;

        let span = &bytes[start..end];
        let lead = span.iter().take_while(|b| is_terminator(b)).count();
        let trail = span[lead..].iter().rev().take_while(|b| is_terminator(b)).count();

        let gap = &bytes[content_end.unwrap_or(0)..start + lead];
        let blanks = blank_rows(gap, content_end.is_some());
        rows.extend(std::iter::repeat_with(|| vec![String::new()]).take(blanks));

        rows.push(record.iter().map(str::to_string).collect());
        content_end = Some(end - trail);
    }

    let tail = &bytes[content_end.unwrap_or(0)..];
    let blanks = blank_rows(tail, content_end.is_some());
    rows.extend(std::iter::repeat_with(|| vec![String::new()]).take(blanks));

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_fields() {
        let rows = parse("a,\"b,c\",\"say \"\"hi\"\"\"\n1,2,3\n").unwrap();
        assert_eq!(rows, vec![vec!["a", "b,c", "say \"hi\""], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let rows = parse("a,b,c\n1\n").unwrap();
        assert_eq!(rows[1], vec!["1"]);
    }

    #[test]
    fn test_newline_inside_quotes() {
        let rows = parse("\"line1\nline2\",x\r\n").unwrap();
        assert_eq!(rows, vec![vec!["line1\nline2", "x"]]);
    }

    #[test]
    fn test_blank_lines_are_kept_as_empty_rows() {
        let rows = parse("date,customer\n\n1/1/2026,Acme\n").unwrap();
        assert_eq!(
            rows,
            vec![vec!["date", "customer"], vec![""], vec!["1/1/2026", "Acme"]]
        );

        let rows = parse("a\r\n\r\n\r\nb\r\n").unwrap();
        assert_eq!(rows, vec![vec!["a"], vec![""], vec![""], vec!["b"]]);
    }

    #[test]
    fn test_leading_and_trailing_blank_lines() {
        assert_eq!(parse("\na\n").unwrap(), vec![vec![""], vec!["a"]]);
        assert_eq!(parse("a\n\n").unwrap(), vec![vec!["a"], vec![""]]);
        assert_eq!(parse("\n").unwrap(), vec![vec![""]]);
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_blank_line_after_quoted_break() {
        let rows = parse("\"x\ny\"\n\nz").unwrap();
        assert_eq!(rows, vec![vec!["x\ny"], vec![""], vec!["z"]]);
    }

    #[test]
    fn test_strips_bom() {
        assert_eq!(parse("\u{FEFF}date,time\n").unwrap(), vec![vec!["date", "time"]]);
    }
}
