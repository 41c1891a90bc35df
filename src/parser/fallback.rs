//! Character-level fallback row parser
//!
//! A two-state machine used when the primary reader is unavailable or
//! rejects the input. On well-formed input it must produce exactly the same
//! rows as [`super::delimited::parse`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InField,
    InQuotedField,
}

/// Parse comma-delimited text one character at a time
///
/// Supports quoted fields, `""` escapes, delimiters and line breaks inside
/// quotes, and both `\n` and `\r\n` line endings. A carriage return outside
/// quotes is dropped. A trailing line terminator does not start a new row.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::InField;
    // Whether the current row has consumed any content yet
    let mut row_started = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            State::InQuotedField => {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        state = State::InField;
                    }
                } else {
                    field.push(c);
                }
            }
            State::InField => match c {
                '"' => {
                    state = State::InQuotedField;
                    row_started = true;
                }
                ',' => {
                    row.push(std::mem::take(&mut field));
                    row_started = true;
                }
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                    row_started = false;
                }
                '\r' => {}
                _ => {
                    field.push(c);
                    row_started = true;
                }
            },
        }
    }

    if row_started || !row.is_empty() || !field.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
