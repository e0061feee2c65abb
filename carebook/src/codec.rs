//! Text codec for backing files.
//!
//! A backing file is a header line followed by one line per record. Values
//! are separated by commas. A value that contains a comma, a double quote or
//! a line break is wrapped in double quotes, with embedded quotes doubled:
//!
//! ```text
//! user_id,constant,value,timestamp
//! 1,heart_rate,75,2024-12-10T10:43:03
//! 2,"blood_pressure, systolic",141,2024-12-10T10:45:00
//! ```
//!
//! Quoted values may span several physical lines. Blank lines are ignored,
//! and both `\n` and `\r\n` terminators are accepted on read.

use std::mem;

/// A parse failure, reported with the physical line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseFailure {
    /// One-based physical line number.
    pub line: usize,
    /// Description of the failure.
    pub reason: String,
}

/// Encodes one row of values as a single logical line (without terminator).
pub(crate) fn encode_row<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let values: Vec<&str> = values.into_iter().collect();
    let mut line = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        // A lone empty value would otherwise read back as a blank line.
        if needs_quotes(value) || (values.len() == 1 && value.is_empty()) {
            line.push('"');
            line.push_str(&value.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(value);
        }
    }
    line
}

fn needs_quotes(value: &str) -> bool {
    value.contains([',', '"', '\n', '\r'])
}

/// Parses a whole document into rows of raw values.
///
/// The first returned row is the header. Returns an empty vector for an
/// empty or whitespace-only document.
pub(crate) fn parse_rows(text: &str) -> Result<Vec<Vec<String>>, ParseFailure> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut row_has_content = false;
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 0;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
                row_has_content = true;
            }
            ',' => {
                row.push(mem::take(&mut field));
                row_has_content = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                row.push(mem::take(&mut field));
                if row_has_content {
                    rows.push(mem::take(&mut row));
                } else {
                    row.clear();
                }
                row_has_content = false;
            }
            _ => {
                field.push(c);
                row_has_content = true;
            }
        }
    }

    if in_quotes {
        return Err(ParseFailure {
            line: quote_line,
            reason: "unterminated quoted value".to_string(),
        });
    }

    if row_has_content {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values_are_not_quoted() {
        assert_eq!(encode_row(["1", "heart_rate", "75"]), "1,heart_rate,75");
    }

    #[test]
    fn test_special_characters_are_quoted() {
        let line = encode_row(["a,b", "say \"hi\"", "two\nlines"]);
        assert_eq!(line, "\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\"");
    }

    #[test]
    fn test_json_value_survives_a_round_trip() {
        let json = r#"{"ambulance_required":true,"clinical_history_code":"HC-1"}"#;
        let text = format!("{}\n", encode_row(["1", json]));
        let rows = parse_rows(&text).unwrap();
        assert_eq!(rows, vec![vec!["1".to_string(), json.to_string()]]);
    }

    #[test]
    fn test_multiline_value_spans_physical_lines() {
        let text = "id,note\n1,\"first\nsecond\"\n2,plain\n";
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["1", "first\nsecond"]);
        assert_eq!(rows[2], vec!["2", "plain"]);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let text = "id,name\r\n1,Ana\r\n\r\n2,Pere\r\n";
        let rows = parse_rows(text).unwrap();
        assert_eq!(
            rows,
            vec![vec!["id", "name"], vec!["1", "Ana"], vec!["2", "Pere"]]
        );
    }

    #[test]
    fn test_trailing_empty_values_are_kept() {
        let rows = parse_rows("a,b,c\n1,,\n").unwrap();
        assert_eq!(rows[1], vec!["1", "", ""]);
    }

    #[test]
    fn test_lone_empty_value_round_trips() {
        let text = format!("units\n{}\n", encode_row([""]));
        let rows = parse_rows(&text).unwrap();
        assert_eq!(rows, vec![vec!["units".to_string()], vec![String::new()]]);
    }

    #[test]
    fn test_last_line_without_terminator() {
        let rows = parse_rows("a\n1").unwrap();
        assert_eq!(rows, vec![vec!["a"], vec!["1"]]);
    }

    #[test]
    fn test_unterminated_quote_reports_start_line() {
        let err = parse_rows("a,b\n1,\"open\n2,3\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_rows("").unwrap().is_empty());
        assert!(parse_rows("\n\n").unwrap().is_empty());
    }
}
