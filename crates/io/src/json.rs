// JSON input parsing and page context export

use std::io::Write;

use serde_json::Value;
use slipgen_engine::{NormalizeError, Page};

use crate::decode::decode_text;
use crate::error::IoError;

const SNIPPET_RADIUS: usize = 20;

/// Parse a JSON document. Blank input is `EmptyInput`; syntax errors carry
/// the position and a short snippet of the surrounding text.
pub fn parse_json(bytes: &[u8]) -> Result<Value, IoError> {
    let text = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(NormalizeError::EmptyInput.into());
    }
    serde_json::from_str(&text).map_err(|e| IoError::InvalidJson {
        line: e.line(),
        column: e.column(),
        message: strip_position(&e.to_string()),
        snippet: snippet(&text, e.line(), e.column()),
    })
}

/// Write page contexts as a pretty-printed JSON array, one
/// `{"Label1": {...}, ...}` object per page.
pub fn write_pages_json<W: Write>(pages: &[Page], writer: W) -> Result<(), IoError> {
    serde_json::to_writer_pretty(writer, pages).map_err(IoError::Json)
}

/// serde_json appends " at line X column Y"; the position is reported
/// separately.
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(pos) => message[..pos].to_string(),
        None => message.to_string(),
    }
}

fn snippet(text: &str, line: usize, column: usize) -> String {
    let Some(source_line) = text.lines().nth(line.saturating_sub(1)) else {
        return String::new();
    };
    let chars: Vec<char> = source_line.chars().collect();
    let at = column.saturating_sub(1).min(chars.len());
    let start = at.saturating_sub(SNIPPET_RADIUS);
    let end = (at + SNIPPET_RADIUS).min(chars.len());
    chars[start..end].iter().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipgen_engine::{paginate, CanonicalRecord, PageOptions, SourceSystem};

    #[test]
    fn test_parse_json_with_bom() {
        let value = parse_json(b"\xef\xbb\xbf{\"data\": {}}").unwrap();
        assert!(value["data"].is_object());
    }

    #[test]
    fn test_parse_json_blank_is_empty_input() {
        assert!(parse_json(b"").unwrap_err().is_empty_input());
        assert!(parse_json(b" \n\t").unwrap_err().is_empty_input());
    }

    #[test]
    fn test_parse_json_syntax_error_has_snippet() {
        let err = parse_json(b"{\n  \"items\": [1, 2,, 3]\n}").unwrap_err();
        match err {
            IoError::InvalidJson { line, snippet, message, .. } => {
                assert_eq!(line, 2);
                assert!(snippet.contains("2,,"), "snippet: {snippet}");
                assert!(!message.contains(" at line "), "message: {message}");
            }
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn test_write_pages_json() {
        let records = vec![CanonicalRecord {
            product_name: "Gummy".into(),
            barcode: "BC1".into(),
            ..CanonicalRecord::blank(SourceSystem::Bamboo)
        }];
        let pages = paginate(&records, &PageOptions::default()).pages;

        let mut buf = Vec::new();
        write_pages_json(&pages, &mut buf).unwrap();
        let value: Value = serde_json::from_slice(&buf).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(array[0]["Label1"]["ProductName"], "Gummy");
        assert_eq!(array[0]["Label4"]["Barcode"], "");
    }
}
