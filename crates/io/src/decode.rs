// Byte decoding and input kind sniffing

use std::path::Path;

use serde_json::Value;
use slipgen_engine::{Input, Table};

use crate::error::IoError;

const BOM: char = '\u{feff}';

/// Decode input bytes as UTF-8, falling back to Windows-1252 (common for
/// spreadsheet-exported CSVs). A leading byte order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::debug!("input is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Read a text file (label templates) with [`decode_text`].
pub fn read_text_file(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path)?;
    Ok(decode_text(&bytes))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Json,
    Table,
}

/// Decide how to parse an input. The file extension wins when it is a
/// known one; otherwise the first non-whitespace byte decides (`{` or `[`
/// means JSON).
pub fn sniff_kind(path: Option<&Path>, bytes: &[u8]) -> InputKind {
    let ext = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv" | "tsv" | "txt") => return InputKind::Table,
        Some("json") => return InputKind::Json,
        _ => {}
    }

    let body = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{' | b'[') => InputKind::Json,
        _ => InputKind::Table,
    }
}

/// Parsed input ready for normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Json(Value),
    Table(Table),
}

impl Loaded {
    pub fn as_input(&self) -> Input<'_> {
        match self {
            Self::Json(value) => Input::Json(value),
            Self::Table(table) => Input::Table(table),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Json(_) => InputKind::Json,
            Self::Table(_) => InputKind::Table,
        }
    }
}

/// Sniff and parse raw input bytes. `path` only informs the sniffing.
pub fn load_bytes(path: Option<&Path>, bytes: &[u8]) -> Result<Loaded, IoError> {
    match sniff_kind(path, bytes) {
        InputKind::Json => Ok(Loaded::Json(crate::json::parse_json(bytes)?)),
        InputKind::Table => Ok(Loaded::Table(crate::csv::read_table(bytes)?)),
    }
}

pub fn load_file(path: &Path) -> Result<Loaded, IoError> {
    let bytes = std::fs::read(path)?;
    load_bytes(Some(path), &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_decode_utf8_and_bom() {
        assert_eq!(decode_text("Caf\u{e9}".as_bytes()), "Caf\u{e9}");
        assert_eq!(decode_text(b"\xef\xbb\xbfName,Barcode"), "Name,Barcode");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // 0xE9 is "é" in Windows-1252 and invalid as a lone UTF-8 byte
        assert_eq!(decode_text(b"Caf\xe9"), "Caf\u{e9}");
        // 0x96 is an en dash
        assert_eq!(decode_text(b"A \x96 B"), "A \u{2013} B");
    }

    #[test]
    fn test_sniff_by_extension() {
        let json_like = b"{\"a\": 1}";
        assert_eq!(sniff_kind(Some(Path::new("x.CSV")), json_like), InputKind::Table);
        assert_eq!(sniff_kind(Some(Path::new("x.json")), b"a,b"), InputKind::Json);
    }

    #[test]
    fn test_sniff_by_content() {
        assert_eq!(sniff_kind(None, b"  \n {\"data\": {}}"), InputKind::Json);
        assert_eq!(sniff_kind(None, b"[1]"), InputKind::Json);
        assert_eq!(sniff_kind(None, b"\xef\xbb\xbf{}"), InputKind::Json);
        assert_eq!(sniff_kind(Some(Path::new("export.dat")), b"Barcode,Name"), InputKind::Table);
        assert_eq!(sniff_kind(None, b""), InputKind::Table);
    }

    #[test]
    fn test_read_text_file_decodes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("label.txt");
        fs::write(&path, b"Caf\xe9 {{Label1.Barcode}}").unwrap();
        assert_eq!(read_text_file(&path).unwrap(), "Caf\u{e9} {{Label1.Barcode}}");

        let missing = read_text_file(&dir.path().join("none.txt")).unwrap_err();
        assert!(matches!(missing, IoError::Io(_)));
    }

    #[test]
    fn test_load_file_dispatches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, r#"{"data": {"manifest": {}}}"#).unwrap();
        assert_eq!(load_file(&path).unwrap().kind(), InputKind::Json);

        let path = dir.path().join("inventory.csv");
        fs::write(&path, "Product Name,Barcode\nGummy,BC1\n").unwrap();
        match load_file(&path).unwrap() {
            Loaded::Table(table) => assert_eq!(table.rows.len(), 1),
            other => panic!("expected table, got {other:?}"),
        }
    }
}
