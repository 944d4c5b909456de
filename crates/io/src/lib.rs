// Input decoding and output writers
//
// The engine never touches files or bytes; everything between raw input
// and a `serde_json::Value` / `Table` (and back out to disk) lives here.

pub mod csv;
pub mod decode;
pub mod error;
pub mod json;

pub use crate::csv::{read_table, sniff_delimiter, write_records_csv, CANONICAL_HEADERS};
pub use decode::{
    decode_text, load_bytes, load_file, read_text_file, sniff_kind, InputKind, Loaded,
};
pub use error::IoError;
pub use json::{parse_json, write_pages_json};
