// CSV/TSV table reading and canonical CSV export

use std::io::Write;

use slipgen_engine::{CanonicalRecord, NormalizeError, Table};

use crate::decode::decode_text;
use crate::error::IoError;

/// Header row of the canonical CSV export, in column order.
pub const CANONICAL_HEADERS: [&str; 10] = [
    "ProductName",
    "Barcode",
    "ProductType",
    "QuantityReceived",
    "AcceptedDate",
    "Vendor",
    "StrainName",
    "THCContent",
    "CBDContent",
    "SourceSystem",
];

/// Decode and parse a delimited table. The first non-empty line is the
/// header row; fully empty rows are skipped and short rows are padded
/// with empty cells up to the header width.
pub fn read_table(bytes: &[u8]) -> Result<Table, IoError> {
    let content = decode_text(bytes);
    if content.trim().is_empty() {
        return Err(NormalizeError::EmptyInput.into());
    }
    let delimiter = sniff_delimiter(&content);
    log::debug!("CSV delimiter sniffed as {:?}", delimiter as char);
    read_table_with_delimiter(&content, delimiter)
}

pub fn read_table_with_delimiter(content: &str, delimiter: u8) -> Result<Table, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        match &headers {
            None => headers = Some(fields),
            Some(h) => {
                if fields.len() < h.len() {
                    fields.resize(h.len(), String::new());
                }
                rows.push(fields);
            }
        }
    }

    let headers = headers.ok_or(NormalizeError::EmptyInput)?;
    Ok(Table::new(headers, rows))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // The header line must split for the candidate to count
        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        // Lines agreeing with the header width, weighted by width
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Write canonical records as CSV. The header row is written even when
/// `records` is empty.
pub fn write_records_csv<W: Write>(records: &[CanonicalRecord], writer: W) -> Result<(), IoError> {
    let mut out = csv::WriterBuilder::new().from_writer(writer);
    out.write_record(CANONICAL_HEADERS)?;
    for r in records {
        out.write_record([
            r.product_name.as_str(),
            r.barcode.as_str(),
            r.product_type.as_str(),
            r.quantity_received.as_str(),
            r.accepted_date.as_str(),
            r.vendor.as_str(),
            r.strain_name.as_str(),
            r.thc_content.as_str(),
            r.cbd_content.as_str(),
            r.source_system.as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}
