//! Generic CSV tables: header synonyms, required columns, defaults.
//!
//! The caller decodes CSV bytes into a [`Table`]; this module only maps
//! header names onto canonical fields and builds records.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::dialect::date_only;
use crate::error::NormalizeError;
use crate::model::{CanonicalRecord, Normalized, SourceSystem, UNKNOWN_PRODUCT_TYPE, UNKNOWN_VENDOR};
use crate::select::{sort_records, SortOrder};

/// Decoded CSV: one header row plus data rows of plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// No header names and no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.headers.iter().all(|h| h.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Header synonyms
// ---------------------------------------------------------------------------

/// Canonical column a CSV header can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ProductName,
    Barcode,
    QuantityReceived,
    ProductType,
    AcceptedDate,
    Vendor,
    StrainName,
    ThcContent,
    CbdContent,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProductName => "ProductName",
            Self::Barcode => "Barcode",
            Self::QuantityReceived => "QuantityReceived",
            Self::ProductType => "ProductType",
            Self::AcceptedDate => "AcceptedDate",
            Self::Vendor => "Vendor",
            Self::StrainName => "StrainName",
            Self::ThcContent => "THCContent",
            Self::CbdContent => "CBDContent",
        }
    }
}

const REQUIRED: &[Field] = &[Field::ProductName, Field::Barcode];

const SYNONYMS: &[(&str, Field)] = &[
    ("Product Name*", Field::ProductName),
    ("Product Name", Field::ProductName),
    ("ProductName", Field::ProductName),
    ("Barcode*", Field::Barcode),
    ("Barcode", Field::Barcode),
    ("Lot Number*", Field::Barcode),
    ("Lot Number", Field::Barcode),
    ("Quantity Received*", Field::QuantityReceived),
    ("Quantity Received", Field::QuantityReceived),
    ("Quantity*", Field::QuantityReceived),
    ("Quantity", Field::QuantityReceived),
    ("QuantityReceived", Field::QuantityReceived),
    ("Product Type*", Field::ProductType),
    ("Product Type", Field::ProductType),
    ("Inventory Type", Field::ProductType),
    ("ProductType", Field::ProductType),
    ("Accepted Date", Field::AcceptedDate),
    ("AcceptedDate", Field::AcceptedDate),
    ("Vendor", Field::Vendor),
    ("Strain Name", Field::StrainName),
    ("StrainName", Field::StrainName),
    ("THC Content", Field::ThcContent),
    ("THCContent", Field::ThcContent),
    ("CBD Content", Field::CbdContent),
    ("CBDContent", Field::CbdContent),
];

/// Canonical field for a header cell, after trimming. Exact match only.
pub fn canonical_field(header: &str) -> Option<Field> {
    let header = header.trim();
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == header)
        .map(|(_, field)| *field)
}

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

/// Final column names plus, for each canonical field, the column that
/// feeds it (the first one mapped to that field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    pub names: Vec<String>,
    primary: HashMap<Field, usize>,
}

impl HeaderMap {
    pub fn column(&self, field: Field) -> Option<usize> {
        self.primary.get(&field).copied()
    }
}

/// Rename headers onto canonical names.
///
/// 1. Raw headers that repeat get a positional `_<index>` suffix.
/// 2. Each header is looked up in the synonym table. The first column for
///    a field takes the canonical name; later ones get `_1`, `_2`, ...
/// 3. `ProductName` and `Barcode` must both resolve.
/// 4. Any name that still collides is reported.
pub fn map_headers(headers: &[String]) -> Result<HeaderMap, NormalizeError> {
    let trimmed: Vec<&str> = headers.iter().map(|h| h.trim()).collect();

    let mut names = Vec::with_capacity(trimmed.len());
    let mut primary: HashMap<Field, usize> = HashMap::new();
    let mut repeats: HashMap<Field, usize> = HashMap::new();

    for (idx, header) in trimmed.iter().enumerate() {
        let repeated = trimmed.iter().filter(|h| *h == header).count() > 1;
        match canonical_field(header) {
            Some(field) => {
                if primary.contains_key(&field) {
                    let n = repeats.entry(field).or_insert(0);
                    *n += 1;
                    names.push(format!("{}_{}", field.name(), n));
                } else {
                    primary.insert(field, idx);
                    names.push(field.name().to_string());
                }
            }
            None if repeated => names.push(format!("{header}_{idx}")),
            None => names.push(header.to_string()),
        }
    }
    log::debug!("CSV columns {:?} mapped to {:?}", trimmed, names);

    let missing: Vec<String> = REQUIRED
        .iter()
        .filter(|field| !primary.contains_key(field))
        .map(|field| field.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(NormalizeError::MissingColumns(missing));
    }

    let mut duplicates: Vec<String> = Vec::new();
    for (idx, name) in names.iter().enumerate() {
        if names[..idx].contains(name) && !duplicates.contains(name) {
            duplicates.push(name.clone());
        }
    }
    if !duplicates.is_empty() {
        log::error!("duplicate CSV columns after mapping: {:?}", duplicates);
        return Err(NormalizeError::DuplicateColumns(duplicates));
    }

    Ok(HeaderMap { names, primary })
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Map a decoded table onto canonical records.
///
/// `today` fills `AcceptedDate` when the table has no date column. Rows
/// are then ordered by `order`.
pub fn normalize_table(
    table: &Table,
    today: NaiveDate,
    order: SortOrder,
) -> Result<Normalized, NormalizeError> {
    if table.is_empty() {
        return Err(NormalizeError::EmptyInput);
    }

    let header_map = map_headers(&table.headers)?;
    let today = today.format("%Y-%m-%d").to_string();

    let candidates = table.rows.iter().map(|row| {
        let cell = |field: Field| -> Option<String> {
            header_map
                .column(field)
                .map(|idx| row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default())
        };

        let vendor = cell(Field::Vendor)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string());
        let accepted_date = match cell(Field::AcceptedDate) {
            Some(date) => date_only(&date),
            None => today.clone(),
        };

        CanonicalRecord {
            product_name: cell(Field::ProductName).unwrap_or_default(),
            barcode: cell(Field::Barcode).unwrap_or_default(),
            product_type: cell(Field::ProductType)
                .unwrap_or_else(|| UNKNOWN_PRODUCT_TYPE.to_string()),
            quantity_received: cell(Field::QuantityReceived).unwrap_or_default(),
            accepted_date,
            vendor,
            strain_name: cell(Field::StrainName).unwrap_or_default(),
            thc_content: cell(Field::ThcContent).unwrap_or_default(),
            cbd_content: cell(Field::CbdContent).unwrap_or_default(),
            source_system: SourceSystem::Csv,
        }
    });

    let mut normalized = Normalized::from_candidates(SourceSystem::Csv, candidates);
    sort_records(&mut normalized.records, order);
    Ok(normalized)
}
