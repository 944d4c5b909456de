use std::fmt;

use serde::{Deserialize, Serialize};

/// Vendor placeholder used when the license number or name is missing.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// Product type placeholder used when the source carries none.
pub const UNKNOWN_PRODUCT_TYPE: &str = "Unknown";

// ---------------------------------------------------------------------------
// Source system
// ---------------------------------------------------------------------------

/// Which input dialect produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceSystem {
    Bamboo,
    Cultivera,
    GrowFlow,
    #[serde(rename = "CSV")]
    Csv,
}

impl SourceSystem {
    pub const ALL: [SourceSystem; 4] = [
        SourceSystem::Bamboo,
        SourceSystem::Cultivera,
        SourceSystem::GrowFlow,
        SourceSystem::Csv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bamboo => "Bamboo",
            Self::Cultivera => "Cultivera",
            Self::GrowFlow => "GrowFlow",
            Self::Csv => "CSV",
        }
    }

    /// Comma-separated list of every accepted format, for error messages.
    pub fn accepted_list() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Canonical record
// ---------------------------------------------------------------------------

/// One inventory item in the schema every source format is mapped into.
///
/// Field names serialize exactly as the label templates reference them
/// (`ProductName`, `THCContent`, ...). A record that reaches callers always
/// has a non-empty `product_name` and `barcode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CanonicalRecord {
    pub product_name: String,
    pub barcode: String,
    pub product_type: String,
    pub quantity_received: String,
    pub accepted_date: String,
    pub vendor: String,
    pub strain_name: String,
    #[serde(rename = "THCContent")]
    pub thc_content: String,
    #[serde(rename = "CBDContent")]
    pub cbd_content: String,
    pub source_system: SourceSystem,
}

impl CanonicalRecord {
    /// Empty record tagged with its source; mappers fill in the fields.
    pub fn blank(source_system: SourceSystem) -> Self {
        Self {
            product_name: String::new(),
            barcode: String::new(),
            product_type: String::new(),
            quantity_received: String::new(),
            accepted_date: String::new(),
            vendor: String::new(),
            strain_name: String::new(),
            thc_content: String::new(),
            cbd_content: String::new(),
            source_system,
        }
    }

    /// Why this record cannot enter the table, if it can't.
    pub fn missing_required(&self) -> Option<DropReason> {
        let no_name = self.product_name.trim().is_empty();
        let no_barcode = self.barcode.trim().is_empty();
        match (no_name, no_barcode) {
            (true, true) => Some(DropReason::MissingBoth),
            (true, false) => Some(DropReason::MissingProductName),
            (false, true) => Some(DropReason::MissingBarcode),
            (false, false) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingProductName,
    MissingBarcode,
    MissingBoth,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProductName => write!(f, "missing product name"),
            Self::MissingBarcode => write!(f, "missing barcode"),
            Self::MissingBoth => write!(f, "missing product name and barcode"),
        }
    }
}

/// A source item excluded from the table. `index` is the 0-based position
/// of the item (or data row) in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRecord {
    pub index: usize,
    pub reason: DropReason,
}

/// Result of one normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Normalized {
    pub source: SourceSystem,
    pub records: Vec<CanonicalRecord>,
    pub dropped: Vec<DroppedRecord>,
}

impl Normalized {
    /// Split mapped candidates into accepted records and dropped items.
    ///
    /// Applies the schema-wide product type default before validation.
    pub(crate) fn from_candidates(
        source: SourceSystem,
        candidates: impl IntoIterator<Item = CanonicalRecord>,
    ) -> Self {
        let mut records = Vec::new();
        let mut dropped = Vec::new();

        for (index, mut record) in candidates.into_iter().enumerate() {
            if let Some(reason) = record.missing_required() {
                log::warn!("{source} item {index} dropped: {reason}");
                dropped.push(DroppedRecord { index, reason });
                continue;
            }
            if record.product_type.trim().is_empty() {
                record.product_type = UNKNOWN_PRODUCT_TYPE.to_string();
            }
            records.push(record);
        }

        Self { source, records, dropped }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, barcode: &str) -> CanonicalRecord {
        CanonicalRecord {
            product_name: name.into(),
            barcode: barcode.into(),
            ..CanonicalRecord::blank(SourceSystem::Bamboo)
        }
    }

    #[test]
    fn serializes_template_field_names() {
        let mut r = record("Gummy", "BC1");
        r.thc_content = "21.5%".into();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["ProductName"], "Gummy");
        assert_eq!(json["QuantityReceived"], "");
        assert_eq!(json["THCContent"], "21.5%");
        assert_eq!(json["CBDContent"], "");
        assert_eq!(json["SourceSystem"], "Bamboo");
    }

    #[test]
    fn csv_source_serializes_uppercase() {
        let json = serde_json::to_value(SourceSystem::Csv).unwrap();
        assert_eq!(json, "CSV");
        assert_eq!(SourceSystem::Csv.to_string(), "CSV");
    }

    #[test]
    fn missing_required_reasons() {
        assert_eq!(record("A", "1").missing_required(), None);
        assert_eq!(record("", "1").missing_required(), Some(DropReason::MissingProductName));
        assert_eq!(record("A", "  ").missing_required(), Some(DropReason::MissingBarcode));
        assert_eq!(record("", "").missing_required(), Some(DropReason::MissingBoth));
    }

    #[test]
    fn from_candidates_reports_drops_and_defaults_type() {
        let out = Normalized::from_candidates(
            SourceSystem::Bamboo,
            vec![record("A", "1"), record("", "2"), record("C", "3")],
        );
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].product_type, UNKNOWN_PRODUCT_TYPE);
        assert_eq!(
            out.dropped,
            vec![DroppedRecord { index: 1, reason: DropReason::MissingProductName }]
        );
    }
}
