//! Page chunking and the per-page label context.
//!
//! Records are split into fixed-size, order-preserving chunks. Every page
//! carries exactly `page_size` slots; slots past the last record on the
//! final page are padding with every field empty.
//!
//! | Context key | Value                                         |
//! |-------------|-----------------------------------------------|
//! | `Label1`    | fields of the first slot                      |
//! | ...         | ...                                           |
//! | `LabelN`    | fields of slot N (empty strings when padding) |

use std::fmt;
use std::num::NonZeroUsize;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::model::{CanonicalRecord, UNKNOWN_VENDOR};

const DEFAULT_PAGE_SIZE: usize = 4;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Labels per page. Any positive count is valid here; hosts narrow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    pub fn new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the `Vendor` field is shown on a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VendorDisplay {
    /// `"<license> - <name>"` as normalized.
    #[default]
    Full,
    /// Only the part after the first `" - "`.
    NameOnly,
}

impl VendorDisplay {
    pub fn apply(self, vendor: &str) -> String {
        match self {
            Self::Full => vendor.to_string(),
            Self::NameOnly => match vendor.split_once(" - ") {
                Some((_, name)) if name.trim().is_empty() => UNKNOWN_VENDOR.to_string(),
                Some((_, name)) => name.to_string(),
                None => vendor.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub page_size: PageSize,
    pub vendor_display: VendorDisplay,
}

// ---------------------------------------------------------------------------
// Slots and pages
// ---------------------------------------------------------------------------

/// Quantity after coercion: a whole count when the source value parsed as
/// a number, otherwise the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Quantity {
    Count(i64),
    Raw(String),
}

impl Quantity {
    fn empty() -> Self {
        Self::Raw(String::new())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Raw(s) => f.write_str(s),
        }
    }
}

/// Fields a label template can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Slot {
    pub product_name: String,
    pub barcode: String,
    pub accepted_date: String,
    pub quantity_received: Quantity,
    pub vendor: String,
    pub strain_name: String,
    pub product_type: String,
    #[serde(rename = "THCContent")]
    pub thc_content: String,
    #[serde(rename = "CBDContent")]
    pub cbd_content: String,
}

impl Slot {
    pub const FIELDS: [&'static str; 9] = [
        "ProductName",
        "Barcode",
        "AcceptedDate",
        "QuantityReceived",
        "Vendor",
        "StrainName",
        "ProductType",
        "THCContent",
        "CBDContent",
    ];

    /// Padding slot: every field empty.
    pub fn empty() -> Self {
        Self {
            product_name: String::new(),
            barcode: String::new(),
            accepted_date: String::new(),
            quantity_received: Quantity::empty(),
            vendor: String::new(),
            strain_name: String::new(),
            product_type: String::new(),
            thc_content: String::new(),
            cbd_content: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Value of a template field by its context name, `None` if the name
    /// is not a slot field.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "ProductName" => self.product_name.clone(),
            "Barcode" => self.barcode.clone(),
            "AcceptedDate" => self.accepted_date.clone(),
            "QuantityReceived" => self.quantity_received.to_string(),
            "Vendor" => self.vendor.clone(),
            "StrainName" => self.strain_name.clone(),
            "ProductType" => self.product_type.clone(),
            "THCContent" => self.thc_content.clone(),
            "CBDContent" => self.cbd_content.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// One output page. `number` is 1-based; `filled` counts the leading slots
/// backed by records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub slots: Vec<Slot>,
    pub filled: usize,
}

impl Page {
    /// Slot for `Label<n>` (1-based).
    pub fn label(&self, n: usize) -> Option<&Slot> {
        n.checked_sub(1).and_then(|idx| self.slots.get(idx))
    }

    pub fn filled_slots(&self) -> &[Slot] {
        &self.slots[..self.filled]
    }
}

/// Serializes as the template context: `{"Label1": {...}, ..., "LabelN": {...}}`
/// in slot order.
impl Serialize for Page {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (idx, slot) in self.slots.iter().enumerate() {
            map.serialize_entry(&format!("Label{}", idx + 1), slot)?;
        }
        map.end()
    }
}

/// A quantity that could not be read as a number; the slot keeps the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoercionWarning {
    pub page: usize,
    pub slot: usize,
    pub barcode: String,
    pub value: String,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {} label {}: quantity {:?} for barcode {} is not a number",
            self.page, self.slot, self.value, self.barcode
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub pages: Vec<Page>,
    pub warnings: Vec<CoercionWarning>,
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Split `records` into pages of `options.page_size` slots.
pub fn paginate(records: &[CanonicalRecord], options: &PageOptions) -> Pagination {
    let mut out = Pagination::default();
    for (idx, chunk) in records.chunks(options.page_size.get()).enumerate() {
        let page = build_page(idx + 1, chunk, options, &mut out.warnings);
        out.pages.push(page);
    }
    log::debug!(
        "{} record(s) -> {} page(s) of {}",
        records.len(),
        out.pages.len(),
        options.page_size
    );
    out
}

/// Page count for `len` records.
pub fn page_count(len: usize, page_size: PageSize) -> usize {
    len.div_ceil(page_size.get())
}

/// Build one page from a chunk of at most `page_size` records.
pub fn build_page(
    number: usize,
    chunk: &[CanonicalRecord],
    options: &PageOptions,
    warnings: &mut Vec<CoercionWarning>,
) -> Page {
    let size = options.page_size.get();
    let mut slots = Vec::with_capacity(size);

    for (idx, record) in chunk.iter().take(size).enumerate() {
        let quantity = match coerce_quantity(&record.quantity_received) {
            Ok(q) => q,
            Err(raw) => {
                let warning = CoercionWarning {
                    page: number,
                    slot: idx + 1,
                    barcode: record.barcode.clone(),
                    value: raw.clone(),
                };
                log::warn!("{warning}");
                warnings.push(warning);
                Quantity::Raw(raw)
            }
        };
        slots.push(Slot {
            product_name: record.product_name.clone(),
            barcode: record.barcode.clone(),
            accepted_date: record.accepted_date.clone(),
            quantity_received: quantity,
            vendor: options.vendor_display.apply(&record.vendor),
            strain_name: record.strain_name.clone(),
            product_type: record.product_type.clone(),
            thc_content: record.thc_content.clone(),
            cbd_content: record.cbd_content.clone(),
        });
    }

    let filled = slots.len();
    slots.resize_with(size, Slot::empty);
    Page { number, slots, filled }
}

/// `"12"`, `"12.9"` and `" 3 "` become counts (truncated toward zero).
/// Empty text and finite numbers too large for a count stay as text;
/// anything else is returned as the error.
fn coerce_quantity(raw: &str) -> Result<Quantity, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Quantity::Raw(raw.to_string()));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.trunc().abs() < i64::MAX as f64 => Ok(Quantity::Count(v.trunc() as i64)),
        Ok(v) if v.is_finite() => Ok(Quantity::Raw(trimmed.to_string())),
        _ => Err(raw.to_string()),
    }
}
