//! Core of the slip generator: pure, synchronous, no I/O.
//!
//! Raw transfer data (a parsed JSON value or a decoded CSV table) goes
//! through [`normalize`] into canonical records, which [`paginate`] splits
//! into fixed-size label pages and [`pipeline::generate`] renders into one
//! document.

mod dialect;
pub mod error;
pub mod model;
pub mod normalize;
pub mod paginate;
pub mod pipeline;
pub mod render;
pub mod select;
pub mod tabular;

pub use error::NormalizeError;
pub use model::{
    CanonicalRecord, DropReason, DroppedRecord, Normalized, SourceSystem, UNKNOWN_PRODUCT_TYPE,
    UNKNOWN_VENDOR,
};
pub use normalize::{detect, normalize, normalize_json, Input, NormalizeOptions};
pub use paginate::{
    paginate, CoercionWarning, Page, PageOptions, PageSize, Pagination, Quantity, Slot,
    VendorDisplay,
};
pub use pipeline::{generate, Document, Progress, Stage};
pub use render::{compose, render_page, DEFAULT_TEMPLATE, PAGE_BREAK};
pub use select::{group_by_type, search, select_types, sort_records, SortOrder};
pub use tabular::Table;
