//! Single entry point: raw input shape in, canonical table out.

use chrono::NaiveDate;
use serde_json::Value;

use crate::dialect::{classify_object, is_empty_value, map_object, type_name};
use crate::error::NormalizeError;
use crate::model::{Normalized, SourceSystem};
use crate::select::SortOrder;
use crate::tabular::{normalize_table, Table};

/// Already-decoded input handed over by the host.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Json(&'a Value),
    Table(&'a Table),
}

/// Everything normalization needs from the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Skip detection and use this format. `None` detects.
    pub format: Option<SourceSystem>,
    /// Date injected for CSV tables without an accepted-date column.
    pub today: NaiveDate,
    /// Row order for CSV tables. JSON dialects keep document order.
    pub csv_order: SortOrder,
}

impl NormalizeOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self { format: None, today, csv_order: SortOrder::default() }
    }

    pub fn with_format(mut self, format: Option<SourceSystem>) -> Self {
        self.format = format;
        self
    }

    pub fn with_csv_order(mut self, order: SortOrder) -> Self {
        self.csv_order = order;
        self
    }
}

/// Identify the source format of `input` without mapping it.
pub fn detect(input: Input<'_>) -> Result<SourceSystem, NormalizeError> {
    match input {
        Input::Table(table) => {
            if table.is_empty() {
                Err(NormalizeError::EmptyInput)
            } else {
                Ok(SourceSystem::Csv)
            }
        }
        Input::Json(value) => {
            if is_empty_value(value) {
                return Err(NormalizeError::EmptyInput);
            }
            let obj = value.as_object().ok_or_else(|| NormalizeError::UnknownFormat {
                reason: format!("top-level JSON value is {}, expected an object", type_name(value)),
            })?;
            classify_object(obj).ok_or_else(|| NormalizeError::UnknownFormat {
                reason: "no recognized top-level keys".into(),
            })
        }
    }
}

/// Detect (or take the forced format) and map `input` onto canonical
/// records.
pub fn normalize(input: Input<'_>, options: &NormalizeOptions) -> Result<Normalized, NormalizeError> {
    let source = match options.format {
        Some(forced) => check_forced(input, forced)?,
        None => detect(input)?,
    };
    log::info!("normalizing input as {source}");

    let normalized = match input {
        Input::Table(table) => normalize_table(table, options.today, options.csv_order)?,
        Input::Json(value) => {
            let obj = value.as_object().ok_or_else(|| {
                NormalizeError::invalid(
                    source,
                    format!("top-level JSON value is {}, expected an object", type_name(value)),
                )
            })?;
            Normalized::from_candidates(source, map_object(source, obj)?)
        }
    };

    if !normalized.dropped.is_empty() {
        log::warn!(
            "{} {} item(s) dropped for missing product name or barcode",
            normalized.dropped.len(),
            source,
        );
    }
    Ok(normalized)
}

pub fn normalize_json(value: &Value, options: &NormalizeOptions) -> Result<Normalized, NormalizeError> {
    normalize(Input::Json(value), options)
}

/// A forced format must still agree with the kind of input it is given.
fn check_forced(input: Input<'_>, forced: SourceSystem) -> Result<SourceSystem, NormalizeError> {
    match (input, forced) {
        (Input::Table(table), SourceSystem::Csv) => {
            if table.is_empty() {
                Err(NormalizeError::EmptyInput)
            } else {
                Ok(forced)
            }
        }
        (Input::Table(_), _) => Err(NormalizeError::UnknownFormat {
            reason: format!("{forced} requires JSON input, got a CSV table"),
        }),
        (Input::Json(_), SourceSystem::Csv) => Err(NormalizeError::UnknownFormat {
            reason: "CSV requires tabular input, got JSON".into(),
        }),
        (Input::Json(value), _) => {
            if is_empty_value(value) {
                Err(NormalizeError::EmptyInput)
            } else {
                Ok(forced)
            }
        }
    }
}
