//! Vendor JSON dialects and the shape classifier.
//!
//! Detection is a fixed, ordered table of `(probe, mapper)` rules. The
//! first rule whose probe matches the top-level object wins; nothing is
//! tried after it. Order matters because Bamboo and GrowFlow share the
//! `inventory_transfer_items` list and differ only by the
//! `document_schema_version` marker.
//!
//! | Order | Dialect   | Probe                                                        |
//! |-------|-----------|--------------------------------------------------------------|
//! | 1     | GrowFlow  | `inventory_transfer_items` and `document_schema_version`     |
//! | 2     | Bamboo    | `inventory_transfer_items`                                   |
//! | 3     | Cultivera | `data` is an object (mapper requires `data.manifest`)        |

mod bamboo;
mod cultivera;
mod growflow;

use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::model::{CanonicalRecord, SourceSystem, UNKNOWN_VENDOR};

pub(crate) type Object = Map<String, Value>;
type Probe = fn(&Object) -> bool;
type Mapper = fn(&Object) -> Result<Vec<CanonicalRecord>, NormalizeError>;

struct Rule {
    source: SourceSystem,
    probe: Probe,
    map: Mapper,
}

const RULES: &[Rule] = &[
    Rule { source: SourceSystem::GrowFlow, probe: growflow::probe, map: growflow::map },
    Rule { source: SourceSystem::Bamboo, probe: bamboo::probe, map: bamboo::map },
    Rule { source: SourceSystem::Cultivera, probe: cultivera::probe, map: cultivera::map },
];

/// Classify a top-level JSON object. `None` means no rule matched.
pub(crate) fn classify_object(obj: &Object) -> Option<SourceSystem> {
    RULES.iter().find(|rule| (rule.probe)(obj)).map(|rule| rule.source)
}

/// Run the mapper registered for `source`.
pub(crate) fn map_object(
    source: SourceSystem,
    obj: &Object,
) -> Result<Vec<CanonicalRecord>, NormalizeError> {
    let rule = RULES.iter().find(|rule| rule.source == source).ok_or_else(|| {
        NormalizeError::UnknownFormat {
            reason: format!("{source} is not a JSON dialect"),
        }
    })?;
    (rule.map)(obj)
}

/// True when a JSON value carries no data at all.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Short human name of a JSON value's type, for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Field helpers shared by the mappers ─────────────────────────────

/// Scalar JSON value as display text. Missing and null become "".
pub(crate) fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// First non-empty text among `keys`, in order.
pub(crate) fn first_text(obj: &Object, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text(obj.get(*key)))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Date portion of a timestamp: everything before the first `T`.
pub(crate) fn date_only(raw: &str) -> String {
    match raw.find('T') {
        Some(pos) => raw[..pos].to_string(),
        None => raw.to_string(),
    }
}

/// `"<value>%"`, or "" when the value is missing or null.
pub(crate) fn percent(value: Option<&Value>) -> String {
    let value = text(value);
    if value.is_empty() {
        String::new()
    } else {
        format!("{value}%")
    }
}

/// `"<license> - <name>"`, or [`UNKNOWN_VENDOR`] when either part is empty.
pub(crate) fn vendor_label(license: &str, name: &str) -> String {
    if license.is_empty() || name.is_empty() {
        UNKNOWN_VENDOR.to_string()
    } else {
        format!("{license} - {name}")
    }
}

/// Transfer date shared by Bamboo and GrowFlow: estimated arrival, else
/// transfer time.
pub(crate) fn transfer_date(obj: &Object) -> String {
    date_only(&first_text(obj, &["est_arrival_at", "transferred_at"]))
}

/// The `inventory_transfer_items` list. Absent means no items; any other
/// non-list value is a structural error.
pub(crate) fn transfer_items(
    source: SourceSystem,
    obj: &Object,
) -> Result<&[Value], NormalizeError> {
    match obj.get("inventory_transfer_items") {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(NormalizeError::invalid(
            source,
            format!("inventory_transfer_items is {}, expected a list", type_name(other)),
        )),
    }
}

/// `item.lab_result_data.potency[]`, or an empty slice.
pub(crate) fn potency_entries(item: &Object) -> &[Value] {
    item.get("lab_result_data")
        .and_then(|lab| lab.get("potency"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn classify_order_growflow_before_bamboo() {
        let growflow = obj(json!({
            "inventory_transfer_items": [],
            "document_schema_version": 2
        }));
        assert_eq!(classify_object(&growflow), Some(SourceSystem::GrowFlow));

        let bamboo = obj(json!({ "inventory_transfer_items": [] }));
        assert_eq!(classify_object(&bamboo), Some(SourceSystem::Bamboo));
    }

    #[test]
    fn classify_items_wins_over_data() {
        // Payload satisfying both the Bamboo and Cultivera probes
        let both = obj(json!({
            "inventory_transfer_items": [],
            "data": { "manifest": {} }
        }));
        assert_eq!(classify_object(&both), Some(SourceSystem::Bamboo));
    }

    #[test]
    fn classify_cultivera_and_unknown() {
        let cultivera = obj(json!({ "data": { "manifest": {} } }));
        assert_eq!(classify_object(&cultivera), Some(SourceSystem::Cultivera));

        let data_list = obj(json!({ "data": [] }));
        assert_eq!(classify_object(&data_list), None);

        let other = obj(json!({ "items": [] }));
        assert_eq!(classify_object(&other), None);
    }

    #[test]
    fn map_object_rejects_csv() {
        let err = map_object(SourceSystem::Csv, &Object::new()).unwrap_err();
        assert!(matches!(err, NormalizeError::UnknownFormat { .. }));
    }

    #[test]
    fn text_formats_scalars() {
        assert_eq!(text(Some(&json!("abc"))), "abc");
        assert_eq!(text(Some(&json!(10))), "10");
        assert_eq!(text(Some(&json!(21.5))), "21.5");
        assert_eq!(text(Some(&json!(true))), "true");
        assert_eq!(text(Some(&Value::Null)), "");
        assert_eq!(text(None), "");
        assert_eq!(text(Some(&json!({"a": 1}))), "");
    }

    #[test]
    fn first_text_skips_empty() {
        let o = obj(json!({ "a": "", "b": "x", "c": "y" }));
        assert_eq!(first_text(&o, &["a", "b", "c"]), "x");
        assert_eq!(first_text(&o, &["missing"]), "");
    }

    #[test]
    fn date_only_truncates_at_t() {
        assert_eq!(date_only("2024-01-05T10:00:00"), "2024-01-05");
        assert_eq!(date_only("2024-01-05"), "2024-01-05");
        assert_eq!(date_only(""), "");
    }

    #[test]
    fn percent_and_vendor() {
        assert_eq!(percent(Some(&json!(21.5))), "21.5%");
        assert_eq!(percent(Some(&json!("0.3"))), "0.3%");
        assert_eq!(percent(None), "");
        assert_eq!(vendor_label("L1", "VendorX"), "L1 - VendorX");
        assert_eq!(vendor_label("", "VendorX"), UNKNOWN_VENDOR);
        assert_eq!(vendor_label("L1", ""), UNKNOWN_VENDOR);
    }

    #[test]
    fn empty_values() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!({})));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!("  ")));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!({"k": 1})));
    }

    #[test]
    fn transfer_items_rejects_non_list() {
        let o = obj(json!({ "inventory_transfer_items": "nope" }));
        let err = transfer_items(SourceSystem::Bamboo, &o).unwrap_err();
        assert!(err.to_string().contains("expected a list"), "{err}");

        let absent = obj(json!({}));
        assert!(transfer_items(SourceSystem::Bamboo, &absent).unwrap().is_empty());
    }
}
