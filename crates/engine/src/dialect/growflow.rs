//! GrowFlow transfer schema.
//!
//! Shares the `inventory_transfer_items` list with Bamboo but carries a
//! `document_schema_version` marker, prefers `product_sku` as the barcode
//! and accepts both `total-*` and bare `thc`/`cbd` potency types.

use serde_json::Value;

use super::{
    first_text, percent, potency_entries, text, transfer_date, transfer_items, Object,
};
use crate::error::NormalizeError;
use crate::model::{CanonicalRecord, SourceSystem, UNKNOWN_VENDOR};

const THC_TYPES: &[&str] = &["total-thc", "thc"];
const CBD_TYPES: &[&str] = &["total-cbd", "cbd"];
const REQUIRED_KEYS: &[&str] = &[
    "inventory_transfer_items",
    "from_license_number",
    "from_license_name",
];

pub(super) fn probe(obj: &Object) -> bool {
    obj.contains_key("inventory_transfer_items") && obj.contains_key("document_schema_version")
}

/// A GrowFlow document without all of its required top-level keys does not
/// match: it yields no records rather than an error.
pub(super) fn map(obj: &Object) -> Result<Vec<CanonicalRecord>, NormalizeError> {
    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !obj.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        log::warn!("GrowFlow document missing {}; no records produced", missing.join(", "));
        return Ok(Vec::new());
    }

    let items = transfer_items(SourceSystem::GrowFlow, obj)?;
    let vendor = vendor(obj);
    let accepted_date = transfer_date(obj);
    let empty = Object::new();

    let records = items
        .iter()
        .map(|item| {
            let item = item.as_object().unwrap_or(&empty);
            CanonicalRecord {
                product_name: text(item.get("product_name")),
                barcode: first_text(item, &["product_sku", "inventory_id"]),
                product_type: text(item.get("inventory_type")),
                quantity_received: text(item.get("qty")),
                accepted_date: accepted_date.clone(),
                vendor: vendor.clone(),
                strain_name: text(item.get("strain_name")),
                thc_content: potency_value(item, THC_TYPES),
                cbd_content: potency_value(item, CBD_TYPES),
                source_system: SourceSystem::GrowFlow,
            }
        })
        .collect();

    Ok(records)
}

fn vendor(obj: &Object) -> String {
    let license = text(obj.get("from_license_number"));
    if license.is_empty() {
        return UNKNOWN_VENDOR.to_string();
    }
    let name = text(obj.get("from_license_name"));
    let name = if name.is_empty() { UNKNOWN_VENDOR.to_string() } else { name };
    format!("{license} - {name}")
}

/// First potency entry whose type is in `types`; 0 when none has a value.
fn potency_value(item: &Object, types: &[&str]) -> String {
    let value = potency_entries(item)
        .iter()
        .find(|entry| {
            entry
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| types.contains(&t))
        })
        .and_then(|entry| entry.get("value"))
        .filter(|value| !value.is_null());

    match value {
        Some(value) => {
            let formatted = percent(Some(value));
            if formatted.is_empty() { "0%".to_string() } else { formatted }
        }
        None => "0%".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    fn transfer(items: Value) -> Object {
        obj(json!({
            "document_schema_version": "1.2",
            "from_license_number": "G-42",
            "from_license_name": "Green Acres",
            "transferred_at": "2024-06-01T12:00:00",
            "inventory_transfer_items": items
        }))
    }

    #[test]
    fn maps_transfer_items() {
        let payload = transfer(json!([{
            "product_name": "Sour Diesel 1g",
            "inventory_type": "Flower",
            "qty": 5,
            "product_sku": "SKU-1",
            "inventory_id": "INV-1",
            "strain_name": "Sour Diesel",
            "lab_result_data": { "potency": [
                { "type": "thc", "value": 18 },
                { "type": "total-cbd", "value": 0.2 }
            ] }
        }]));

        let r = &map(&payload).unwrap()[0];
        assert_eq!(r.product_name, "Sour Diesel 1g");
        assert_eq!(r.barcode, "SKU-1");
        assert_eq!(r.product_type, "Flower");
        assert_eq!(r.quantity_received, "5");
        assert_eq!(r.vendor, "G-42 - Green Acres");
        assert_eq!(r.accepted_date, "2024-06-01");
        assert_eq!(r.thc_content, "18%");
        assert_eq!(r.cbd_content, "0.2%");
        assert_eq!(r.source_system, SourceSystem::GrowFlow);
    }

    #[test]
    fn potency_defaults_to_zero() {
        let payload = transfer(json!([{ "product_name": "A", "inventory_id": "INV-2" }]));
        let r = &map(&payload).unwrap()[0];
        assert_eq!(r.barcode, "INV-2");
        assert_eq!(r.thc_content, "0%");
        assert_eq!(r.cbd_content, "0%");
    }

    #[test]
    fn first_matching_potency_wins() {
        let payload = transfer(json!([{
            "product_name": "A",
            "inventory_id": "1",
            "lab_result_data": { "potency": [
                { "type": "total-thc", "value": 20 },
                { "type": "thc", "value": 25 }
            ] }
        }]));
        assert_eq!(map(&payload).unwrap()[0].thc_content, "20%");
    }

    #[test]
    fn missing_required_keys_yield_no_records() {
        let payload = obj(json!({
            "document_schema_version": "1.2",
            "from_license_number": "G-42",
            "inventory_transfer_items": [{ "product_name": "A", "inventory_id": "1" }]
        }));
        assert!(map(&payload).unwrap().is_empty());
    }

    #[test]
    fn empty_name_falls_back_in_name_part_only() {
        let payload = obj(json!({
            "document_schema_version": "1.2",
            "from_license_number": "G-42",
            "from_license_name": null,
            "inventory_transfer_items": [{ "product_name": "A", "inventory_id": "1" }]
        }));
        assert_eq!(map(&payload).unwrap()[0].vendor, "G-42 - Unknown Vendor");
    }
}
