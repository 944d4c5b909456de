//! Bamboo transfer schema.
//!
//! Vendor comes from the transfer's `from_license_*` fields, potency from
//! `lab_result_data.potency[]` entries typed `total-thc` / `total-cbd`.

use serde_json::Value;

use super::{
    first_text, percent, potency_entries, text, transfer_date, transfer_items, vendor_label,
    Object,
};
use crate::error::NormalizeError;
use crate::model::{CanonicalRecord, SourceSystem};

pub(super) fn probe(obj: &Object) -> bool {
    obj.contains_key("inventory_transfer_items")
}

pub(super) fn map(obj: &Object) -> Result<Vec<CanonicalRecord>, NormalizeError> {
    let items = transfer_items(SourceSystem::Bamboo, obj)?;

    let vendor = vendor_label(
        &text(obj.get("from_license_number")),
        &text(obj.get("from_license_name")),
    );
    let accepted_date = transfer_date(obj);
    let empty = Object::new();

    let records = items
        .iter()
        .map(|item| {
            let item = item.as_object().unwrap_or(&empty);
            let (thc_content, cbd_content) = potency(item);
            CanonicalRecord {
                product_name: text(item.get("product_name")),
                barcode: first_text(item, &["inventory_id", "external_id"]),
                product_type: text(item.get("inventory_type")),
                quantity_received: text(item.get("qty")),
                accepted_date: accepted_date.clone(),
                vendor: vendor.clone(),
                strain_name: text(item.get("strain_name")),
                thc_content,
                cbd_content,
                source_system: SourceSystem::Bamboo,
            }
        })
        .collect();

    Ok(records)
}

/// Exact `total-thc` / `total-cbd` entries; the last one of each wins.
fn potency(item: &Object) -> (String, String) {
    let mut thc = String::new();
    let mut cbd = String::new();
    for entry in potency_entries(item) {
        match entry.get("type").and_then(Value::as_str) {
            Some("total-thc") => thc = percent(entry.get("value")),
            Some("total-cbd") => cbd = percent(entry.get("value")),
            _ => {}
        }
    }
    (thc, cbd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UNKNOWN_VENDOR;
    use serde_json::json;

    fn obj(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn maps_reference_transfer() {
        let payload = obj(json!({
            "inventory_transfer_items": [{
                "product_name": "Gummy",
                "inventory_type": "Edible",
                "qty": "10",
                "inventory_id": "BC1"
            }],
            "from_license_number": "L1",
            "from_license_name": "VendorX",
            "transferred_at": "2024-01-05T10:00:00"
        }));

        let records = map(&payload).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.product_name, "Gummy");
        assert_eq!(r.barcode, "BC1");
        assert_eq!(r.product_type, "Edible");
        assert_eq!(r.quantity_received, "10");
        assert_eq!(r.vendor, "L1 - VendorX");
        assert_eq!(r.accepted_date, "2024-01-05");
        assert_eq!(r.strain_name, "");
        assert_eq!(r.thc_content, "");
        assert_eq!(r.source_system, SourceSystem::Bamboo);
    }

    #[test]
    fn est_arrival_preferred_over_transferred() {
        let payload = obj(json!({
            "inventory_transfer_items": [{ "product_name": "A", "inventory_id": "1" }],
            "est_arrival_at": "2024-02-01T08:00:00Z",
            "transferred_at": "2024-01-30T10:00:00"
        }));
        assert_eq!(map(&payload).unwrap()[0].accepted_date, "2024-02-01");

        let blank_arrival = obj(json!({
            "inventory_transfer_items": [{ "product_name": "A", "inventory_id": "1" }],
            "est_arrival_at": "",
            "transferred_at": "2024-01-30T10:00:00"
        }));
        assert_eq!(map(&blank_arrival).unwrap()[0].accepted_date, "2024-01-30");
    }

    #[test]
    fn barcode_falls_back_to_external_id() {
        let payload = obj(json!({
            "inventory_transfer_items": [
                { "product_name": "A", "inventory_id": "", "external_id": "EXT-9" },
                { "product_name": "B", "inventory_id": 12345 }
            ]
        }));
        let records = map(&payload).unwrap();
        assert_eq!(records[0].barcode, "EXT-9");
        assert_eq!(records[1].barcode, "12345");
    }

    #[test]
    fn potency_uses_total_entries_only() {
        let payload = obj(json!({
            "inventory_transfer_items": [{
                "product_name": "Flower",
                "inventory_id": "F1",
                "lab_result_data": {
                    "potency": [
                        { "type": "thc", "value": 99 },
                        { "type": "total-thc", "value": 21.5 },
                        { "type": "total-cbd", "value": 0.4 }
                    ]
                }
            }]
        }));
        let r = &map(&payload).unwrap()[0];
        assert_eq!(r.thc_content, "21.5%");
        assert_eq!(r.cbd_content, "0.4%");
    }

    #[test]
    fn missing_license_parts_give_unknown_vendor() {
        let payload = obj(json!({
            "inventory_transfer_items": [{ "product_name": "A", "inventory_id": "1" }],
            "from_license_number": "L1"
        }));
        assert_eq!(map(&payload).unwrap()[0].vendor, UNKNOWN_VENDOR);
    }

    #[test]
    fn numeric_quantity_kept_as_text() {
        let payload = obj(json!({
            "inventory_transfer_items": [{ "product_name": "A", "inventory_id": "1", "qty": 12.0 }]
        }));
        assert_eq!(map(&payload).unwrap()[0].quantity_received, "12.0");
    }
}
