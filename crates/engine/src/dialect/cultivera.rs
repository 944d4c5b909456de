//! Cultivera manifest schema: everything lives under `data.manifest`.

use serde_json::Value;

use super::{date_only, first_text, percent, text, type_name, vendor_label, Object};
use crate::error::NormalizeError;
use crate::model::{CanonicalRecord, SourceSystem};

pub(super) fn probe(obj: &Object) -> bool {
    matches!(obj.get("data"), Some(Value::Object(_)))
}

pub(super) fn map(obj: &Object) -> Result<Vec<CanonicalRecord>, NormalizeError> {
    let data = match obj.get("data") {
        Some(Value::Object(data)) => data,
        Some(other) => {
            return Err(NormalizeError::invalid(
                SourceSystem::Cultivera,
                format!("data is {}, expected an object", type_name(other)),
            ))
        }
        None => {
            return Err(NormalizeError::invalid(SourceSystem::Cultivera, "missing data"));
        }
    };
    let manifest = data.get("manifest").and_then(Value::as_object).ok_or_else(|| {
        NormalizeError::invalid(SourceSystem::Cultivera, "missing data.manifest")
    })?;

    let empty = Object::new();
    let from_license = manifest.get("from_license").and_then(Value::as_object).unwrap_or(&empty);
    let vendor = vendor_label(
        &text(from_license.get("license_number")),
        &text(from_license.get("name")),
    );
    let accepted_date = date_only(&text(manifest.get("created_at")));

    let items: &[Value] = match manifest.get("items") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            return Err(NormalizeError::invalid(
                SourceSystem::Cultivera,
                format!("data.manifest.items is {}, expected a list", type_name(other)),
            ))
        }
    };

    let records = items
        .iter()
        .map(|item| {
            let item = item.as_object().unwrap_or(&empty);
            let product = item.get("product").and_then(Value::as_object).unwrap_or(&empty);
            let (thc_content, cbd_content) = test_results(item);
            CanonicalRecord {
                product_name: text(product.get("name")),
                barcode: first_text(item, &["barcode", "id"]),
                product_type: text(product.get("category")),
                quantity_received: text(item.get("quantity")),
                accepted_date: accepted_date.clone(),
                vendor: vendor.clone(),
                strain_name: text(product.get("strain_name")),
                thc_content,
                cbd_content,
                source_system: SourceSystem::Cultivera,
            }
        })
        .collect();

    Ok(records)
}

/// Scan `test_results[]` by case-insensitive substring of `type`. A type
/// containing "thc" is never also counted as CBD. Later entries override
/// earlier ones.
fn test_results(item: &Object) -> (String, String) {
    let mut thc = String::new();
    let mut cbd = String::new();
    let results = item.get("test_results").and_then(Value::as_array);
    for result in results.map(Vec::as_slice).unwrap_or(&[]) {
        let kind = result
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        if kind.contains("thc") {
            thc = percent(result.get("percentage"));
        } else if kind.contains("cbd") {
            cbd = percent(result.get("percentage"));
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

    fn manifest_payload(items: Value) -> Object {
        obj(json!({
            "data": {
                "manifest": {
                    "from_license": { "license_number": "C-100", "name": "North Farms" },
                    "created_at": "2024-03-09T15:30:00Z",
                    "items": items
                }
            }
        }))
    }

    #[test]
    fn maps_manifest_items() {
        let payload = manifest_payload(json!([{
            "id": "item-1",
            "barcode": "CV-001",
            "quantity": 24,
            "product": { "name": "Blue Dream 3.5g", "category": "Flower", "strain_name": "Blue Dream" },
            "test_results": [
                { "type": "Total THC", "percentage": 19.2 },
                { "type": "Total CBD", "percentage": 0.1 }
            ]
        }]));

        let records = map(&payload).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.product_name, "Blue Dream 3.5g");
        assert_eq!(r.barcode, "CV-001");
        assert_eq!(r.product_type, "Flower");
        assert_eq!(r.quantity_received, "24");
        assert_eq!(r.vendor, "C-100 - North Farms");
        assert_eq!(r.accepted_date, "2024-03-09");
        assert_eq!(r.strain_name, "Blue Dream");
        assert_eq!(r.thc_content, "19.2%");
        assert_eq!(r.cbd_content, "0.1%");
        assert_eq!(r.source_system, SourceSystem::Cultivera);
    }

    #[test]
    fn missing_manifest_is_invalid_format() {
        let err = map(&obj(json!({ "data": { "other": 1 } }))).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::InvalidFormat {
                format: SourceSystem::Cultivera,
                message: "missing data.manifest".into(),
            }
        );
    }

    #[test]
    fn barcode_falls_back_to_id() {
        let payload = manifest_payload(json!([{ "id": "item-7", "product": { "name": "X" } }]));
        assert_eq!(map(&payload).unwrap()[0].barcode, "item-7");
    }

    #[test]
    fn partial_license_gives_unknown_vendor() {
        let payload = obj(json!({
            "data": { "manifest": { "from_license": { "name": "North Farms" }, "items": [] } }
        }));
        assert!(map(&payload).unwrap().is_empty());

        let payload = obj(json!({
            "data": { "manifest": {
                "from_license": { "name": "North Farms" },
                "items": [{ "id": "1", "product": { "name": "X" } }]
            } }
        }));
        assert_eq!(map(&payload).unwrap()[0].vendor, UNKNOWN_VENDOR);
    }

    #[test]
    fn thc_match_takes_precedence_over_cbd() {
        let payload = manifest_payload(json!([{
            "id": "1",
            "product": { "name": "X" },
            "test_results": [{ "type": "thc-cbd ratio", "percentage": 2 }]
        }]));
        let r = &map(&payload).unwrap()[0];
        assert_eq!(r.thc_content, "2%");
        assert_eq!(r.cbd_content, "");
    }
}
