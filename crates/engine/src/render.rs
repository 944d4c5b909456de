//! Plain-text label rendering.
//!
//! Templates reference slot fields as `{{LabelN.Field}}`; whitespace inside
//! the braces is allowed. A placeholder for a label the page does not have
//! renders as an empty string. An unknown field name is left verbatim so
//! typos stay visible in the output.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::paginate::{Page, Slot};

/// Separator between composed pages.
pub const PAGE_BREAK: &str = "\x0c";

/// Template used when the host has none configured.
pub const DEFAULT_TEMPLATE: &str = "\
==== {{Label1.ProductName}} ====
Barcode:   {{Label1.Barcode}}
Type:      {{Label1.ProductType}}
Strain:    {{Label1.StrainName}}
Qty:       {{Label1.QuantityReceived}}
Vendor:    {{Label1.Vendor}}
Accepted:  {{Label1.AcceptedDate}}
THC / CBD: {{Label1.THCContent}} / {{Label1.CBDContent}}
";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*Label(\d+)\s*\.\s*([A-Za-z]+)\s*\}\}").expect("placeholder pattern")
});

/// Substitute every `{{LabelN.Field}}` in `template` with values from
/// `page`.
pub fn render_page(template: &str, page: &Page) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let field = &caps[2];
            if !Slot::FIELDS.contains(&field) {
                return caps[0].to_string();
            }
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| page.label(n))
                .and_then(|slot| slot.field(field))
                .unwrap_or_default()
        })
        .into_owned()
}

/// Expand a single-label template into one block per slot, so the built-in
/// template covers any page size. Templates that already reference more
/// than `Label1` are returned unchanged.
pub fn repeat_for_page(template: &str, slots: usize) -> String {
    let highest = PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .max()
        .unwrap_or(0);
    if highest != 1 || slots <= 1 {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() * slots);
    for n in 1..=slots {
        if n > 1 {
            out.push('\n');
        }
        let block = PLACEHOLDER.replace_all(template, |caps: &Captures| {
            format!("{{{{Label{n}.{}}}}}", &caps[2])
        });
        out.push_str(&block);
    }
    out
}

/// Join rendered pages in order, separated by a page break.
pub fn compose<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PAGE_BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalRecord, SourceSystem};
    use crate::paginate::{paginate, PageOptions, PageSize};

    fn page(size: usize, names: &[&str]) -> Page {
        let records: Vec<_> = names
            .iter()
            .map(|name| CanonicalRecord {
                product_name: name.to_string(),
                barcode: format!("{name}-bc"),
                quantity_received: "7".into(),
                ..CanonicalRecord::blank(SourceSystem::Csv)
            })
            .collect();
        let options = PageOptions { page_size: PageSize::new(size).unwrap(), ..PageOptions::default() };
        paginate(&records, &options).pages.remove(0)
    }

    #[test]
    fn substitutes_fields() {
        let p = page(2, &["Gummy"]);
        let out = render_page("{{Label1.ProductName}} x{{ Label1 . QuantityReceived }}", &p);
        assert_eq!(out, "Gummy x7");
    }

    #[test]
    fn padding_and_missing_labels_render_empty() {
        let p = page(2, &["Gummy"]);
        assert_eq!(render_page("[{{Label2.Barcode}}][{{Label9.Barcode}}]", &p), "[][]");
    }

    #[test]
    fn unknown_fields_left_verbatim() {
        let p = page(1, &["Gummy"]);
        assert_eq!(render_page("{{Label1.Price}} {{name}}", &p), "{{Label1.Price}} {{name}}");
    }

    #[test]
    fn default_template_repeats_per_slot() {
        let expanded = repeat_for_page(DEFAULT_TEMPLATE, 2);
        assert!(expanded.contains("{{Label2.Barcode}}"));
        let p = page(2, &["A", "B"]);
        let out = render_page(&expanded, &p);
        assert!(out.contains("==== A ===="));
        assert!(out.contains("Barcode:   B-bc"));

        let custom = "{{Label1.Barcode}} {{Label2.Barcode}}";
        assert_eq!(repeat_for_page(custom, 4), custom);
    }

    #[test]
    fn spaced_single_label_template_repeats_per_slot() {
        let expanded = repeat_for_page("[{{ Label1 . ProductName }}]", 2);
        assert_eq!(expanded, "[{{Label1.ProductName}}]\n[{{Label2.ProductName}}]");
        let out = render_page(&expanded, &page(2, &["A", "B"]));
        assert_eq!(out, "[A]\n[B]");
    }

    #[test]
    fn compose_separates_with_form_feed() {
        assert_eq!(compose(&["a", "b", "c"]), "a\x0cb\x0cc");
        assert_eq!(compose::<&str>(&[]), "");
    }
}
