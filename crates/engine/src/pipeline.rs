//! Paginate, render and compose in one pass with progress reporting.

use serde::Serialize;

use crate::model::CanonicalRecord;
use crate::paginate::{build_page, page_count, CoercionWarning, Page, PageOptions};
use crate::render::{compose, render_page, repeat_for_page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Paginating,
    Rendering,
    Composing,
    Done,
}

/// Advisory progress. `percent` never decreases over one run and the last
/// report is always 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub stage: Stage,
    pub percent: u8,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub pages: Vec<Page>,
    pub warnings: Vec<CoercionWarning>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Build the slip document for `records`.
///
/// Page contexts take 0-50%, rendering 50-90%, final composition 90-100%.
pub fn generate<F>(
    records: &[CanonicalRecord],
    options: &PageOptions,
    template: &str,
    progress: &mut F,
) -> Document
where
    F: FnMut(Progress),
{
    let size = options.page_size.get();
    let total = page_count(records.len(), options.page_size);

    report(progress, Stage::Paginating, 0, format!("Preparing {total} page(s)"));
    let mut pages = Vec::with_capacity(total);
    let mut warnings = Vec::new();
    for (idx, chunk) in records.chunks(size).enumerate() {
        pages.push(build_page(idx + 1, chunk, options, &mut warnings));
        let pct = scaled(idx + 1, total, 0, 50);
        report(progress, Stage::Paginating, pct, format!("Processed page {} of {total}", idx + 1));
    }

    let template = repeat_for_page(template, size);
    let mut rendered = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        rendered.push(render_page(&template, page));
        let pct = scaled(idx + 1, total, 50, 90);
        report(progress, Stage::Rendering, pct, format!("Rendered page {} of {total}", idx + 1));
    }

    report(progress, Stage::Composing, 90, "Composing document".to_string());
    let text = compose(&rendered);
    report(progress, Stage::Done, 100, format!("Done: {total} page(s)"));

    Document { text, pages, warnings }
}

fn report<F: FnMut(Progress)>(progress: &mut F, stage: Stage, percent: u8, message: String) {
    progress(Progress { stage, percent, message });
}

/// Map step `done` of `total` onto the `[from, to]` percent band.
fn scaled(done: usize, total: usize, from: u8, to: u8) -> u8 {
    if total == 0 {
        return to;
    }
    let span = usize::from(to - from);
    from + (span * done.min(total) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceSystem;
    use crate::paginate::PageSize;
    use crate::render::PAGE_BREAK;

    fn records(n: usize) -> Vec<CanonicalRecord> {
        (0..n)
            .map(|i| CanonicalRecord {
                product_name: format!("Item {i}"),
                barcode: format!("BC{i}"),
                quantity_received: "1".into(),
                ..CanonicalRecord::blank(SourceSystem::Csv)
            })
            .collect()
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let mut seen = Vec::new();
        let options = PageOptions { page_size: PageSize::new(2).unwrap(), ..PageOptions::default() };
        let doc = generate(&records(5), &options, "{{Label1.Barcode}}", &mut |p| seen.push(p));

        assert_eq!(doc.page_count(), 3);
        assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(seen.first().unwrap().percent, 0);
        assert_eq!(seen.last().unwrap().percent, 100);
        assert_eq!(seen.last().unwrap().stage, Stage::Done);
        assert!(seen.iter().any(|p| p.stage == Stage::Paginating && p.percent == 50));
    }

    #[test]
    fn composes_pages_with_breaks() {
        let options = PageOptions { page_size: PageSize::new(2).unwrap(), ..PageOptions::default() };
        let doc = generate(&records(3), &options, "{{Label1.Barcode}};", &mut |_| {});
        // Single-label template is repeated for each slot on the page
        assert_eq!(doc.text, format!("BC0;\nBC1;{PAGE_BREAK}BC2;\n;"));
    }

    #[test]
    fn empty_input_still_completes() {
        let mut last = None;
        let doc = generate(&[], &PageOptions::default(), "x", &mut |p| last = Some(p.percent));
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.text, "");
        assert_eq!(last, Some(100));
    }
}
