//! `slipgen generate`: run the slip pipeline on a worker thread and write
//! the document.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use chrono::{Local, NaiveDateTime};
use slipgen_config::{Settings, ITEMS_PER_PAGE_CHOICES};
use slipgen_engine::{
    generate, group_by_type, search, select_types, CanonicalRecord, Document, PageOptions, PageSize, Progress,
    SourceSystem, VendorDisplay, DEFAULT_TEMPLATE,
};
use slipgen_io::{read_text_file, write_pages_json};

use crate::input::{
    dropped_note, input_label, is_stdin, load_input, load_settings, normalize_loaded, remember,
    require_records,
};
use crate::CliError;

pub struct GenerateArgs {
    pub config: Option<PathBuf>,
    pub input: PathBuf,
    pub format: Option<SourceSystem>,
    pub template: Option<PathBuf>,
    pub items_per_page: Option<u32>,
    pub out_dir: Option<PathBuf>,
    pub vendor_display: Option<VendorDisplay>,
    pub search: Option<String>,
    pub types: Vec<String>,
    pub pages_json: Option<PathBuf>,
    pub no_sort: bool,
    pub quiet: bool,
}

/// Messages from the worker thread.
enum Event {
    Progress(Progress),
    Finished(Document),
}

/// `inventory_slips_<YYYYmmdd_HHMMSS>.txt`
pub fn output_file_name(now: NaiveDateTime) -> String {
    format!("inventory_slips_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Flag value if given (must be a supported size), else the setting.
fn resolve_page_size(flag: Option<u32>, settings: &Settings) -> Result<PageSize, CliError> {
    match flag {
        None => Ok(settings.page_size()),
        Some(n) if ITEMS_PER_PAGE_CHOICES.contains(&n) => {
            PageSize::new(n as usize).ok_or_else(|| CliError::args("--items-per-page must be positive"))
        }
        Some(n) => Err(CliError::args(format!("--items-per-page must be 2, 4, 6 or 8 (got {n})"))),
    }
}

fn load_template(flag: Option<&Path>, settings: &Settings) -> Result<String, CliError> {
    match flag.or(settings.template_path.as_deref()) {
        Some(path) => read_text_file(path).map_err(|e| {
            CliError::io(format!("cannot read template {}: {}", path.display(), e))
        }),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

/// Apply `--search` and `--type` filters.
fn select(records: &[CanonicalRecord], query: Option<&str>, types: &[String]) -> Vec<CanonicalRecord> {
    let matched = search(records, query.unwrap_or(""));
    select_types(&matched, types).into_iter().cloned().collect()
}

/// Run the pipeline on a background thread, forwarding progress to
/// `on_progress` as it arrives.
fn run_pipeline(
    records: Vec<CanonicalRecord>,
    options: PageOptions,
    template: String,
    mut on_progress: impl FnMut(&Progress),
) -> Result<Document, CliError> {
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let progress_tx = tx.clone();
        let doc = generate(&records, &options, &template, &mut |p| {
            // Send fails only once the receiver is gone
            let _ = progress_tx.send(Event::Progress(p));
        });
        let _ = tx.send(Event::Finished(doc));
    });

    let mut document = None;
    for event in rx {
        match event {
            Event::Progress(p) => on_progress(&p),
            Event::Finished(doc) => document = Some(doc),
        }
    }

    worker
        .join()
        .map_err(|_| CliError::general("slip generation thread panicked"))?;
    document.ok_or_else(|| CliError::general("slip generation finished without a document"))
}

pub fn cmd_generate(args: GenerateArgs) -> Result<(), CliError> {
    let mut settings = load_settings(args.config.as_deref());
    let page_size = resolve_page_size(args.items_per_page, &settings)?;
    let vendor_display = args.vendor_display.unwrap_or(settings.vendor_display);
    let template = load_template(args.template.as_deref(), &settings)?;
    let out_dir = args.out_dir.clone().unwrap_or_else(|| settings.output_dir());

    let label = input_label(&args.input);
    let loaded = load_input(&args.input)?;
    let normalized = normalize_loaded(&loaded, args.format, settings.sort && !args.no_sort)?;
    require_records(&normalized, &label)?;

    let selected = select(&normalized.records, args.search.as_deref(), &args.types);
    if selected.is_empty() {
        return Err(CliError {
            code: crate::exit_codes::EXIT_NO_RECORDS,
            message: format!(
                "no records match the filters ({} {} record(s) before filtering)",
                normalized.records.len(),
                normalized.source,
            ),
            hint: Some("check --search and --type values".to_string()),
        });
    }

    if !args.quiet {
        eprintln!(
            "{}: {} {} record(s) selected{}",
            label,
            selected.len(),
            normalized.source,
            dropped_note(&normalized),
        );
        for (kind, group) in group_by_type(&selected) {
            eprintln!("  {kind}: {}", group.len());
        }
    }

    let options = PageOptions { page_size, vendor_display };
    let quiet = args.quiet;
    let document = run_pipeline(selected, options, template, |p| {
        if !quiet {
            eprintln!("[{:>3}%] {}", p.percent, p.message);
        }
    })?;

    std::fs::create_dir_all(&out_dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {}", out_dir.display(), e)))?;
    let out_path = out_dir.join(output_file_name(Local::now().naive_local()));
    std::fs::write(&out_path, &document.text)
        .map_err(|e| CliError::io(format!("cannot write {}: {}", out_path.display(), e)))?;

    if let Some(path) = &args.pages_json {
        let f = std::fs::File::create(path)
            .map_err(|e| CliError::io(format!("cannot create {}: {}", path.display(), e)))?;
        write_pages_json(&document.pages, std::io::BufWriter::new(f))
            .map_err(|e| CliError::from_io(&e, &path.display().to_string()))?;
    }

    if !is_stdin(&args.input) {
        settings.push_recent_file(&args.input);
        remember(&settings, args.config.as_deref());
    }

    if !args.quiet {
        eprintln!(
            "Wrote {} page(s), {} label(s){}",
            document.page_count(),
            document.pages.iter().map(|p| p.filled).sum::<usize>(),
            match document.warnings.len() {
                0 => String::new(),
                n => format!(", {n} quantity warning(s)"),
            },
        );
    }
    println!("{}", out_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(name: &str, kind: &str) -> CanonicalRecord {
        CanonicalRecord {
            product_name: name.into(),
            barcode: format!("{name}-1"),
            product_type: kind.into(),
            quantity_received: "2".into(),
            ..CanonicalRecord::blank(SourceSystem::Csv)
        }
    }

    #[test]
    fn test_output_file_name() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 30)
            .unwrap();
        assert_eq!(output_file_name(now), "inventory_slips_20240309_070530.txt");
    }

    #[test]
    fn test_page_size_flag_validation() {
        let settings = Settings { items_per_page: 6, ..Settings::default() };
        assert_eq!(resolve_page_size(None, &settings).unwrap().get(), 6);
        assert_eq!(resolve_page_size(Some(8), &settings).unwrap().get(), 8);
        let err = resolve_page_size(Some(3), &settings).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }

    #[test]
    fn test_select_filters() {
        let records = vec![record("Blue Dream", "Flower"), record("Gummy", "Edible")];
        assert_eq!(select(&records, None, &[]).len(), 2);
        assert_eq!(select(&records, Some("blue"), &[]).len(), 1);
        let picked = select(&records, None, &["edible".to_string()]);
        assert_eq!(picked[0].product_name, "Gummy");
    }

    #[test]
    fn test_pipeline_on_worker_thread() {
        let records: Vec<_> = (0..5).map(|i| record(&format!("P{i}"), "Flower")).collect();
        let options = PageOptions { page_size: PageSize::new(2).unwrap(), ..PageOptions::default() };
        let mut seen = Vec::new();
        let doc = run_pipeline(records, options, DEFAULT_TEMPLATE.to_string(), |p| seen.push(p.percent))
            .unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(seen.last().copied(), Some(100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_missing_template_is_io_error() {
        let err = load_template(Some(Path::new("/nonexistent/label.txt")), &Settings::default()).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_IO);
        assert_eq!(load_template(None, &Settings::default()).unwrap(), DEFAULT_TEMPLATE);
    }
}
