//! Reading manifests from files or stdin, and the `normalize` command.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use slipgen_config::Settings;
use slipgen_engine::{
    normalize, CanonicalRecord, DroppedRecord, Normalized, NormalizeOptions, SortOrder,
    SourceSystem,
};
use slipgen_io::{load_bytes, write_records_csv, Loaded};

use crate::exit_codes::EXIT_NO_RECORDS;
use crate::CliError;

/// Path argument meaning "read stdin".
pub const STDIN_MARKER: &str = "-";

pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_MARKER
}

/// Human label for an input path.
pub fn input_label(path: &Path) -> String {
    if is_stdin(path) {
        "stdin".to_string()
    } else {
        path.display().to_string()
    }
}

/// Read and parse an input file (or stdin for `-`).
pub fn load_input(path: &Path) -> Result<Loaded, CliError> {
    let label = input_label(path);
    let bytes = if is_stdin(path) {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| CliError::io(format!("cannot read stdin: {e}")))?;
        buf
    } else {
        std::fs::read(path).map_err(|e| CliError::io(format!("cannot read {label}: {e}")))?
    };
    let hint_path = (!is_stdin(path)).then_some(path);
    load_bytes(hint_path, &bytes).map_err(|e| CliError::from_io(&e, &label))
}

/// Normalize parsed input with today's date and the requested ordering.
pub fn normalize_loaded(
    loaded: &Loaded,
    format: Option<SourceSystem>,
    sort: bool,
) -> Result<Normalized, CliError> {
    let order = if sort { SortOrder::TypeThenName } else { SortOrder::Original };
    let options = NormalizeOptions::new(Local::now().date_naive())
        .with_format(format)
        .with_csv_order(order);
    normalize(loaded.as_input(), &options).map_err(|e| CliError::normalize(&e))
}

/// Fail when nothing survived normalization.
pub fn require_records(normalized: &Normalized, label: &str) -> Result<(), CliError> {
    if normalized.is_empty() {
        let mut err = CliError {
            code: EXIT_NO_RECORDS,
            message: format!("no records found in {label} ({} data)", normalized.source),
            hint: None,
        };
        if !normalized.dropped.is_empty() {
            err = err.with_hint(format!(
                "{} item(s) were dropped for missing product name or barcode",
                normalized.dropped.len()
            ));
        }
        return Err(err);
    }
    Ok(())
}

/// Open `out` (or stdout) for writing.
pub fn open_output(out: Option<&Path>) -> Result<Box<dyn Write>, CliError> {
    match out {
        Some(path) => {
            let f = std::fs::File::create(path)
                .map_err(|e| CliError::io(format!("cannot create {}: {}", path.display(), e)))?;
            Ok(Box::new(io::BufWriter::new(f)))
        }
        None => Ok(Box::new(io::BufWriter::new(io::stdout().lock()))),
    }
}

pub fn output_label(out: Option<&Path>) -> String {
    out.map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string())
}

/// Write records as canonical CSV to `out` or stdout.
pub fn write_csv(records: &[CanonicalRecord], out: Option<&Path>) -> Result<String, CliError> {
    let label = output_label(out);
    let writer = open_output(out)?;
    write_records_csv(records, writer).map_err(|e| CliError::from_io(&e, &label))?;
    Ok(label)
}

#[derive(Serialize)]
struct NormalizedJson<'a> {
    source: SourceSystem,
    records: &'a [CanonicalRecord],
    dropped: &'a [DroppedRecord],
}

// ============================================================================
// normalize
// ============================================================================

pub fn cmd_normalize(
    config: Option<PathBuf>,
    input: PathBuf,
    format: Option<SourceSystem>,
    out: Option<PathBuf>,
    json: bool,
    no_sort: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = load_settings(config.as_deref());
    let label = input_label(&input);
    let loaded = load_input(&input)?;
    let normalized = normalize_loaded(&loaded, format, settings.sort && !no_sort)?;

    let out_label = if json {
        let body = NormalizedJson {
            source: normalized.source,
            records: &normalized.records,
            dropped: &normalized.dropped,
        };
        let mut writer = open_output(out.as_deref())?;
        serde_json::to_writer_pretty(&mut writer, &body)
            .map_err(|e| CliError::io(format!("JSON write error: {e}")))?;
        writeln!(writer).map_err(|e| CliError::io(format!("JSON write error: {e}")))?;
        writer.flush().map_err(|e| CliError::io(format!("JSON flush error: {e}")))?;
        output_label(out.as_deref())
    } else {
        require_records(&normalized, &label)?;
        write_csv(&normalized.records, out.as_deref())?
    };

    if !quiet {
        eprintln!(
            "{}: {} {} record(s) -> {}{}",
            label,
            normalized.records.len(),
            normalized.source,
            out_label,
            dropped_note(&normalized),
        );
    }
    Ok(())
}

pub fn dropped_note(normalized: &Normalized) -> String {
    match normalized.dropped.len() {
        0 => String::new(),
        n => format!(" ({n} dropped)"),
    }
}

/// Settings from `config` or the default location.
pub fn load_settings(config: Option<&Path>) -> Settings {
    match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}

/// Path the settings are saved back to.
pub fn settings_path(config: Option<&Path>) -> PathBuf {
    config
        .map(Path::to_path_buf)
        .unwrap_or_else(Settings::config_path)
}

/// Persist history changes; failure only costs the history entry.
pub fn remember(settings: &Settings, config: Option<&Path>) {
    if let Err(e) = settings.save_to(&settings_path(config)) {
        log::warn!("could not save settings: {e}");
    }
}
