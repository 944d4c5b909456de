// slipgen CLI - inventory transfer manifests to printable label slips

mod config_cmd;
mod exit_codes;
mod fetch;
mod generate;
mod input;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use slipgen_engine::{NormalizeError, SourceSystem, VendorDisplay};
use slipgen_io::IoError;
use tracing_subscriber::EnvFilter;

use exit_codes::{
    io_exit_code, normalize_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "slipgen")]
#[command(about = "Turn inventory transfer manifests into printable label slips")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (default: <config dir>/slipgen/settings.json)
    #[arg(long, global = true, env = "SLIPGEN_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a manifest (Bamboo, Cultivera, GrowFlow JSON or CSV) to canonical CSV
    #[command(after_help = "\
Examples:
  slipgen normalize transfer.json
  slipgen normalize inventory.csv -o clean.csv
  cat manifest.json | slipgen normalize - --format cultivera
  slipgen normalize export.csv --json --no-sort")]
    Normalize {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Source format (default: detect)
        #[arg(long, short = 'f', default_value = "auto")]
        format: FormatArg,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Emit JSON (records plus dropped items) instead of CSV
        #[arg(long)]
        json: bool,

        /// Keep CSV rows in file order instead of type/name order
        #[arg(long)]
        no_sort: bool,

        /// Suppress stderr notes
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Generate a label slip document from a manifest
    #[command(after_help = "\
Examples:
  slipgen generate transfer.json
  slipgen generate inventory.csv --items-per-page 8 --out-dir ./slips
  slipgen generate transfer.json --type Flower --type Vape
  slipgen generate transfer.json --search 'blue dream' --pages-json pages.json
  slipgen generate transfer.json --template label.txt --vendor-display name-only")]
    Generate {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Source format (default: detect)
        #[arg(long, short = 'f', default_value = "auto")]
        format: FormatArg,

        /// Label template with {{LabelN.Field}} placeholders
        #[arg(long, short = 't')]
        template: Option<PathBuf>,

        /// Labels per page: 2, 4, 6 or 8 (default: from settings)
        #[arg(long, short = 'n')]
        items_per_page: Option<u32>,

        /// Directory for the generated document (default: from settings)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// How vendors are printed (default: from settings)
        #[arg(long)]
        vendor_display: Option<VendorDisplayArg>,

        /// Only records whose name, type, strain or source contains this text
        #[arg(long)]
        search: Option<String>,

        /// Only records of this product type. Repeatable.
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<String>,

        /// Also write the per-page label contexts as JSON
        #[arg(long, value_name = "FILE")]
        pages_json: Option<PathBuf>,

        /// Keep CSV rows in file order instead of type/name order
        #[arg(long)]
        no_sort: bool,

        /// Suppress progress output
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Download a transfer manifest over HTTP and normalize it
    #[command(after_help = "\
Examples:
  slipgen fetch https://api.example.com/transfers/123 --token $TOKEN
  SLIPGEN_API_TOKEN=... slipgen fetch https://api.example.com/manifest -o manifest.csv
  slipgen fetch https://api.example.com/transfers/123 --format bamboo")]
    Fetch {
        /// URL returning transfer JSON
        url: String,

        /// Bearer token (or set SLIPGEN_API_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Source format (default: detect)
        #[arg(long, short = 'f', default_value = "auto")]
        format: FormatArg,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Suppress stderr notes
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Show or change persisted settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective settings as JSON
    Show,
    /// Print the settings file path
    Path,
    /// Set labels per page (2, 4, 6 or 8)
    SetItemsPerPage {
        n: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Auto,
    Bamboo,
    Cultivera,
    Growflow,
    Csv,
}

impl FormatArg {
    fn source(self) -> Option<SourceSystem> {
        match self {
            Self::Auto => None,
            Self::Bamboo => Some(SourceSystem::Bamboo),
            Self::Cultivera => Some(SourceSystem::Cultivera),
            Self::Growflow => Some(SourceSystem::GrowFlow),
            Self::Csv => Some(SourceSystem::Csv),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VendorDisplayArg {
    Full,
    NameOnly,
}

impl From<VendorDisplayArg> for VendorDisplay {
    fn from(arg: VendorDisplayArg) -> Self {
        match arg {
            VendorDisplayArg::Full => VendorDisplay::Full,
            VendorDisplayArg::NameOnly => VendorDisplay::NameOnly,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("SLIPGEN_COMMIT"), ")",
        "\nengine:  slipgen-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("SLIPGEN_TARGET"),
    )
}

/// Log filter: SLIPGEN_LOG, then RUST_LOG, then `warn`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("SLIPGEN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = cli.config;
    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: slipgen <command> [options]");
            eprintln!("       slipgen --help for more information");
            Ok(())
        }
        Some(Commands::Normalize { input, format, out, json, no_sort, quiet }) => {
            input::cmd_normalize(config, input, format.source(), out, json, no_sort, quiet)
        }
        Some(Commands::Generate {
            input,
            format,
            template,
            items_per_page,
            out_dir,
            vendor_display,
            search,
            types,
            pages_json,
            no_sort,
            quiet,
        }) => generate::cmd_generate(generate::GenerateArgs {
            config,
            input,
            format: format.source(),
            template,
            items_per_page,
            out_dir,
            vendor_display: vendor_display.map(Into::into),
            search,
            types,
            pages_json,
            no_sort,
            quiet,
        }),
        Some(Commands::Fetch { url, token, format, out, quiet }) => {
            fetch::cmd_fetch(config, url, token, format.source(), out, quiet)
        }
        Some(Commands::Config(cmd)) => match cmd {
            ConfigCommands::Show => config_cmd::cmd_show(config),
            ConfigCommands::Path => config_cmd::cmd_path(config),
            ConfigCommands::SetItemsPerPage { n } => config_cmd::cmd_set_items_per_page(config, n),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from a normalization failure with a suggestion where
    /// one helps.
    pub fn normalize(err: &NormalizeError) -> Self {
        let hint = match err {
            NormalizeError::UnknownFormat { .. } => {
                Some("pass --format to force bamboo, cultivera, growflow or csv".to_string())
            }
            NormalizeError::MissingColumns(_) => {
                Some("CSV needs a \"Product Name\" and a \"Barcode\" column".to_string())
            }
            NormalizeError::DuplicateColumns(_) => {
                Some("rename or remove the repeated CSV columns".to_string())
            }
            _ => None,
        };
        Self { code: normalize_exit_code(err), message: err.to_string(), hint }
    }

    /// Create error from an input/output failure; `what` names the file.
    pub fn from_io(err: &IoError, what: &str) -> Self {
        match err {
            IoError::Normalize(e) => Self::normalize(e),
            IoError::Io(e) => Self::io(format!("{what}: {e}")),
            other => Self { code: io_exit_code(other), message: format!("{what}: {other}"), hint: None },
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
