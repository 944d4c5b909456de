use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slipgen_engine::{PageSize, VendorDisplay};
use thiserror::Error;

/// Page sizes the label templates are laid out for.
pub const ITEMS_PER_PAGE_CHOICES: [u32; 4] = [2, 4, 6, 8];

const DEFAULT_SETTINGS: &str = r#"{
    // Labels per page: 2, 4, 6 or 8
    "slips.itemsPerPage": 4,

    // Vendor on labels: "full" ("<license> - <name>") or "nameOnly"
    "slips.vendorDisplay": "full",

    // Sort CSV imports by product type, then name
    "slips.sort": true,

    // Where generated slips go (null = Downloads folder)
    "paths.outputDir": null,

    // Label template (null = built-in)
    "paths.templatePath": null,

    // History, most recent first
    "paths.recentUrls": [],
    "paths.recentFiles": [],
    "file.recentLimit": 10
}
"#;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot serialize settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("slips.itemsPerPage must be one of 2, 4, 6, 8 (got {0})")]
    ItemsPerPage(u32),

    #[error("file.recentLimit must be at least 1")]
    RecentLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Slips
    #[serde(rename = "slips.itemsPerPage")]
    pub items_per_page: u32,

    #[serde(rename = "slips.vendorDisplay")]
    pub vendor_display: VendorDisplay,

    #[serde(rename = "slips.sort")]
    pub sort: bool,

    // Paths
    #[serde(rename = "paths.outputDir")]
    pub output_dir: Option<PathBuf>,

    #[serde(rename = "paths.templatePath")]
    pub template_path: Option<PathBuf>,

    #[serde(rename = "paths.recentUrls")]
    pub recent_urls: Vec<String>,

    #[serde(rename = "paths.recentFiles")]
    pub recent_files: Vec<PathBuf>,

    // File
    #[serde(rename = "file.recentLimit")]
    pub recent_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            items_per_page: 4,
            vendor_display: VendorDisplay::Full,
            sort: true,
            output_dir: None,
            template_path: None,
            recent_urls: Vec::new(),
            recent_files: Vec::new(),
            recent_limit: 10,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slipgen");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file is created with the
    /// commented defaults; an unreadable or malformed one is logged and
    /// replaced by defaults in memory.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            create_default_file(path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("error parsing {}: {e}; using default settings", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}: {e}; using default settings", path.display());
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring `//` comment lines
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::debug!("settings saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !ITEMS_PER_PAGE_CHOICES.contains(&self.items_per_page) {
            return Err(SettingsError::ItemsPerPage(self.items_per_page));
        }
        if self.recent_limit == 0 {
            return Err(SettingsError::RecentLimit);
        }
        Ok(())
    }

    /// Configured page size, or the default when the stored value is not
    /// one of the supported choices.
    pub fn page_size(&self) -> PageSize {
        if !ITEMS_PER_PAGE_CHOICES.contains(&self.items_per_page) {
            log::warn!(
                "slips.itemsPerPage = {} is not supported; using {}",
                self.items_per_page,
                PageSize::default()
            );
            return PageSize::default();
        }
        PageSize::new(self.items_per_page as usize).unwrap_or_default()
    }

    pub fn set_items_per_page(&mut self, n: u32) -> Result<(), SettingsError> {
        if !ITEMS_PER_PAGE_CHOICES.contains(&n) {
            return Err(SettingsError::ItemsPerPage(n));
        }
        self.items_per_page = n;
        Ok(())
    }

    /// Output directory: configured, else Downloads, else home, else cwd
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn push_recent_url(&mut self, url: &str) {
        push_recent(&mut self.recent_urls, url.to_string(), self.recent_limit);
    }

    pub fn push_recent_file(&mut self, path: &Path) {
        push_recent(&mut self.recent_files, path.to_path_buf(), self.recent_limit);
    }
}

/// Most recent first, no duplicates, at most `limit` entries.
fn push_recent<T: PartialEq>(list: &mut Vec<T>, item: T, limit: usize) {
    list.retain(|existing| *existing != item);
    list.insert(0, item);
    list.truncate(limit.max(1));
}

fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!("error creating config directory: {e}");
            return;
        }
    }
    if let Err(e) = fs::write(path, DEFAULT_SETTINGS) {
        log::warn!("error writing default {}: {e}", path.display());
    }
}
