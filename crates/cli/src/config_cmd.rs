//! `slipgen config`: inspect and edit persisted settings.

use std::path::PathBuf;

use crate::input::{load_settings, settings_path};
use crate::CliError;

pub fn cmd_show(config: Option<PathBuf>) -> Result<(), CliError> {
    let settings = load_settings(config.as_deref());
    let json = serde_json::to_string_pretty(&settings)
        .map_err(|e| CliError::general(format!("cannot serialize settings: {e}")))?;
    println!("{json}");
    Ok(())
}

pub fn cmd_path(config: Option<PathBuf>) -> Result<(), CliError> {
    println!("{}", settings_path(config.as_deref()).display());
    Ok(())
}

pub fn cmd_set_items_per_page(config: Option<PathBuf>, n: u32) -> Result<(), CliError> {
    let mut settings = load_settings(config.as_deref());
    settings
        .set_items_per_page(n)
        .map_err(|e| CliError::args(e.to_string()))?;

    let path = settings_path(config.as_deref());
    settings
        .save_to(&path)
        .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    eprintln!("slips.itemsPerPage = {n} ({})", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipgen_config::Settings;

    #[test]
    fn test_set_items_per_page_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        cmd_set_items_per_page(Some(path.clone()), 8).unwrap();
        assert_eq!(Settings::load_from(&path).items_per_page, 8);
    }

    #[test]
    fn test_set_items_per_page_rejects_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let err = cmd_set_items_per_page(Some(path.clone()), 5).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert_eq!(Settings::load_from(&path).items_per_page, 4);
    }
}
