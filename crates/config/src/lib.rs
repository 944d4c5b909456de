// Configuration loading

pub mod settings;

pub use settings::{Settings, SettingsError, ITEMS_PER_PAGE_CHOICES};
