//! Persistence and page environment helpers.

use gloo::console;
use gloo::storage::{LocalStorage, Storage};
use gloo::utils::body;

use crate::core::config::ControllerConfig;
use crate::core::theme::{THEME_STORAGE_KEY, ThemeMode};

pub(crate) fn load_theme() -> ThemeMode {
    match LocalStorage::raw().get_item(THEME_STORAGE_KEY) {
        Ok(value) => ThemeMode::from_storage(value.as_deref()),
        Err(err) => {
            log_storage_error("get", THEME_STORAGE_KEY, &format!("{err:?}"));
            ThemeMode::default()
        }
    }
}

pub(crate) fn persist_theme(mode: ThemeMode) {
    // Stored unquoted so pages served before this controller keep reading it.
    if let Err(err) = LocalStorage::raw().set_item(THEME_STORAGE_KEY, mode.as_str()) {
        log_storage_error("set", THEME_STORAGE_KEY, &format!("{err:?}"));
    }
}

/// Read overrides from `<body data-*>`; invalid overrides fall back to defaults.
pub(crate) fn load_config() -> ControllerConfig {
    let body = body();
    ControllerConfig::from_lookup(|name| body.get_attribute(name)).unwrap_or_else(|err| {
        let detail = format!("{err:?}");
        console::error!("invalid controller configuration; using defaults", detail);
        ControllerConfig::default()
    })
}

fn log_storage_error(operation: &'static str, key: &'static str, detail: &str) {
    console::error!("storage operation failed", operation, key, detail);
}
