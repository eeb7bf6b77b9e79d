// src/core/settings.rs

//! Process-wide settings store.
//!
//! The embedded web server reads part of its configuration from the host's
//! process-wide properties instead of its argument vector, so the keys listed in
//! `props` are installed here before launch. Runtime adapters forward the whole
//! store to the component they start. This is the only global mutable state in
//! the launcher: one writer (the configuration loader), always before launch.

use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

lazy_static! {
    static ref SETTINGS: RwLock<BTreeMap<String, String>> = RwLock::new(BTreeMap::new());
}

/// Installs (or replaces) a setting.
pub fn install(key: &str, value: &str) {
    log::debug!("Setting process-wide property {}={}", key, value);
    SETTINGS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key.to_string(), value.to_string());
}

pub fn get(key: &str) -> Option<String> {
    SETTINGS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
}

/// A copy of every installed setting, ordered by key.
pub fn snapshot() -> BTreeMap<String, String> {
    SETTINGS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
