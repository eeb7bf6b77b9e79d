// src/core/webserver_config.rs

//! Loading of `WEB-INF/webserver.properties`.
//!
//! An example configuration for Winstone:
//!
//! ```text
//! mainclass = winstone.Launcher
//! args = args0,args1,args2
//! args0 = --warfile={{warfile}}
//! args1 = --webroot={{webroot}}
//! args2 = --directoryListings=false
//! props = jetty.home
//! jetty.home = {{webroot}}
//! ```

use crate::constants::{PROPS_KEY, WARFILE_TOKEN, WEBROOT_TOKEN, WEBSERVER_PROPERTIES};
use crate::core::{capsule::Capsule, settings};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{(warfile|webroot)\}\}").expect("placeholder pattern is valid");
}

/// Ordered key/value configuration of the embedded web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebServerConfig {
    entries: Vec<(String, String)>,
}

impl WebServerConfig {
    /// Parses Java properties text. Later duplicates replace the value but keep
    /// the position of the first occurrence.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        let mut lines = content.lines();

        while let Some(line) = lines.next() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }

            let mut logical = trimmed.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_key_value(&logical);
            config.insert(unescape(key), unescape(value));
        }
        config
    }

    /// Reads the configuration resource from the capsule. A missing or unreadable
    /// resource yields an empty configuration.
    pub fn load(capsule: &mut Capsule) -> Self {
        match capsule.read_to_string(WEBSERVER_PROPERTIES) {
            Ok(Some(content)) => {
                let config = Self::parse(&content);
                log::debug!("Loaded {} web server settings", config.len());
                config
            }
            Ok(None) => {
                log::debug!("{} not present in capsule", WEBSERVER_PROPERTIES);
                Self::default()
            }
            Err(e) => {
                log::debug!("Ignoring unreadable {}: {}", WEBSERVER_PROPERTIES, e);
                Self::default()
            }
        }
    }

    /// Loads, resolves placeholders and promotes the `props` keys, in that order.
    pub fn load_for_launch(capsule: &mut Capsule, warfile: &str, webroot: &str) -> Self {
        let mut config = Self::load(capsule);
        config.substitute_placeholders(warfile, webroot);
        config.promote_settings();
        config
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The comma-separated names stored under `key`, trimmed, empty names dropped.
    pub fn list(&self, key: &str) -> Option<Vec<&str>> {
        self.get(key).map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect()
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Replaces `{{warfile}}` and `{{webroot}}` in every value, in a single pass.
    pub fn substitute_placeholders(&mut self, warfile: &str, webroot: &str) {
        for (_, value) in &mut self.entries {
            let resolved = PLACEHOLDER
                .replace_all(value, |caps: &Captures<'_>| {
                    match caps.get(0).map(|m| m.as_str()) {
                        Some(WARFILE_TOKEN) => warfile.to_string(),
                        Some(WEBROOT_TOKEN) => webroot.to_string(),
                        Some(other) => other.to_string(),
                        None => String::new(),
                    }
                })
                .into_owned();
            *value = resolved;
        }
    }

    /// Installs every key listed under `props` into the process-wide settings
    /// store and returns the installed keys.
    pub fn promote_settings(&self) -> Vec<String> {
        let Some(keys) = self.list(PROPS_KEY) else {
            return Vec::new();
        };
        let mut installed = Vec::new();
        for key in keys {
            match self.get(key) {
                Some(value) => {
                    settings::install(key, value);
                    installed.push(key.to_string());
                }
                None => log::warn!("{} {}", t!("settings.warn.missing_value"), key),
            }
        }
        installed
    }

    fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

/// Splits a logical line at the first unescaped `=`, `:` or whitespace.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if c == '=' || c == ':' || c.is_whitespace() {
            let (key, rest) = line.split_at(index);
            let rest = rest.trim_start();
            let rest = rest
                .strip_prefix('=')
                .or_else(|| rest.strip_prefix(':'))
                .unwrap_or(rest);
            return (key, rest.trim_start());
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
