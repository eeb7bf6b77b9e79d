// build.rs

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Compiles the message catalogue in `locales/` into a `t!` macro so every
/// user-facing launcher message is a `&'static str` literal.
fn main() {
    println!("cargo:rerun-if-env-changed=WARBOOT_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    let lang = select_language();
    println!("cargo:rustc-env=WARBOOT_LANG_EFFECTIVE={}", lang);

    // English is always loaded first so a partial translation never misses a key.
    let mut messages = load_catalogue("en").expect("Failed to load locales/en.toml");
    if lang != "en" {
        match load_catalogue(&lang) {
            Some(specific) => messages.extend(specific),
            None => println!(
                "cargo:warning=Language file 'locales/{}.toml' not found. Falling back to 'en'.",
                lang
            ),
        }
    }

    let mut keys: Vec<&String> = messages.keys().collect();
    keys.sort();

    let mut macro_code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for key in keys {
        let escaped = messages[key].replace('\\', "\\\\").replace('"', "\\\"");
        macro_code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, escaped));
    }
    macro_code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    macro_code.push('}');

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("translations.rs"), macro_code)
        .expect("Failed to write translations.rs");
}

/// `lang_*` features win over `WARBOOT_LANG`; English is the default.
fn select_language() -> String {
    let mut from_features: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(str::to_lowercase)
        })
        .collect();
    from_features.sort();

    match from_features.first() {
        Some(lang) => {
            if from_features.len() > 1 {
                println!(
                    "cargo:warning=Multiple language features enabled ({:?}). Using '{}'.",
                    from_features, lang
                );
            }
            lang.clone()
        }
        None => env::var("WARBOOT_LANG").unwrap_or_else(|_| "en".to_string()),
    }
}

fn load_catalogue(lang: &str) -> Option<HashMap<String, String>> {
    let content = fs::read_to_string(format!("locales/{}.toml", lang)).ok()?;
    let parsed = toml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse locales/{}.toml: {}", lang, e));
    Some(parsed)
}
