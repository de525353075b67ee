//! Translation catalogue and lookup.
//!
//! Translations live in JSON files named `<base>.<locale>.<ext>` (for example
//! `app.fr-FR.json`). Every file for a locale is merged into one tree; keys
//! are addressed with dotted paths.

use crate::error::{I18nError, Result};
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error};

/// Extracts the locale from a translation file name.
#[allow(clippy::expect_used)]
fn file_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+\.([a-zA-Z-]{2,5})\..*").expect("valid regex"))
}

/// Matches `{{ name }}` placeholders and their unescaped `{{- name }}` form.
#[allow(clippy::expect_used)]
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(-)?\s*([\w.-]+)\s*\}\}").expect("valid regex"))
}

/// Returns the locale encoded in a translation file name, if any.
#[must_use]
pub fn locale_from_file_name(file_name: &str) -> Option<&str> {
    file_name_regex()
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Translation trees keyed by locale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: HashMap<String, Map<String, JsonValue>>,
}

impl Catalog {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every translation file in `folder`.
    ///
    /// Loading never fails: an unreadable folder yields an empty catalogue
    /// and bad files are skipped, both logged at `error`.
    pub fn load(folder: impl AsRef<Path>) -> Self {
        let folder = folder.as_ref();
        let mut catalog = Self::new();

        let entries = match std::fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    folder = %folder.display(),
                    error = %e,
                    "failed to read translation folder"
                );
                return catalog;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(locale) = locale_from_file_name(file_name) else {
                continue;
            };
            let locale = locale.to_string();

            match read_translation_file(&path) {
                Ok(tree) => {
                    debug!(locale = %locale, file = %path.display(), keys = tree.len(), "loaded translations");
                    catalog.insert(&locale, tree);
                }
                Err(e) => error!(file = %path.display(), error = %e, "skipping translation file"),
            }
        }

        catalog
    }

    /// Merges `tree` into the locale's translations; later keys win.
    pub fn insert(&mut self, locale: &str, tree: Map<String, JsonValue>) {
        self.resources
            .entry(locale.to_string())
            .or_default()
            .extend(tree);
    }

    /// Returns the loaded locales, sorted.
    #[must_use]
    pub fn locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self.resources.keys().cloned().collect();
        locales.sort();
        locales
    }

    /// Returns true if no translations are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Looks up a dotted key in one locale. Only string and number leaves
    /// count as translations.
    #[must_use]
    pub fn lookup(&self, locale: &str, key: &str) -> Option<String> {
        let tree = self.resources.get(locale)?;
        let mut parts = key.split('.');
        let mut current = tree.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }

        match current {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Reads one translation file into a JSON object.
///
/// # Errors
///
/// Returns [`I18nError::ReadFailed`] if the file cannot be read and
/// [`I18nError::InvalidFile`] if it is not a JSON object.
pub fn read_translation_file(path: &Path) -> Result<Map<String, JsonValue>> {
    let content = std::fs::read_to_string(path).map_err(|e| I18nError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let parsed: JsonValue =
        serde_json::from_str(&content).map_err(|e| I18nError::InvalidFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    match parsed {
        JsonValue::Object(map) => Ok(map),
        _ => Err(I18nError::InvalidFile {
            path: path.display().to_string(),
            reason: "expected a JSON object".to_string(),
        }
        .into()),
    }
}

/// Options for a single translation.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Locale to translate into; the translator's fallback if unset.
    pub locale: Option<String>,
    /// Values substituted into `{{name}}` placeholders.
    pub vars: BTreeMap<String, String>,
}

impl TranslateOptions {
    /// Options targeting `locale`.
    #[must_use]
    pub fn locale(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            vars: BTreeMap::new(),
        }
    }

    /// Adds an interpolation variable.
    #[must_use]
    pub fn var(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.vars.insert(name.into(), value.to_string());
        self
    }
}

/// Translates keys against a [`Catalog`] with a fallback locale.
#[derive(Debug, Clone)]
pub struct Translator {
    fallback: String,
    catalog: Catalog,
}

impl Translator {
    /// Creates a translator.
    #[must_use]
    pub fn new(fallback: impl Into<String>, catalog: Catalog) -> Self {
        Self {
            fallback: fallback.into(),
            catalog,
        }
    }

    /// Returns the underlying catalogue.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Locales tried for `locale`, most specific first: `xx-YY`, `xx`, then
    /// the fallback and its language.
    #[must_use]
    pub fn chain(&self, locale: &str) -> Vec<String> {
        let mut chain: Vec<String> = Vec::with_capacity(4);
        for candidate in [locale, self.fallback.as_str()] {
            for tag in [Some(candidate), candidate.split_once('-').map(|(lang, _)| lang)]
                .into_iter()
                .flatten()
            {
                if !tag.is_empty() && !chain.iter().any(|c| c == tag) {
                    chain.push(tag.to_string());
                }
            }
        }
        chain
    }

    /// Translates `key`. Returns the key itself when no locale in the chain
    /// has it.
    #[must_use]
    pub fn translate(&self, key: &str, options: &TranslateOptions) -> String {
        let locale = options.locale.as_deref().unwrap_or(&self.fallback);

        let Some(template) = self
            .chain(locale)
            .iter()
            .find_map(|candidate| self.catalog.lookup(candidate, key))
        else {
            debug!(key, locale, "missing translation");
            return key.to_string();
        };

        interpolate(&template, &options.vars)
    }
}

/// Replaces `{{name}}` placeholders with HTML-escaped values; `{{- name}}`
/// inserts the value verbatim. Unknown names are left in place.
#[must_use]
pub fn interpolate(template: &str, vars: &BTreeMap<String, String>) -> String {
    if vars.is_empty() {
        return template.to_string();
    }

    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match vars.get(&caps[2]) {
                Some(value) if caps.get(1).is_some() => value.clone(),
                Some(value) => escape_html(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Escapes the characters HTML treats specially.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '/' => escaped.push_str("&#x2F;"),
            other => escaped.push(other),
        }
    }
    escaped
}
