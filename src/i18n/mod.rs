//! Internationalization: translation catalogue and request locale resolution.
//!
//! [`I18n`] loads the catalogue once and answers both "which locale does this
//! request want" and "what does this key say in that locale".

pub mod catalog;
pub mod locale;

pub use catalog::{Catalog, TranslateOptions, Translator, interpolate, locale_from_file_name};
pub use locale::{AcceptedLanguage, LocaleRequest, LocaleResolver, parse_accept_language, pick};

use crate::config::I18nConfig;
use tracing::info;

/// Loaded translations plus the resolver over their locales.
#[derive(Debug, Clone)]
pub struct I18n {
    translator: Translator,
    resolver: LocaleResolver,
}

impl I18n {
    /// Loads the catalogue from the configured folder.
    #[must_use]
    pub fn new(config: &I18nConfig) -> Self {
        let catalog = Catalog::load(&config.folder);
        info!(
            folder = %config.folder.display(),
            locales = ?catalog.locales(),
            fallback = %config.fallback,
            "translations loaded"
        );
        Self::from_catalog(&config.fallback, catalog)
    }

    /// Wraps an already built catalogue.
    #[must_use]
    pub fn from_catalog(fallback: &str, catalog: Catalog) -> Self {
        let resolver = LocaleResolver::new(catalog.locales(), fallback);
        Self {
            translator: Translator::new(fallback, catalog),
            resolver,
        }
    }

    /// Resolves the locale for a request.
    #[must_use]
    pub fn resolve(&self, request: &LocaleRequest) -> String {
        self.resolver.resolve(request)
    }

    /// Translates `key`.
    #[must_use]
    pub fn translate(&self, key: &str, options: &TranslateOptions) -> String {
        self.translator.translate(key, options)
    }
}
