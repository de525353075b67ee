//! Request locale resolution.
//!
//! The locale comes from the `Accept-Language` header, is overridden by a
//! locale segment in the URL path (`/fr/...`, `/pt-br/...`), and finally by a
//! `lang` query parameter.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Matches a locale path segment such as `/fr/` or `/pt-br/`.
#[allow(clippy::expect_used)]
fn path_locale_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/([a-z]{2}(?:-[a-z]{2})?)/.*").expect("valid regex"))
}

/// One entry of an `Accept-Language` header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedLanguage {
    /// Primary language subtag, e.g. `en`.
    pub code: String,
    /// Script subtag, e.g. `Hant`.
    pub script: Option<String>,
    /// Region subtag, e.g. `GB`.
    pub region: Option<String>,
    /// Quality weight in `0.0..=1.0`.
    pub quality: f32,
}

impl AcceptedLanguage {
    /// Splits a language tag into code, script and region.
    fn from_tag(tag: &str, quality: f32) -> Option<Self> {
        let mut parts = tag.split('-').map(str::trim);
        let code = parts.next().filter(|c| !c.is_empty())?.to_string();
        let second = parts.next().map(str::to_string);
        let third = parts.next().map(str::to_string);

        let (script, region) = match (second, third) {
            (Some(script), Some(region)) => (Some(script), Some(region)),
            (region, None) => (None, region),
            (None, Some(_)) => (None, None),
        };

        Some(Self {
            code,
            script,
            region,
            quality,
        })
    }

    /// Returns true if `supported` satisfies this accepted entry.
    fn accepts(&self, supported: &Self) -> bool {
        let same = |a: Option<&String>, b: Option<&String>| match a {
            None => true,
            Some(a) => b.is_some_and(|b| a.eq_ignore_ascii_case(b)),
        };

        self.code.eq_ignore_ascii_case(&supported.code)
            && same(self.script.as_ref(), supported.script.as_ref())
            && same(self.region.as_ref(), supported.region.as_ref())
    }
}

/// Parses an `Accept-Language` header, highest quality first.
///
/// Entries with an unparsable quality are dropped. Equal qualities keep
/// header order.
#[must_use]
pub fn parse_accept_language(header: &str) -> Vec<AcceptedLanguage> {
    let mut entries: Vec<AcceptedLanguage> = header
        .split(',')
        .filter_map(|item| {
            let mut pieces = item.split(';').map(str::trim);
            let tag = pieces.next()?;
            let quality = match pieces.find_map(|p| p.strip_prefix("q=")) {
                None => 1.0,
                Some(q) => q.trim().parse::<f32>().ok()?,
            };
            AcceptedLanguage::from_tag(tag, quality)
        })
        .collect();

    entries.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    entries
}

/// Picks the first supported locale acceptable to `header`.
///
/// The accepted code must match; script and region must match when the
/// accepted entry carries them. Returns the supported tag as given.
#[must_use]
pub fn pick<'a, S: AsRef<str>>(supported: &'a [S], header: &str) -> Option<&'a str> {
    let parsed: Vec<(&'a str, AcceptedLanguage)> = supported
        .iter()
        .filter_map(|tag| {
            let tag = tag.as_ref();
            AcceptedLanguage::from_tag(tag, 1.0).map(|lang| (tag, lang))
        })
        .collect();

    parse_accept_language(header).iter().find_map(|accepted| {
        parsed
            .iter()
            .find(|(_, lang)| accepted.accepts(lang))
            .map(|(tag, _)| *tag)
    })
}

/// The parts of a request that influence its locale.
#[derive(Debug, Clone, Default)]
pub struct LocaleRequest {
    /// Raw `Accept-Language` header.
    pub accept_language: Option<String>,
    /// Request path, optionally with a query string.
    pub url: Option<String>,
    /// Explicit `lang` query parameter; read from `url` when unset.
    pub lang: Option<String>,
}

impl LocaleRequest {
    /// Request carrying only an `Accept-Language` header.
    #[must_use]
    pub fn from_header(header: impl Into<String>) -> Self {
        Self {
            accept_language: Some(header.into()),
            ..Self::default()
        }
    }

    /// Sets the request URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the `lang` query parameter.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// The `lang` parameter, explicit or taken from the URL query string.
    fn lang(&self) -> Option<String> {
        if let Some(lang) = self.lang.as_ref().filter(|l| !l.is_empty()) {
            return Some(lang.clone());
        }

        let (_, query) = self.url.as_deref()?.split_once('?')?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, value)| key == "lang" && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    }
}

/// Resolves request locales against the set of loaded locales.
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    locales: Vec<String>,
    fallback: String,
}

impl LocaleResolver {
    /// Creates a resolver over `locales` with a fallback.
    #[must_use]
    pub fn new(locales: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            locales,
            fallback: fallback.into(),
        }
    }

    /// Resolves the locale for a request.
    #[must_use]
    pub fn resolve(&self, request: &LocaleRequest) -> String {
        let mut locale = request
            .accept_language
            .as_deref()
            .and_then(|header| pick(&self.locales, header))
            .unwrap_or(self.fallback.as_str())
            .to_string();

        if let Some(caps) = request
            .url
            .as_deref()
            .and_then(|url| path_locale_regex().captures(url))
        {
            locale = caps[1].to_string();
        }

        if let Some(lang) = request.lang() {
            locale = lang;
        }

        debug!(locale = %locale, "resolved request locale");
        locale
    }
}
