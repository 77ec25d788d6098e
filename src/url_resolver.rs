use std::sync::LazyLock;

use regex::Regex;

use crate::domain::WorklistRow;

static HYPERLINK_FORMULA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)HYPERLINK\s*\(\s*"([^"]+)""#).expect("hyperlink formula pattern")
});

/// Where a worklist row's URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    Formula,
    Hyperlink,
    DisplayText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    pub source: UrlSource,
}

/// Picks the canonical test URL for a row: formula argument, then attached
/// link, then display text starting with `http`.
pub fn resolve(row: &WorklistRow) -> Option<ResolvedUrl> {
    if let Some(url) = url_from_formula(&row.formula_text) {
        return Some(ResolvedUrl {
            url,
            source: UrlSource::Formula,
        });
    }

    if let Some(url) = row
        .hyperlink_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    {
        return Some(ResolvedUrl {
            url: url.to_string(),
            source: UrlSource::Hyperlink,
        });
    }

    let display = row.display_value.trim();
    if display.starts_with("http") {
        return Some(ResolvedUrl {
            url: display.to_string(),
            source: UrlSource::DisplayText,
        });
    }

    None
}

pub fn url_from_formula(formula: &str) -> Option<String> {
    if formula.trim().is_empty() {
        return None;
    }
    HYPERLINK_FORMULA
        .captures(formula)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().to_string())
}
