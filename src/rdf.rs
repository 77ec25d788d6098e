//! Lightweight field extraction from RDF test descriptions.
//!
//! Source documents mix Turtle/N-Triples and RDF/XML serializations, so the
//! extractor runs a fixed sequence of patterns rather than a real RDF parser.
//! Callers depend only on [`RdfExtractor`].

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{ExtractionResult, RdfDocument};

static DOI_METRIC_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://doi\.org/10\.25504/FAIRsharing\.[A-Za-z0-9]+").expect("doi metric pattern")
});

static FAIRSHARING_METRIC_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://fairsharing\.org/10\.25504/FAIRsharing\.[A-Za-z0-9]+")
        .expect("fairsharing metric pattern")
});

static DESCRIPTION_PATTERNS: LazyLock<Vec<DescriptionPattern>> = LazyLock::new(|| {
    vec![
        DescriptionPattern::new(
            r#"<http://purl\.org/dc/terms/description>\s+"([^"]*)""#,
            false,
        ),
        DescriptionPattern::new(
            r#"<dcterms:description[^>]*>\s*"([^"]*)"\s*</dcterms:description>"#,
            false,
        ),
        DescriptionPattern::new(
            r"(?s)<dcterms:description[^>]*>(.*?)</dcterms:description>",
            true,
        ),
        DescriptionPattern::new(r#"dcterms:description\s+"([^"]*)""#, false),
    ]
});

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup tag pattern"));

struct DescriptionPattern {
    regex: Regex,
    strip_markup: bool,
}

impl DescriptionPattern {
    fn new(pattern: &str, strip_markup: bool) -> Self {
        Self {
            regex: Regex::new(pattern).expect("description pattern"),
            strip_markup,
        }
    }

    fn capture(&self, text: &str) -> Option<String> {
        let raw = self.regex.captures(text)?.get(1)?.as_str();
        let value = if self.strip_markup {
            MARKUP_TAG.replace_all(raw, "").into_owned()
        } else {
            raw.to_string()
        };
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

pub trait RdfExtractor {
    fn find_metric_url(&self, text: &str) -> Option<String>;
    fn extract_description(&self, text: &str) -> Option<String>;

    fn extract(&self, document: &RdfDocument) -> ExtractionResult {
        ExtractionResult {
            metric_url: self.find_metric_url(&document.text),
            test_description: self.extract_description(&document.text),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternRdfExtractor;

impl RdfExtractor for PatternRdfExtractor {
    fn find_metric_url(&self, text: &str) -> Option<String> {
        find_metric_url(text)
    }

    fn extract_description(&self, text: &str) -> Option<String> {
        extract_description(text)
    }
}

/// First doi.org-form metric URL; the fairsharing.org form is only consulted
/// when the whole text has no doi.org match.
pub fn find_metric_url(text: &str) -> Option<String> {
    DOI_METRIC_URL
        .find(text)
        .or_else(|| FAIRSHARING_METRIC_URL.find(text))
        .map(|found| found.as_str().to_string())
}

pub fn extract_description(text: &str) -> Option<String> {
    DESCRIPTION_PATTERNS
        .iter()
        .find_map(|pattern| pattern.capture(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped_from_wrapped_description() {
        let text = "<dcterms:description>\n  Checks <b>licence</b> presence\n</dcterms:description>";
        assert_eq!(
            extract_description(text).as_deref(),
            Some("Checks licence presence")
        );
    }

    #[test]
    fn empty_capture_falls_through() {
        let text = r#"<http://purl.org/dc/terms/description> "  "
dcterms:description "Second style""#;
        assert_eq!(extract_description(text).as_deref(), Some("Second style"));
    }
}
