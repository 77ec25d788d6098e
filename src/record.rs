use std::sync::LazyLock;

use regex::Regex;

use crate::domain::MetricRecordId;

static RECORD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)FAIRsharing\.(\w+)").expect("record token pattern"));

/// Derives the record token from a metric URL
/// (`https://doi.org/10.25504/FAIRsharing.AbC123` -> `AbC123`).
///
/// The last occurrence wins, not the first: in
/// `https://fairsharing.org/10.25504/FAIRsharing.x1y2` a first match would
/// yield the host's `org`.
pub fn extract_record_id(metric_url: &str) -> Option<MetricRecordId> {
    RECORD_TOKEN
        .captures_iter(metric_url)
        .filter_map(|caps| caps.get(1))
        .last()
        .map(|token| MetricRecordId::new(token.as_str()))
}

pub fn record_endpoint(base: &str, id: &MetricRecordId) -> String {
    format!("{}/FAIRsharing.{}", base.trim_end_matches('/'), id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_from_doi_url() {
        let id = extract_record_id("https://doi.org/10.25504/FAIRsharing.AbC123").unwrap();
        assert_eq!(id.as_str(), "AbC123");
    }

    #[test]
    fn token_from_fairsharing_host() {
        let id = extract_record_id("https://fairsharing.org/10.25504/FAIRsharing.x1y2").unwrap();
        assert_eq!(id.as_str(), "x1y2");
    }

    #[test]
    fn no_token() {
        assert!(extract_record_id("no-pattern-here").is_none());
    }

    #[test]
    fn endpoint_layout() {
        let id = MetricRecordId::new("XYZ9");
        assert_eq!(
            record_endpoint("https://fairsharing.org/", &id),
            "https://fairsharing.org/FAIRsharing.XYZ9"
        );
    }
}
