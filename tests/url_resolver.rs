use fair_metric_harvest::domain::WorklistRow;
use fair_metric_harvest::url_resolver::{UrlSource, resolve, url_from_formula};

fn row(display: &str, formula: &str, hyperlink: Option<&str>) -> WorklistRow {
    WorklistRow {
        row_index: 3,
        display_value: display.to_string(),
        formula_text: formula.to_string(),
        hyperlink_url: hyperlink.map(str::to_string),
    }
}

#[test]
fn formula_takes_priority() {
    let resolved = resolve(&row(
        "t1",
        r#"=HYPERLINK("https://example.org/t1","t1")"#,
        Some("https://example.org/other"),
    ))
    .unwrap();
    assert_eq!(resolved.url, "https://example.org/t1");
    assert_eq!(resolved.source, UrlSource::Formula);
}

#[test]
fn formula_name_is_case_insensitive() {
    assert_eq!(
        url_from_formula(r#"=hyperlink( "https://example.org/a" ; "a")"#).as_deref(),
        Some("https://example.org/a")
    );
}

#[test]
fn hyperlink_used_without_formula() {
    let resolved = resolve(&row("label", "", Some("https://example.org/linked"))).unwrap();
    assert_eq!(resolved.url, "https://example.org/linked");
    assert_eq!(resolved.source, UrlSource::Hyperlink);
}

#[test]
fn hyperlink_used_when_formula_does_not_match() {
    let resolved = resolve(&row("label", "=A1&B1", Some("https://example.org/linked"))).unwrap();
    assert_eq!(resolved.source, UrlSource::Hyperlink);
}

#[test]
fn display_text_url() {
    let resolved = resolve(&row("https://example.org/plain", "", None)).unwrap();
    assert_eq!(resolved.url, "https://example.org/plain");
    assert_eq!(resolved.source, UrlSource::DisplayText);
}

#[test]
fn display_text_url_is_trimmed() {
    let resolved = resolve(&row("  https://example.org/padded \n", "", None)).unwrap();
    assert_eq!(resolved.url, "https://example.org/padded");
    assert_eq!(resolved.source, UrlSource::DisplayText);
}

#[test]
fn no_url() {
    assert!(resolve(&row("just a label", "", None)).is_none());
    assert!(resolve(&row("", "", Some("  "))).is_none());
}
