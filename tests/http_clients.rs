use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use assert_matches::assert_matches;

use fair_metric_harvest::config::MetricJsonPath;
use fair_metric_harvest::domain::{MetricName, MetricRecordId};
use fair_metric_harvest::error::{HarvestError, LookupError};
use fair_metric_harvest::fairsharing::{FairsharingHttpClient, MetricClient, lookup};
use fair_metric_harvest::fetch::{DocumentClient, HttpDocumentClient};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Serves one canned response on a loopback port and hands back the raw
/// request it received.
fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        let _ = sender.send(String::from_utf8_lossy(&request).into_owned());
    });

    (base, receiver)
}

fn closed_port_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn name_path() -> MetricJsonPath {
    MetricJsonPath::parse("metadata.name").unwrap()
}

#[test]
fn lookup_sends_json_accept_and_reads_name() {
    let (base, request) = serve_once("200 OK", r#"{"metadata":{"name":"M"}}"#);
    let client = FairsharingHttpClient::new(&base, TIMEOUT).unwrap();
    let id = MetricRecordId::new("XYZ9");

    let name = lookup(&client, &id, &name_path());
    assert_eq!(name, MetricName::Found("M".to_string()));

    let request = request.recv_timeout(TIMEOUT).unwrap().to_lowercase();
    assert!(request.starts_with("get /fairsharing.xyz9 "));
    assert!(request.contains("accept: application/json"));
}

#[test]
fn malformed_body_is_transport_error() {
    let (base, _request) = serve_once("200 OK", "not json");
    let client = FairsharingHttpClient::new(&base, TIMEOUT).unwrap();
    let id = MetricRecordId::new("XYZ9");

    assert_matches!(client.fetch_record(&id), Err(LookupError::Transport(_)));
    let (base, _request) = serve_once("200 OK", "not json");
    let client = FairsharingHttpClient::new(&base, TIMEOUT).unwrap();
    assert_eq!(lookup(&client, &id, &name_path()).render(), "Error");
}

#[test]
fn non_200_is_http_error() {
    let (base, _request) = serve_once("404 Not Found", "{}");
    let client = FairsharingHttpClient::new(&base, TIMEOUT).unwrap();

    let name = lookup(&client, &MetricRecordId::new("gone"), &name_path());
    assert_eq!(name, MetricName::Lookup(LookupError::HttpStatus(404)));
    assert_eq!(name.render(), "HTTP Error");
}

#[test]
fn missing_path_is_not_available() {
    let (base, _request) = serve_once("200 OK", r#"{"metadata":{}}"#);
    let client = FairsharingHttpClient::new(&base, TIMEOUT).unwrap();

    let name = lookup(&client, &MetricRecordId::new("XYZ9"), &name_path());
    assert_eq!(name, MetricName::Lookup(LookupError::PathMissing));
    assert_eq!(name.render(), "N/A");
}

#[test]
fn refused_connection_is_transport_error() {
    let client = FairsharingHttpClient::new(&closed_port_base(), TIMEOUT).unwrap();

    let name = lookup(&client, &MetricRecordId::new("XYZ9"), &name_path());
    assert_matches!(name, MetricName::Lookup(LookupError::Transport(_)));
    assert_eq!(name.render(), "Error");
}

#[test]
fn document_fetch_returns_body() {
    let (base, _request) = serve_once("200 OK", "<rdf:RDF/>");
    let client = HttpDocumentClient::new(TIMEOUT).unwrap();
    let url = format!("{base}/t1");

    let document = client.fetch_text(&url).unwrap();
    assert_eq!(document.source_url, url);
    assert_eq!(document.text, "<rdf:RDF/>");
}

#[test]
fn document_fetch_status_message() {
    let (base, _request) = serve_once("404 Not Found", "");
    let client = HttpDocumentClient::new(TIMEOUT).unwrap();
    let url = format!("{base}/t1");

    let err = client.fetch_text(&url).unwrap_err();
    assert_matches!(err, HarvestError::DocumentStatus { status: 404, .. });
    assert_eq!(err.to_string(), format!("Failed to fetch {url}: HTTP 404"));
}

#[test]
fn document_fetch_refused_names_url() {
    let client = HttpDocumentClient::new(TIMEOUT).unwrap();
    let url = format!("{}/t1", closed_port_base());

    let err = client.fetch_text(&url).unwrap_err();
    assert_matches!(err, HarvestError::DocumentHttp { .. });
    assert!(err.to_string().starts_with(&format!("Failed to fetch {url}: ")));
}
