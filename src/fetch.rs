use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::RdfDocument;
use crate::error::HarvestError;

pub trait DocumentClient {
    fn fetch_text(&self, url: &str) -> Result<RdfDocument, HarvestError>;
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("metric-harvest/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| HarvestError::HttpClient(err.to_string()))?,
    );
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|err| HarvestError::HttpClient(err.to_string()))
}

#[derive(Clone)]
pub struct HttpDocumentClient {
    client: Client,
}

impl HttpDocumentClient {
    pub fn new(timeout: Duration) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

impl DocumentClient for HttpDocumentClient {
    fn fetch_text(&self, url: &str) -> Result<RdfDocument, HarvestError> {
        let transport = |err: reqwest::Error| HarvestError::DocumentHttp {
            url: url.to_string(),
            message: err.to_string(),
        };
        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(HarvestError::DocumentStatus {
                url: url.to_string(),
                status,
            });
        }
        let text = response.text().map_err(transport)?;
        Ok(RdfDocument {
            source_url: url.to_string(),
            text,
        })
    }
}
