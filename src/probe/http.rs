//! HTTP probe adapter
//!
//! Reference [`PageProbe`] implementation for sites whose extraction
//! layer exposes pre-extracted records as a JSON array per result page.
//! Handles client construction, URL templating, and classification of
//! HTTP failures into transient probe errors.

use crate::model::{Query, Record};
use crate::probe::{PageProbe, ProbeError, ProbeReport};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Builds an HTTP client with timeouts and user agent set.
///
/// # Arguments
///
/// * `user_agent` - Identification string sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_probe_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Probes pages by substituting `{category}`, `{subcategory}`, and
/// `{page}` into a per-site URL template and parsing the JSON body as a
/// record array.
///
/// An HTTP 404 or an empty array is an invalid page, not an error:
/// both mean the result set ends before this page. Server errors,
/// timeouts, and unparseable bodies are transient and left to the
/// retry wrapper.
pub struct HttpProbe {
    client: Client,
    url_template: String,
}

impl HttpProbe {
    pub fn new(client: Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    /// Constructs the page URL for a (query, page) pair
    pub fn page_url(&self, query: &Query, page: u32) -> String {
        self.url_template
            .replace("{category}", &query.category)
            .replace("{subcategory}", &query.subcategory)
            .replace("{page}", &page.to_string())
    }
}

impl PageProbe for HttpProbe {
    async fn probe(&self, query: &Query, page: u32) -> Result<ProbeReport, ProbeError> {
        let url = self.page_url(query, page);
        tracing::debug!("Probing {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                return Err(if e.is_timeout() {
                    ProbeError::Timeout
                } else {
                    ProbeError::Network(e.to_string())
                });
            }
        };

        let status = response.status();

        // Past-the-end pages commonly 404; that is a definitive answer
        if status == StatusCode::NOT_FOUND {
            return Ok(ProbeReport::invalid());
        }

        if !status.is_success() {
            return Err(ProbeError::Network(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        let records: Vec<Record> = serde_json::from_str(&body)
            .map_err(|e| ProbeError::Malformed(format!("expected record array: {}", e)))?;

        Ok(ProbeReport { records })
    }
}
