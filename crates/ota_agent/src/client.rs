//! Update server client
//!
//! One blocking request per run: GET with the device report as JSON body,
//! answered by a JSON array of directives.

use crate::error::{OtaError, Result};
use ota_common::{parse_directives, ServerConfig, UpdateDirective};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::info;

/// Header carrying the protocol version the agent speaks
pub const API_VERSION_HEADER: &str = "accept-version";

pub struct UpdateClient {
    http: reqwest::blocking::Client,
    config: ServerConfig,
}

impl UpdateClient {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("ota-agent/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .default_headers(default_headers(&config)?)
            .build()?;
        Ok(Self { http, config })
    }

    /// Send the device report and decode the pending directives
    pub fn request_directives<B: Serialize + ?Sized>(&self, body: &B) -> Result<Vec<UpdateDirective>> {
        let payload = serde_json::to_vec(body)?;

        let response = self
            .http
            .get(&self.config.url)
            .body(payload)
            .send()?;

        let status = response.status();
        info!("response code ====> {}", status.as_u16());

        if !status.is_success() {
            return Err(OtaError::HttpStatus {
                status: status.as_u16(),
                url: self.config.url.clone(),
            });
        }

        let text = response.text()?;
        let directives = parse_directives(&text)?;
        info!("Received {} directive(s)", directives.len());
        Ok(directives)
    }
}

fn default_headers(config: &ServerConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let version = HeaderValue::from_str(&config.api_version).map_err(|e| OtaError::InvalidHeader {
        name: API_VERSION_HEADER.to_string(),
        reason: e.to_string(),
    })?;
    headers.insert(API_VERSION_HEADER, version);
    Ok(headers)
}
