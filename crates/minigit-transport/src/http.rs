use std::io::Read;
use std::time::Duration;

use crate::{normalize_remote_url, TransportError};

const UPLOAD_PACK_SERVICE: &str = "git-upload-pack";
const ADVERTISEMENT_CONTENT_TYPE: &str = "application/x-git-upload-pack-advertisement";
const REQUEST_CONTENT_TYPE: &str = "application/x-git-upload-pack-request";
const RESULT_CONTENT_TYPE: &str = "application/x-git-upload-pack-result";

/// Some servers reject requests with an empty agent.
const USER_AGENT: &str = concat!("minigit/", env!("CARGO_PKG_VERSION"));

/// Ref discovery is a small response; upload-pack ships the whole pack.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(12);
const UPLOAD_PACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the two smart-HTTP endpoints of one remote repository.
pub struct HttpClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// Create a client for the given remote URL (normalized to `<base>.git`).
    pub fn new(url: &str) -> Result<Self, TransportError> {
        let base_url = normalize_remote_url(url)?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    /// The normalized base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET <base>.git/info/refs?service=git-upload-pack`.
    ///
    /// Returns the raw advertisement body. An HTML response (a web page
    /// where a smart server should answer) fails with `NotASmartServer`.
    pub fn info_refs(&self) -> Result<Vec<u8>, TransportError> {
        let url = format!(
            "{}/info/refs?service={}",
            self.base_url, UPLOAD_PACK_SERVICE
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", ADVERTISEMENT_CONTENT_TYPE)
            .timeout(DISCOVERY_TIMEOUT)
            .send()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }

        let html_content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"));

        let body = response
            .bytes()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?
            .to_vec();

        if html_content_type || body.first() == Some(&b'<') {
            return Err(TransportError::NotASmartServer {
                url: self.base_url.clone(),
            });
        }

        Ok(body)
    }

    /// `POST <base>.git/git-upload-pack` with the negotiation request body.
    ///
    /// Returns the response body as a stream; the caller reads pkt-lines
    /// from it until EOF.
    pub fn upload_pack(&self, request: Vec<u8>) -> Result<impl Read, TransportError> {
        let url = format!("{}/{}", self.base_url, UPLOAD_PACK_SERVICE);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", REQUEST_CONTENT_TYPE)
            .header("Accept", RESULT_CONTENT_TYPE)
            .timeout(UPLOAD_PACK_TIMEOUT)
            .body(request)
            .send()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            });
        }

        Ok(response)
    }
}
