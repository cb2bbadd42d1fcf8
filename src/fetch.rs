//! The injected HTTP capability.
//!
//! `Fetch` abstracts the one network operation this crate needs — a single HTTP GET,
//! optionally with a `Range` header — the way `anni-provider`'s storage backends abstract
//! over "get me these bytes" without committing callers to a concrete client.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// The response to a single fetch.
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lower-cased keys.
    pub headers: HashMap<String, String>,
    /// The full response body.
    pub body: Bytes,
}

/// A minimal, injectable HTTP capability.
///
/// Implementations are expected to issue a single `GET` request and return the status,
/// headers, and body verbatim; this crate interprets status codes and the `Content-Range`
/// header itself (see [`crate::range_reader::RangeReader`]).
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Perform a GET request against `url`, merging `headers` into the request.
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> std::result::Result<FetchResponse, Box<dyn std::error::Error + Send + Sync>>;
}

/// The default [`Fetch`] implementation, backed by `reqwest`.
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    /// Build a fetcher around a fresh `reqwest::Client`.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> std::result::Result<FetchResponse, Box<dyn std::error::Error + Send + Sync>> {
        let mut req = self.client.get(url);
        for (k, v) in headers {
            req = req.header(k, v);
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_ascii_lowercase(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = resp.bytes().await?;
        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
