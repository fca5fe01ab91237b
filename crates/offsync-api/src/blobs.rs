// Blob storage HTTP client
//
//   PUT    /blobs/{name}   raw bytes in, `{ "url": "..." }` out
//   DELETE {url}           the absolute URL returned by upload

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::response::{ensure_success, parse_json};
use crate::transport::TransportConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Raw HTTP client for attachment blob storage.
pub struct BlobClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BlobClient {
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Create a blob client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Self::with_client(http, Url::parse(base_url)?)
    }

    fn with_client(http: reqwest::Client, base_url: Url) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    fn blob_url(&self, name: &str) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("blobs")
            .push(name);
        Ok(url)
    }

    /// Upload bytes under `name`, returning the URL the blob is served from.
    pub async fn upload(
        &self,
        bytes: Bytes,
        name: &str,
        content_type: Option<&str>,
    ) -> Result<String, Error> {
        let url = self.blob_url(name)?;
        debug!(size = bytes.len(), "PUT {}", url);

        let resp = self
            .http
            .put(url)
            .header(
                CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(bytes)
            .send()
            .await
            .map_err(Error::Transport)?;

        let uploaded: UploadResponse = parse_json(resp).await?;
        Ok(uploaded.url)
    }

    /// Delete a previously uploaded blob.
    ///
    /// A blob that is already gone (404) counts as deleted.
    pub async fn delete(&self, blob_url: &str) -> Result<(), Error> {
        let url = Url::parse(blob_url)?;
        debug!("DELETE {}", url);

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!(blob_url, "blob already absent");
            return Ok(());
        }
        ensure_success(resp).await
    }
}
