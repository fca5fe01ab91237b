// Reachability probe
//
// A cheap `HEAD` against a health endpoint. Any transport failure or
// non-success status reads as unreachable; the probe has no error path.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Default probe timeout. Kept short so an offline device answers quickly.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct HttpProbe {
    http: reqwest::Client,
    url: Url,
}

impl HttpProbe {
    /// Build a probe against `url` using the shared transport settings,
    /// but with its own (short) timeout.
    pub fn new(url: Url, transport: &TransportConfig, timeout: Duration) -> Result<Self, Error> {
        let http = transport.build_client_with_timeout(timeout)?;
        Ok(Self { http, url })
    }

    /// Create a probe with a pre-built `reqwest::Client`.
    pub fn from_reqwest(url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            url: Url::parse(url)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `true` iff the endpoint answered with a 2xx status.
    pub async fn reachable(&self) -> bool {
        match self.http.head(self.url.clone()).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                debug!(status = resp.status().as_u16(), ok, "reachability probe");
                ok
            }
            Err(e) => {
                debug!(error = %e, "reachability probe failed");
                false
            }
        }
    }
}
