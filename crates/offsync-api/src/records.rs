// Record store HTTP client
//
// Wraps `reqwest::Client` with the record endpoints:
//
//   GET    /records?from&to&category&resolved&q
//   GET    /records/{id}
//   POST   /records
//   PUT    /records/{id}
//   DELETE /records/{id}
//
// The client is generic over the record payload; it never interprets
// record fields beyond (de)serializing them.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::response::{ensure_success, parse_json};
use crate::transport::TransportConfig;

/// Query restriction for `GET /records`, already flattened to wire values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Sent as one repeated `category` parameter per entry.
    pub categories: Vec<String>,
    pub resolved: Option<bool>,
    pub text: Option<String>,
}

impl RecordQuery {
    /// Flatten into ordered query pairs. Absent fields are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from {
            pairs.push(("from", from.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        for category in &self.categories {
            pairs.push(("category", category.clone()));
        }
        if let Some(resolved) = self.resolved {
            pairs.push(("resolved", resolved.to_string()));
        }
        if let Some(ref text) = self.text {
            pairs.push(("q", text.clone()));
        }
        pairs
    }
}

/// Raw HTTP client for the remote record store.
pub struct RecordClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RecordClient {
    /// Create a new record client from a `TransportConfig`.
    ///
    /// `base_url` is the API root; `records` is appended to it.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Create a record client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Self::with_client(http, Url::parse(base_url)?)
    }

    fn with_client(http: reqwest::Client, base_url: Url) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/records` or `{base}/records/{id}`, with the id percent-encoded.
    fn records_url(&self, id: Option<&str>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push("records");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List records matching a query.
    pub async fn list<T: DeserializeOwned>(&self, query: &RecordQuery) -> Result<Vec<T>, Error> {
        let url = self.records_url(None)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&query.to_pairs())
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_json(resp).await
    }

    /// Fetch one record. A 404 is reported as `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, Error> {
        let url = self.records_url(Some(id))?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_json(resp).await.map(Some)
    }

    /// Create a record; the server returns the hydrated record.
    pub async fn create<T: DeserializeOwned>(&self, body: &impl Serialize) -> Result<T, Error> {
        let url = self.records_url(None)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_json(resp).await
    }

    /// Replace a record's fields; the server returns the hydrated record.
    pub async fn update<T: DeserializeOwned>(
        &self,
        id: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.records_url(Some(id))?;
        debug!("PUT {}", url);

        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_json(resp).await
    }

    /// Delete a record.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let url = self.records_url(Some(id))?;
        debug!("DELETE {}", url);

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        ensure_success(resp).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client(base: &str) -> RecordClient {
        RecordClient::from_reqwest(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn records_url_handles_trailing_slash() {
        let a = client("https://api.example.com/v1");
        let b = client("https://api.example.com/v1/");
        assert_eq!(
            a.records_url(None).unwrap().as_str(),
            "https://api.example.com/v1/records"
        );
        assert_eq!(a.records_url(None).unwrap(), b.records_url(None).unwrap());
    }

    #[test]
    fn record_ids_are_percent_encoded() {
        let c = client("https://api.example.com/");
        let url = c.records_url(Some("a/b c")).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/records/a%2Fb%20c");
    }

    #[test]
    fn query_pairs_skip_absent_fields() {
        let query = RecordQuery {
            from: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            categories: vec!["symptom".into(), "medication".into()],
            resolved: Some(false),
            ..RecordQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("from", "2024-03-01T00:00:00.000Z".to_owned()),
                ("category", "symptom".to_owned()),
                ("category", "medication".to_owned()),
                ("resolved", "false".to_owned()),
            ]
        );
    }

    #[test]
    fn cannot_be_a_base_is_rejected() {
        let err = RecordClient::from_reqwest("mailto:ops@example.com", reqwest::Client::new());
        assert!(matches!(err, Err(Error::InvalidBaseUrl(_))));
    }
}
