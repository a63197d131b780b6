//! JSON-over-HTTP fetcher shared by the geo and weather clients.

use meteo_core::{MeteoError, ReqwestErrorExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Query parameters whose values never appear in logs.
const SECRET_PARAMS: &[&str] = &["token"];

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Arc<Client>,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// GET `url` and parse the body as JSON.
    ///
    /// `headers` are applied over the default `Content-Type: application/json`.
    /// Non-2xx responses become [`MeteoError::Http`] carrying the body text;
    /// transport failures become [`MeteoError::Network`].
    pub async fn fetch_json(&self, url: &Url, headers: HeaderMap) -> Result<Value, MeteoError> {
        let mut merged = HeaderMap::new();
        merged.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        merged.extend(headers);

        let shown = redacted(url);

        let response = match self.client.get(url.clone()).headers(merged).send().await {
            Ok(r) => r,
            Err(e) => {
                let err = e.into_meteo_error();
                tracing::error!(url = %shown, "Request failed: {}", err);
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = MeteoError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            };
            tracing::error!(url = %shown, status = status.as_u16(), "Request failed: {}", err);
            return Err(err);
        }

        match response.json::<Value>().await {
            Ok(data) => {
                tracing::info!(url = %shown, status = status.as_u16(), "API response");
                Ok(data)
            }
            Err(e) => {
                let err = e.into_meteo_error();
                tracing::error!(url = %shown, "Invalid response body: {}", err);
                Err(err)
            }
        }
    }
}

/// Build `{base}/{path}?{query}`, tolerating a trailing slash on `base`.
pub fn endpoint(base: &str, path: &str, query: &[(&str, &str)]) -> Result<Url, MeteoError> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse_with_params(&raw, query)
        .map_err(|e| MeteoError::Config(format!("URL d'API invalide ({}): {}", raw, e)))
}

/// Copy of `url` with secret query values masked.
pub fn redacted(url: &Url) -> Url {
    if !url.query_pairs().any(|(k, _)| SECRET_PARAMS.contains(&k.as_ref())) {
        return url.clone();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    let mut out = url.clone();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}
