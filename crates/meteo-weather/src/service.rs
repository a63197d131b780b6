//! Single entry point composing the geo client, the weather client and the
//! shared response cache.

use meteo_core::{ApiConfig, CacheConfig, MeteoError};
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::cache::{CacheStats, CachedPayload, TtlCache};
use crate::forecast::WeatherClient;
use crate::geo::GeoClient;
use crate::http::{endpoint, HttpFetcher};
use crate::types::{City, CityDetails, ForecastDay};

const PROBE_POSTAL_CODE: &str = "75001";
const PROBE_INSEE: &str = "75056";

/// Reachability of each upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub geo: bool,
    pub weather: bool,
}

#[derive(Debug)]
pub struct MeteoService {
    fetcher: HttpFetcher,
    cache: Arc<TtlCache<CachedPayload>>,
    geo: GeoClient,
    weather: WeatherClient,
    geo_base_url: String,
    weather_base_url: String,
}

impl MeteoService {
    pub fn new(api: &ApiConfig, cache: &CacheConfig) -> Self {
        Self::with_fetcher(HttpFetcher::new(), api, cache)
    }

    pub fn with_fetcher(fetcher: HttpFetcher, api: &ApiConfig, cache: &CacheConfig) -> Self {
        let shared = Arc::new(TtlCache::new(cache.ttl()));
        let token = api.resolved_token();
        if token.is_none() {
            tracing::warn!("No weather API token configured");
        }

        Self {
            geo: GeoClient::new(fetcher.clone(), shared.clone(), &api.geo_base_url),
            weather: WeatherClient::new(
                fetcher.clone(),
                shared.clone(),
                &api.weather_base_url,
                token,
            ),
            fetcher,
            cache: shared,
            geo_base_url: api.geo_base_url.clone(),
            weather_base_url: api.weather_base_url.clone(),
        }
    }

    pub async fn search_cities_by_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Vec<City>, MeteoError> {
        self.geo.search_cities_by_postal_code(postal_code).await
    }

    pub async fn get_city_details(&self, city_code: &str) -> Result<CityDetails, MeteoError> {
        self.geo.get_city_details(city_code).await
    }

    pub async fn get_weather_forecast(
        &self,
        city_code: &str,
        days: u8,
    ) -> Result<Vec<ForecastDay>, MeteoError> {
        self.weather.get_weather_forecast(city_code, days).await
    }

    pub fn set_credential(&self, token: impl Into<String>) {
        self.weather.set_credential(token);
    }

    pub fn has_credential(&self) -> bool {
        self.weather.has_credential()
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        tracing::info!("Response cache cleared");
    }

    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Purge expired cache entries every `interval` until the handle is aborted.
    pub fn spawn_cache_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.cache.clone();
        let period = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired().await;
                if removed > 0 {
                    tracing::debug!("Sweeper purged {} entries", removed);
                }
            }
        })
    }

    /// Probe both upstreams directly, bypassing the cache.
    pub async fn test_api_connections(&self) -> ConnectionReport {
        let geo = match endpoint(
            &self.geo_base_url,
            "communes",
            &[("codePostal", PROBE_POSTAL_CODE), ("fields", "nom")],
        ) {
            Ok(url) => self.probe("geo", &url).await,
            Err(e) => {
                tracing::warn!("Geo API probe skipped: {}", e);
                false
            }
        };

        let weather = match self.weather_token() {
            Some(token) => match endpoint(
                &self.weather_base_url,
                "forecast/daily",
                &[("token", token.as_str()), ("insee", PROBE_INSEE)],
            ) {
                Ok(url) => self.probe("weather", &url).await,
                Err(e) => {
                    tracing::warn!("Weather API probe skipped: {}", e);
                    false
                }
            },
            None => {
                tracing::warn!("Weather API probe skipped: no token");
                false
            }
        };

        let report = ConnectionReport { geo, weather };
        tracing::info!(geo = report.geo, weather = report.weather, "API connection test");
        report
    }

    async fn probe(&self, name: &str, url: &url::Url) -> bool {
        match self.fetcher.fetch_json(url, HeaderMap::new()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("{} API unreachable: {}", name, e);
                false
            }
        }
    }

    fn weather_token(&self) -> Option<String> {
        self.weather.credential()
    }
}
