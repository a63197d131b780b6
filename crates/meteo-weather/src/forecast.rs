//! Daily forecast client.

use meteo_core::MeteoError;
use parking_lot::RwLock;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::cache::{CacheKey, CachedPayload, TtlCache};
use crate::http::{endpoint, HttpFetcher};
use crate::types::{ForecastDay, RawCityEnvelope, RawForecastDay};

pub const MIN_DAYS: u8 = 1;
pub const MAX_DAYS: u8 = 7;

#[derive(Debug)]
pub struct WeatherClient {
    fetcher: HttpFetcher,
    cache: Arc<TtlCache<CachedPayload>>,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl WeatherClient {
    pub fn new(
        fetcher: HttpFetcher,
        cache: Arc<TtlCache<CachedPayload>>,
        base_url: &str,
        token: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            base_url: base_url.to_string(),
            token: RwLock::new(token),
        }
    }

    /// Replace the API token used for subsequent requests.
    pub fn set_credential(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
        tracing::info!("Weather API token updated");
    }

    pub fn has_credential(&self) -> bool {
        self.token.read().is_some()
    }

    pub(crate) fn credential(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// The first `days` days of forecast for the commune `city_code`.
    ///
    /// Each day count is cached under its own key.
    #[instrument(skip(self), level = "info")]
    pub async fn get_weather_forecast(
        &self,
        city_code: &str,
        days: u8,
    ) -> Result<Vec<ForecastDay>, MeteoError> {
        if city_code.trim().is_empty() {
            return Err(MeteoError::Validation(
                "Code commune manquant".to_string(),
            ));
        }
        if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
            return Err(MeteoError::Validation(format!(
                "Le nombre de jours doit être compris entre {} et {}",
                MIN_DAYS, MAX_DAYS
            )));
        }
        let token = self
            .token
            .read()
            .clone()
            .ok_or_else(|| MeteoError::Config("Token API météo non configuré".to_string()))?;

        let key = CacheKey::Forecast {
            city_code: city_code.to_string(),
            days,
        };

        let payload = self
            .cache
            .get_or_fetch(key, || async {
                let url = endpoint(
                    &self.base_url,
                    "forecast/daily",
                    &[("token", token.as_str()), ("insee", city_code)],
                )?;
                let data = self.fetcher.fetch_json(&url, HeaderMap::new()).await?;
                let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
                parse_forecast(data, days, &today).map(CachedPayload::Forecast)
            })
            .await?;

        match payload {
            CachedPayload::Forecast(forecast) => Ok(forecast),
            other => Err(other.mismatch()),
        }
    }
}

fn parse_forecast(data: Value, days: u8, today: &str) -> Result<Vec<ForecastDay>, MeteoError> {
    let city: Option<RawCityEnvelope> = data
        .get("city")
        .filter(|c| c.is_object())
        .and_then(|c| serde_json::from_value(c.clone()).ok());

    let Some(Value::Array(entries)) = data.get("forecast") else {
        return Err(MeteoError::Format(
            "la réponse météo ne contient pas de prévisions".to_string(),
        ));
    };

    let forecast = entries
        .iter()
        .take(usize::from(days))
        .map(|entry| {
            serde_json::from_value::<RawForecastDay>(entry.clone())
                .map(|raw| raw.normalize(city.as_ref(), today))
                .map_err(|e| MeteoError::Format(format!("jour de prévision illisible: {}", e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if forecast.is_empty() {
        return Err(MeteoError::NotFound(
            "Aucune prévision disponible pour cette commune".to_string(),
        ));
    }

    Ok(forecast)
}
