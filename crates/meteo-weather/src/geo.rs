//! Commune lookup against the French geocoding API.

use meteo_core::MeteoError;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::cache::{CacheKey, CachedPayload, TtlCache};
use crate::http::{endpoint, HttpFetcher};
use crate::types::{City, CityDetails, RawCommune};

const SEARCH_FIELDS: &str = "nom,code,codesPostaux,centre";
const DETAILS_FIELDS: &str = "nom,code,codesPostaux,centre,surface,population";

/// Keep digits only, at most five of them.
pub fn sanitize_postal_code(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).take(5).collect()
}

/// Exactly five ASCII digits.
pub fn is_valid_postal_code(code: &str) -> bool {
    code.len() == 5 && code.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone)]
pub struct GeoClient {
    fetcher: HttpFetcher,
    cache: Arc<TtlCache<CachedPayload>>,
    base_url: String,
}

impl GeoClient {
    pub fn new(fetcher: HttpFetcher, cache: Arc<TtlCache<CachedPayload>>, base_url: &str) -> Self {
        Self {
            fetcher,
            cache,
            base_url: base_url.to_string(),
        }
    }

    /// Communes sharing `postal_code`.
    ///
    /// Only the length is checked; callers sanitize to digits first. The
    /// network is always hit; the cached list is only served if that fails.
    #[instrument(skip(self), level = "info")]
    pub async fn search_cities_by_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Vec<City>, MeteoError> {
        if postal_code.chars().count() != 5 {
            return Err(MeteoError::Validation(
                "Le code postal doit contenir 5 chiffres".to_string(),
            ));
        }

        let key = CacheKey::Cities {
            postal_code: postal_code.to_string(),
        };

        let payload = self
            .cache
            .refresh(key, || async {
                let url = endpoint(
                    &self.base_url,
                    "communes",
                    &[
                        ("codePostal", postal_code),
                        ("fields", SEARCH_FIELDS),
                        ("format", "json"),
                        ("geometry", "centre"),
                    ],
                )?;
                let data = self.fetcher.fetch_json(&url, HeaderMap::new()).await?;
                parse_cities(data, postal_code).map(CachedPayload::Cities)
            })
            .await?;

        match payload {
            CachedPayload::Cities(cities) => Ok(cities),
            other => Err(other.mismatch()),
        }
    }

    /// Administrative details of one commune, cached for the TTL.
    #[instrument(skip(self), level = "info")]
    pub async fn get_city_details(&self, city_code: &str) -> Result<CityDetails, MeteoError> {
        let key = CacheKey::CityDetails {
            code: city_code.to_string(),
        };

        let payload = self
            .cache
            .get_or_fetch(key, || async {
                let mut url = endpoint(
                    &self.base_url,
                    "communes",
                    &[
                        ("fields", DETAILS_FIELDS),
                        ("format", "json"),
                        ("geometry", "centre"),
                    ],
                )?;
                url.path_segments_mut()
                    .map_err(|_| MeteoError::Config("URL de l'API géo invalide".to_string()))?
                    .push(city_code);

                let data = self.fetcher.fetch_json(&url, HeaderMap::new()).await?;
                if !data.is_object() {
                    return Err(MeteoError::Format(
                        "la fiche commune n'est pas un objet".to_string(),
                    ));
                }
                let raw: RawCommune = serde_json::from_value(data)
                    .map_err(|e| MeteoError::Format(format!("fiche commune illisible: {}", e)))?;
                Ok::<_, MeteoError>(CachedPayload::CityDetails(raw.into_details()))
            })
            .await?;

        match payload {
            CachedPayload::CityDetails(details) => Ok(details),
            other => Err(other.mismatch()),
        }
    }
}

fn parse_cities(data: Value, postal_code: &str) -> Result<Vec<City>, MeteoError> {
    let Value::Array(records) = data else {
        return Err(MeteoError::Format(
            "l'API géo n'a pas renvoyé de liste".to_string(),
        ));
    };

    if records.is_empty() {
        return Err(MeteoError::NotFound(format!(
            "Aucune commune trouvée pour le code postal {}",
            postal_code
        )));
    }

    records
        .into_iter()
        .map(|record| {
            serde_json::from_value::<RawCommune>(record)
                .map(|raw| raw.into_city(postal_code))
                .map_err(|e| MeteoError::Format(format!("enregistrement illisible: {}", e)))
        })
        .collect()
}
