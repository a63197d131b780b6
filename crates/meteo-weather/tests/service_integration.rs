//! Integration tests for MeteoService against mocked geo and forecast APIs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use meteo_core::error::MSG_RATE_LIMIT;
use meteo_core::{ApiConfig, CacheConfig, MeteoError};
use meteo_weather::{format_many, MeteoService, OptionTag};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(uri: &str, ttl_seconds: u64) -> MeteoService {
    let api = ApiConfig {
        geo_base_url: uri.to_string(),
        weather_base_url: uri.to_string(),
        token: Some("test-token".to_string()),
    };
    let cache = CacheConfig {
        ttl_seconds,
        ..CacheConfig::default()
    };
    MeteoService::new(&api, &cache)
}

/// Helper to create the communes payload for 75001
fn communes() -> serde_json::Value {
    serde_json::json!([
        {
            "nom": "Paris",
            "code": "75056",
            "codesPostaux": ["75001"],
            "centre": {"type": "Point", "coordinates": [2.347, 48.8589]}
        }
    ])
}

/// Helper to create a forecast payload with `n` days
fn forecast(n: usize) -> serde_json::Value {
    let days: Vec<_> = (0..n)
        .map(|i| {
            serde_json::json!({
                "datetime": format!("2026-10-{:02}T00:00:00+0200", 19 + i),
                "tmin": 8.4,
                "tmax": 15.6,
                "probarain": 40,
                "sun_hours": 4.26,
                "rr10": 1.2,
                "wind10m": 14.5,
                "dirwind10m": 350,
                "weather": 5
            })
        })
        .collect();
    serde_json::json!({
        "city": {"insee": "75056", "name": "Paris", "latitude": 48.8589, "longitude": 2.347},
        "forecast": days
    })
}

#[tokio::test]
async fn test_search_always_hits_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communes"))
        .and(query_param("codePostal", "75001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(communes()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server.uri(), 300);
    let first = svc.search_cities_by_postal_code("75001").await.unwrap();
    let second = svc.search_cities_by_postal_code("75001").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].display_name, "Paris (75001)");
}

#[tokio::test]
async fn test_search_falls_back_to_previous_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(communes()))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/communes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server.uri(), 300);
    let first = svc.search_cities_by_postal_code("75001").await.unwrap();
    let second = svc.search_cities_by_postal_code("75001").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_forecast_is_cached_and_truncated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .and(query_param("token", "test-token"))
        .and(query_param("insee", "75056"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(7)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server.uri(), 300);
    let days = svc.get_weather_forecast("75056", 3).await.unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0].tmax, 16);
    assert_eq!(days[0].sun_hours, 4.3);
    assert_eq!(days[0].latitude, Some(48.8589));

    let again = svc.get_weather_forecast("75056", 3).await.unwrap();
    assert_eq!(again, days);
    assert_eq!(svc.cache_stats().await.valid, 1);

    let cards = format_many(&days, &[OptionTag::WindDirection]);
    assert_eq!(cards[0].optional_details[0].value, "N (350°)");
}

#[tokio::test]
async fn test_expired_forecast_served_when_upstream_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(2)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server.uri(), 0);
    let first = svc.get_weather_forecast("75056", 2).await.unwrap();
    let second = svc.get_weather_forecast("75056", 2).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(svc.cache_stats().await.expired, 1);
    assert_eq!(svc.purge_expired().await, 1);
}

#[tokio::test]
async fn test_invalid_inputs_never_reach_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server.uri(), 300);
    assert!(matches!(
        svc.get_weather_forecast("75056", 8).await,
        Err(MeteoError::Validation(_))
    ));
    assert!(matches!(
        svc.search_cities_by_postal_code("7500").await,
        Err(MeteoError::Validation(_))
    ));
}

#[tokio::test]
async fn test_rate_limit_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server.uri(), 300);
    let err = svc.get_weather_forecast("75056", 1).await.unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.user_message(), MSG_RATE_LIMIT);
}

#[tokio::test]
async fn test_connection_report_and_clear_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/communes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(communes()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server.uri(), 300);
    let report = svc.test_api_connections().await;
    assert!(report.geo);
    assert!(!report.weather);
    assert_eq!(svc.cache_stats().await.total, 0);

    svc.search_cities_by_postal_code("75001").await.unwrap();
    assert_eq!(svc.cache_stats().await.total, 1);
    svc.clear_cache().await;
    assert_eq!(svc.cache_stats().await.total, 0);
}

#[tokio::test]
async fn test_each_day_count_fetches_separately() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .and(query_param("insee", "75056"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast(7)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server.uri(), 300);
    let three = svc.get_weather_forecast("75056", 3).await.unwrap();
    let five = svc.get_weather_forecast("75056", 5).await.unwrap();
    assert_eq!(three.len(), 3);
    assert_eq!(five.len(), 5);
    assert_eq!(svc.cache_stats().await.valid, 2);

    // Both counts are now served from cache
    svc.get_weather_forecast("75056", 3).await.unwrap();
    svc.get_weather_forecast("75056", 5).await.unwrap();
}

#[tokio::test]
async fn test_unreachable_weather_api_error_omits_token() {
    let api = ApiConfig {
        geo_base_url: "http://127.0.0.1:9".to_string(),
        weather_base_url: "http://127.0.0.1:9".to_string(),
        token: Some("SECRET123".to_string()),
    };
    let svc = MeteoService::new(&api, &CacheConfig::default());

    let err = svc.get_weather_forecast("75056", 1).await.unwrap_err();
    assert!(matches!(err, MeteoError::Network(_)));
    assert!(!err.to_string().contains("SECRET123"));
}
