//! French commune lookup and daily forecast client
//!
//! Talks to the public geocoding API for communes and to a token-protected
//! forecast API, sharing one TTL cache with stale fallback between both.

pub mod cache;
pub mod card;
pub mod forecast;
pub mod geo;
pub mod http;
pub mod service;
pub mod types;

pub use cache::{CacheKey, CacheStats, CachedPayload, TtlCache};
pub use card::{
    compare, comparison_rows, format, format_date_fr, format_many, reveal_schedule, CardDetail,
    Comparison, ComparisonCard, ComparisonRow, DisplayEvent, OptionTag, RenderedCard,
};
pub use forecast::{WeatherClient, MAX_DAYS, MIN_DAYS};
pub use geo::{is_valid_postal_code, sanitize_postal_code, GeoClient};
pub use http::HttpFetcher;
pub use service::{ConnectionReport, MeteoService};
pub use types::{wind_direction, City, CityDetails, ForecastDay, WeatherCode};
