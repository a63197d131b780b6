use serde::{Deserialize, Serialize};

/// Weather condition codes of the daily forecast API (0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCode {
    Sun,
    FewClouds,
    Cloudy,
    VeryCloudy,
    Fog,
    LightRain,
    ModerateRain,
    HeavyRain,
    LightSnow,
    ModerateSnow,
    HeavySnow,
    Thunderstorm,
    SevereThunderstorm,
    Showers,
    ThunderyShowers,
    StrongWind,
    /// Anything outside 0-15
    Unknown,
}

impl WeatherCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Sun,
            1 => Self::FewClouds,
            2 => Self::Cloudy,
            3 => Self::VeryCloudy,
            4 => Self::Fog,
            5 => Self::LightRain,
            6 => Self::ModerateRain,
            7 => Self::HeavyRain,
            8 => Self::LightSnow,
            9 => Self::ModerateSnow,
            10 => Self::HeavySnow,
            11 => Self::Thunderstorm,
            12 => Self::SevereThunderstorm,
            13 => Self::Showers,
            14 => Self::ThunderyShowers,
            15 => Self::StrongWind,
            _ => Self::Unknown,
        }
    }

    /// French description shown on the card
    pub fn description(&self) -> &'static str {
        match self {
            Self::Sun => "Soleil",
            Self::FewClouds => "Peu nuageux",
            Self::Cloudy => "Nuageux",
            Self::VeryCloudy => "Très nuageux",
            Self::Fog => "Brouillard",
            Self::LightRain => "Pluie légère",
            Self::ModerateRain => "Pluie modérée",
            Self::HeavyRain => "Pluie forte",
            Self::LightSnow => "Neige légère",
            Self::ModerateSnow => "Neige modérée",
            Self::HeavySnow => "Neige forte",
            Self::Thunderstorm => "Orage",
            Self::SevereThunderstorm => "Orage violent",
            Self::Showers => "Averses",
            Self::ThunderyShowers => "Averses orageuses",
            Self::StrongWind => "Vent fort",
            Self::Unknown => "Conditions inconnues",
        }
    }

    /// Font Awesome icon class
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Sun => "fas fa-sun",
            Self::FewClouds => "fas fa-cloud-sun",
            Self::Cloudy | Self::VeryCloudy => "fas fa-cloud",
            Self::Fog => "fas fa-smog",
            Self::LightRain | Self::ModerateRain => "fas fa-cloud-rain",
            Self::HeavyRain => "fas fa-cloud-showers-heavy",
            Self::LightSnow | Self::ModerateSnow | Self::HeavySnow => "fas fa-snowflake",
            Self::Thunderstorm | Self::SevereThunderstorm => "fas fa-bolt",
            Self::Showers | Self::ThunderyShowers => "fas fa-cloud-rain",
            Self::StrongWind => "fas fa-wind",
            Self::Unknown => "fas fa-question",
        }
    }
}

/// 16-point compass, French abbreviations (O = ouest).
const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSO", "SO", "OSO", "O", "ONO", "NO",
    "NNO",
];

/// Cardinal point for a wind bearing in degrees.
pub fn wind_direction(degrees: f64) -> &'static str {
    let sector = js_round(degrees / 22.5) as i64;
    COMPASS[sector.rem_euclid(16) as usize]
}

/// Round half towards positive infinity, like the browser's `Math.round`.
pub fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to one decimal place with the same tie rule as [`js_round`].
pub fn round_one_decimal(value: f64) -> f64 {
    js_round(value * 10.0) / 10.0
}

/// A commune matching a postal code search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub name: String,
    /// INSEE code, the identity of the commune
    pub code: String,
    pub postal_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub display_name: String,
}

/// A commune with its administrative metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDetails {
    pub name: String,
    pub code: String,
    pub postal_codes: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Hectares
    pub surface: Option<f64>,
    pub population: Option<u64>,
}

/// One normalized day of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub datetime: String,
    pub tmin: i32,
    pub tmax: i32,
    /// Rain probability, percent
    pub probarain: i32,
    pub sun_hours: f64,
    /// Cumulated rainfall, mm
    pub rr10: f64,
    /// Mean wind at 10 m, km/h
    pub wind10m: i32,
    /// Wind bearing, degrees
    pub dirwind10m: i32,
    pub weather: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ForecastDay {
    pub fn condition(&self) -> WeatherCode {
        WeatherCode::from_code(self.weather)
    }
}

/// Commune record as returned by the geocoding API.
#[derive(Debug, Deserialize)]
pub(crate) struct RawCommune {
    pub nom: String,
    pub code: String,
    #[serde(rename = "codesPostaux", default)]
    pub codes_postaux: Vec<String>,
    #[serde(default)]
    pub centre: Option<RawCentre>,
    #[serde(default)]
    pub surface: Option<f64>,
    #[serde(default)]
    pub population: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCentre {
    /// GeoJSON order: `[lon, lat]`
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl RawCommune {
    /// `(latitude, longitude)`, both absent unless the pair is complete
    pub fn coordinates(&self) -> (Option<f64>, Option<f64>) {
        match self.centre.as_ref().map(|c| c.coordinates.as_slice()) {
            Some([lon, lat, ..]) => (Some(*lat), Some(*lon)),
            _ => (None, None),
        }
    }

    pub fn into_city(self, postal_code: &str) -> City {
        let (latitude, longitude) = self.coordinates();
        City {
            display_name: format!("{} ({})", self.nom, postal_code),
            name: self.nom,
            code: self.code,
            postal_code: postal_code.to_string(),
            latitude,
            longitude,
        }
    }

    pub fn into_details(self) -> CityDetails {
        let (latitude, longitude) = self.coordinates();
        CityDetails {
            name: self.nom,
            code: self.code,
            postal_codes: self.codes_postaux,
            latitude,
            longitude,
            surface: self.surface,
            population: self.population,
        }
    }
}

/// Forecast day as returned by the weather API; every field may be missing.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawForecastDay {
    pub datetime: Option<String>,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    pub probarain: Option<f64>,
    pub sun_hours: Option<f64>,
    pub rr10: Option<f64>,
    pub wind10m: Option<f64>,
    pub dirwind10m: Option<f64>,
    pub weather: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCityEnvelope {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RawForecastDay {
    pub fn normalize(self, city: Option<&RawCityEnvelope>, today: &str) -> ForecastDay {
        ForecastDay {
            datetime: self.datetime.unwrap_or_else(|| today.to_string()),
            tmin: js_round(self.tmin.unwrap_or(0.0)) as i32,
            tmax: js_round(self.tmax.unwrap_or(0.0)) as i32,
            probarain: self.probarain.unwrap_or(0.0) as i32,
            sun_hours: round_one_decimal(self.sun_hours.unwrap_or(0.0)),
            rr10: self.rr10.unwrap_or(0.0),
            wind10m: js_round(self.wind10m.unwrap_or(0.0)) as i32,
            dirwind10m: js_round(self.dirwind10m.unwrap_or(0.0)) as i32,
            weather: js_round(self.weather.unwrap_or(0.0)) as i32,
            latitude: city.and_then(|c| c.latitude),
            longitude: city.and_then(|c| c.longitude),
        }
    }
}
