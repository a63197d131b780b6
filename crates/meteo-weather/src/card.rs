//! Display-ready projection of forecast days.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::time::Duration;

use crate::types::{round_one_decimal, wind_direction, ForecastDay};

/// Optional detail a user can ask to see on each card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionTag {
    Latitude,
    Longitude,
    Rainfall,
    Wind,
    WindDirection,
}

impl OptionTag {
    /// Parse a checkbox value (`latitude`, `windDirection`, ...).
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "latitude" => Some(Self::Latitude),
            "longitude" => Some(Self::Longitude),
            "rainfall" => Some(Self::Rainfall),
            "wind" => Some(Self::Wind),
            "windDirection" => Some(Self::WindDirection),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &'static str {
        match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Rainfall => "rainfall",
            Self::Wind => "wind",
            Self::WindDirection => "windDirection",
        }
    }

    /// Parse many values, keeping their order and skipping unknown ones.
    pub fn parse_all<I, S>(values: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .filter_map(|v| Self::from_value(v.as_ref()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDetail {
    pub icon: &'static str,
    pub value: String,
    pub label: &'static str,
}

impl CardDetail {
    fn new(icon: &'static str, value: String, label: &'static str) -> Self {
        Self { icon, value, label }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedCard {
    pub datetime: String,
    pub formatted_date: String,
    pub icon: &'static str,
    pub description: &'static str,
    pub tmax: i32,
    pub tmin: i32,
    pub base_details: Vec<CardDetail>,
    pub optional_details: Vec<CardDetail>,
}

/// Build the card for one day. Optional details follow the order of `options`.
pub fn format(day: &ForecastDay, options: &[OptionTag]) -> RenderedCard {
    let condition = day.condition();

    let base_details = vec![
        CardDetail::new("fas fa-eye", format!("{}%", day.probarain), "Prob. pluie"),
        CardDetail::new("fas fa-sun", format!("{}h", day.sun_hours), "Ensoleillement"),
    ];

    let optional_details = options
        .iter()
        .filter_map(|option| optional_detail(day, *option))
        .collect();

    RenderedCard {
        datetime: day.datetime.clone(),
        formatted_date: format_date_fr(&day.datetime),
        icon: condition.icon(),
        description: condition.description(),
        tmax: day.tmax,
        tmin: day.tmin,
        base_details,
        optional_details,
    }
}

fn optional_detail(day: &ForecastDay, option: OptionTag) -> Option<CardDetail> {
    match option {
        OptionTag::Latitude => day
            .latitude
            .map(|lat| CardDetail::new("fas fa-globe", format!("{:.4}°", lat), "Latitude")),
        OptionTag::Longitude => day
            .longitude
            .map(|lon| CardDetail::new("fas fa-globe", format!("{:.4}°", lon), "Longitude")),
        OptionTag::Rainfall => Some(CardDetail::new(
            "fas fa-cloud-rain",
            format!("{} mm", day.rr10),
            "Cumul pluie",
        )),
        OptionTag::Wind => Some(CardDetail::new(
            "fas fa-wind",
            format!("{} km/h", day.wind10m),
            "Vent moyen",
        )),
        OptionTag::WindDirection => Some(CardDetail::new(
            "fas fa-compass",
            format!(
                "{} ({}°)",
                wind_direction(f64::from(day.dirwind10m)),
                day.dirwind10m
            ),
            "Direction vent",
        )),
    }
}

pub fn format_many(days: &[ForecastDay], options: &[OptionTag]) -> Vec<RenderedCard> {
    days.iter().map(|day| format(day, options)).collect()
}

const WEEKDAYS: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];
const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Long French date, e.g. `lundi 19 octobre 2026`.
///
/// Only the leading `YYYY-MM-DD` is read; anything unparseable comes back unchanged.
pub fn format_date_fr(datetime: &str) -> String {
    let Some(date) = datetime
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    else {
        return datetime.to_string();
    };

    format!(
        "{} {} {} {}",
        WEEKDAYS[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// One card scheduled to appear after `delay`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayEvent {
    pub index: usize,
    pub delay: Duration,
    pub card: RenderedCard,
}

/// Ordered reveal sequence: card `i` appears `i * stagger` after the first.
pub fn reveal_schedule(cards: Vec<RenderedCard>, stagger: Duration) -> Vec<DisplayEvent> {
    cards
        .into_iter()
        .enumerate()
        .map(|(index, card)| DisplayEvent {
            index,
            delay: stagger.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX)),
            card,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureDiff {
    pub max: i32,
    pub min: i32,
}

/// Differences between two days, all computed as `a - b`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub temperature_diff: TemperatureDiff,
    pub rain_probability_diff: i32,
    pub sun_hours_diff: f64,
    pub date1: String,
    pub date2: String,
}

pub fn compare(a: &ForecastDay, b: &ForecastDay) -> Comparison {
    Comparison {
        temperature_diff: TemperatureDiff {
            max: a.tmax - b.tmax,
            min: a.tmin - b.tmin,
        },
        rain_probability_diff: a.probarain - b.probarain,
        sun_hours_diff: a.sun_hours - b.sun_hours,
        date1: a.datetime.clone(),
        date2: b.datetime.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub label: &'static str,
    /// `"{a} vs {b}"` with units
    pub values: String,
    /// Signed difference with unit, e.g. `+2°C`
    pub diff: String,
    /// Whether the difference favours the first city
    pub favourable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonCard {
    pub title: String,
    pub rows: Vec<ComparisonRow>,
}

fn signed<T: std::fmt::Display + PartialOrd + Default>(value: T, unit: &str) -> String {
    if value > T::default() {
        format!("+{}{}", value, unit)
    } else {
        format!("{}{}", value, unit)
    }
}

/// Side-by-side rows for two cities' days.
pub fn comparison_rows(
    a: &ForecastDay,
    b: &ForecastDay,
    city1: &str,
    city2: &str,
) -> ComparisonCard {
    let cmp = compare(a, b);

    let rows = vec![
        ComparisonRow {
            label: "Température max",
            values: format!("{}°C vs {}°C", a.tmax, b.tmax),
            diff: signed(cmp.temperature_diff.max, "°C"),
            favourable: cmp.temperature_diff.max > 0,
        },
        ComparisonRow {
            label: "Température min",
            values: format!("{}°C vs {}°C", a.tmin, b.tmin),
            diff: signed(cmp.temperature_diff.min, "°C"),
            favourable: cmp.temperature_diff.min > 0,
        },
        ComparisonRow {
            label: "Probabilité de pluie",
            values: format!("{}% vs {}%", a.probarain, b.probarain),
            diff: signed(cmp.rain_probability_diff, "%"),
            favourable: cmp.rain_probability_diff < 0,
        },
        ComparisonRow {
            label: "Ensoleillement",
            values: format!("{}h vs {}h", a.sun_hours, b.sun_hours),
            diff: signed(round_one_decimal(cmp.sun_hours_diff), "h"),
            favourable: cmp.sun_hours_diff > 0.0,
        },
    ];

    ComparisonCard {
        title: format!("Comparaison: {} vs {}", city1, city2),
        rows,
    }
}
