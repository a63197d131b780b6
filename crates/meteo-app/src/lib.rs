//! Command-line front end for Instant Weather.

pub mod widget;

pub use widget::{city_feedback, days_display, WeatherWidget, WidgetState};
