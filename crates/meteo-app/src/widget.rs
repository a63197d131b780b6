//! Weather widget controller: the form flow without any rendering.
//!
//! The view reads [`WidgetState`] after each call; every failure lands in
//! `state.error` already passed through the classifier.

use std::sync::Arc;

use meteo_core::{classify, MeteoError};
use meteo_weather::{
    format_many, is_valid_postal_code, sanitize_postal_code, City, MeteoService, OptionTag,
    RenderedCard, MAX_DAYS, MIN_DAYS,
};
use serde::Serialize;

/// Everything the view needs to draw the form and the results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WidgetState {
    pub postal_code: String,
    pub cities: Vec<City>,
    pub selected_city: Option<String>,
    pub days: u8,
    pub city_list_visible: bool,
    pub feedback: Option<String>,
    pub error: Option<String>,
    pub cards: Vec<RenderedCard>,
    pub loading: bool,
}

impl WidgetState {
    pub fn submit_enabled(&self) -> bool {
        !self.loading && self.selected_city.is_some()
    }

    pub fn days_display(&self) -> String {
        days_display(self.days)
    }
}

pub fn days_display(days: u8) -> String {
    format!("{} jour(s)", days)
}

/// `"1 commune trouvée ..."` / `"3 communes trouvées ..."`
pub fn city_feedback(count: usize) -> String {
    let plural = if count > 1 { "s" } else { "" };
    format!(
        "{} commune{} trouvée{} pour ce code postal",
        count, plural, plural
    )
}

pub struct WeatherWidget {
    service: Arc<MeteoService>,
    state: WidgetState,
}

impl WeatherWidget {
    pub fn new(service: Arc<MeteoService>, default_days: u8) -> Self {
        Self {
            service,
            state: WidgetState {
                days: default_days.clamp(MIN_DAYS, MAX_DAYS),
                ..WidgetState::default()
            },
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    /// Handle a (debounced) change of the postal code field.
    pub async fn on_postal_code_input(&mut self, raw: &str) {
        let postal_code = sanitize_postal_code(raw);
        tracing::debug!("Postal code input: {}", postal_code);
        self.state.postal_code = postal_code.clone();

        if !is_valid_postal_code(&postal_code) {
            self.hide_city_list();
            return;
        }

        self.state.loading = true;
        let result = self.service.search_cities_by_postal_code(&postal_code).await;
        self.state.loading = false;

        match result {
            Ok(cities) => {
                self.state.feedback = Some(city_feedback(cities.len()));
                self.state.cities = cities;
                self.state.selected_city = None;
                self.state.city_list_visible = true;
                self.state.error = None;
            }
            Err(e) => {
                tracing::error!("City search failed: {}", e);
                self.state.error = Some(e.user_message());
                self.hide_city_list();
            }
        }
    }

    fn hide_city_list(&mut self) {
        self.state.cities.clear();
        self.state.selected_city = None;
        self.state.city_list_visible = false;
        self.state.feedback = None;
    }

    /// Select a commune by INSEE code. An empty or unlisted code clears the selection.
    pub fn select_city(&mut self, code: &str) -> bool {
        let known = self.state.cities.iter().any(|c| c.code == code);
        self.state.selected_city = known.then(|| code.to_string());
        tracing::debug!("City selected: {:?}", self.state.selected_city);
        known
    }

    /// Select by position in the list, as the CLI does.
    pub fn select_city_at(&mut self, index: usize) -> bool {
        match self.state.cities.get(index).map(|c| c.code.clone()) {
            Some(code) => self.select_city(&code),
            None => false,
        }
    }

    /// Change the day count. Out-of-range values are ignored.
    pub fn select_days(&mut self, days: u8) -> bool {
        if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
            return false;
        }
        self.state.days = days;
        true
    }

    /// Validate the form, fetch the forecast and format the cards.
    pub async fn submit(&mut self, options: &[OptionTag]) -> bool {
        self.state.loading = true;
        let result = self.fetch_cards(options).await;
        self.state.loading = false;

        match result {
            Ok(cards) => {
                self.state.cards = cards;
                self.state.error = None;
                true
            }
            Err(message) => {
                self.state.error = Some(message);
                false
            }
        }
    }

    async fn fetch_cards(&self, options: &[OptionTag]) -> Result<Vec<RenderedCard>, String> {
        if !is_valid_postal_code(&self.state.postal_code) {
            return Err(classify("Code postal invalide"));
        }
        let Some(code) = self.state.selected_city.as_deref() else {
            return Err(classify("Veuillez sélectionner une ville valide"));
        };

        let days = self
            .service
            .get_weather_forecast(code, self.state.days)
            .await
            .map_err(|e: MeteoError| e.user_message())?;

        Ok(format_many(&days, options))
    }
}
