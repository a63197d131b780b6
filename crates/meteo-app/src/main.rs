use anyhow::{bail, Context, Result};
use std::sync::Arc;

use meteo_app::WeatherWidget;
use meteo_weather::{reveal_schedule, MeteoService, OptionTag, RenderedCard};

const USAGE: &str = "usage: instant-weather <postal-code> [days] [city-index] [options...]";

struct Args {
    postal_code: String,
    days: Option<u8>,
    city_index: usize,
    options: Vec<OptionTag>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let Some(postal_code) = args.next() else {
        bail!(USAGE);
    };
    let days = args
        .next()
        .map(|d| d.parse::<u8>().with_context(|| format!("invalid day count: {}", d)))
        .transpose()?;
    let city_index = args
        .next()
        .map(|i| i.parse::<usize>().with_context(|| format!("invalid city index: {}", i)))
        .transpose()?
        .unwrap_or(0);
    let options = OptionTag::parse_all(args);

    Ok(Args {
        postal_code,
        days,
        city_index,
        options,
    })
}

fn print_card(card: &RenderedCard) {
    println!();
    println!("{}", card.formatted_date);
    println!("  {} ({})", card.description, card.icon);
    println!("  {}°C / {}°C", card.tmax, card.tmin);
    for detail in card.base_details.iter().chain(card.optional_details.iter()) {
        println!("  {}: {}", detail.label, detail.value);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    meteo_core::init()?;

    let args = parse_args()?;
    let mut app = meteo_core::App::new()?;
    let config = app.shared_config();
    tracing::info!("Instant Weather started (theme: {})", app.preferences().theme());

    let service = Arc::new(MeteoService::new(&config.api, &config.cache));
    service.clear_cache().await;
    let sweeper = service.spawn_cache_sweeper(config.cache.sweep_interval());

    let report = service.test_api_connections().await;
    tracing::info!("API connections: {:?}", report);

    let mut widget = WeatherWidget::new(service.clone(), config.ui.default_days);
    if let Some(days) = args.days {
        if !widget.select_days(days) {
            tracing::warn!("Ignoring day count {}", days);
        }
    }

    widget.on_postal_code_input(&args.postal_code).await;
    if let Some(feedback) = &widget.state().feedback {
        println!("{}", feedback);
    }
    for (i, city) in widget.state().cities.iter().enumerate() {
        println!("  [{}] {}", i, city.display_name);
    }
    widget.select_city_at(args.city_index);

    println!("Prévisions sur {}", widget.state().days_display());
    widget.submit(&args.options).await;

    if let Some(error) = &widget.state().error {
        eprintln!("{}", error);
    } else {
        let events = reveal_schedule(widget.state().cards.clone(), config.ui.card_stagger());
        let start = tokio::time::Instant::now();
        for event in events {
            tokio::time::sleep_until(start + event.delay).await;
            print_card(&event.card);
        }
    }

    sweeper.abort();
    app.shutdown()?;

    Ok(())
}
