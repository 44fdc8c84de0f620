//! Hydrograph Inspection
//!
//! Dumps the assembled hydrograph for one forecast point: either the
//! observed window or the merged multi-run forecast series. Useful for
//! checking what the basis-time merge actually kept before trusting a
//! recommendation.
//!
//! Usage:
//!   cargo run --bin show_hydrograph -- PIAI2
//!   cargo run --bin show_hydrograph -- PIAI2 --forecast
//!   cargo run --bin show_hydrograph -- PIAI2 --forecast --latest-only
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string

use chrono::{Duration, Utc};
use std::env;

use hydrograph_service::config;
use hydrograph_service::dao::postgres::PostgresFloodDao;
use hydrograph_service::dao::FloodDao;
use hydrograph_service::db;
use hydrograph_service::hydrograph::Hydrograph;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let lid = match args.get(1) {
        Some(lid) if !lid.starts_with("--") => lid.clone(),
        _ => {
            eprintln!("Usage: show_hydrograph <lid> [--forecast] [--latest-only]");
            std::process::exit(1);
        }
    };
    let forecast_mode = args.contains(&"--forecast".to_string());
    let latest_only = args.contains(&"--latest-only".to_string());

    let settings = config::load_settings();

    let client = db::connect_and_verify(&["hydro"]).unwrap_or_else(|e| {
        eprintln!("\n{}\n", e);
        std::process::exit(1);
    });
    let mut dao = PostgresFloodDao::new(client);

    let point = dao.forecast_point(&lid)?;
    println!("🌊 {} — {}", point.lid, point.name);

    let now = Utc::now();
    let hydrograph = if forecast_mode {
        let end_valid = now + Duration::hours(settings.query.forecast_horizon_hours);
        let basis_floor = now - Duration::hours(settings.query.basis_lookback_hours);
        let use_latest =
            latest_only || settings.query.use_latest_forecast_only || point.use_latest_forecast;
        Hydrograph::load_forecast(
            &mut dao,
            &point.lid,
            &point.primary_pe,
            &point.forecast_ts,
            end_valid,
            basis_floor,
            use_latest,
        )?
    } else {
        let begin = now - Duration::hours(settings.query.observed_lookback_hours);
        Hydrograph::load_observed(
            &mut dao,
            &point.lid,
            &point.primary_pe,
            &point.observed_ts,
            begin,
            now,
        )?
    };

    if hydrograph.is_empty() {
        println!("  (no readings in window)");
        return Ok(());
    }

    println!(
        "  {} readings ({} {})\n",
        hydrograph.len(),
        hydrograph.physical_element(),
        hydrograph.type_source()
    );
    println!("  valid time            value      basis time");
    println!("  ----------------      -------    ----------------");
    for obs in hydrograph.observations() {
        match obs.basis_time {
            Some(basis) => println!(
                "  {}   {:8.2}    {}",
                obs.valid_time.format("%Y-%m-%d %H:%M"),
                obs.value,
                basis.format("%Y-%m-%d %H:%M")
            ),
            None => println!(
                "  {}   {:8.2}",
                obs.valid_time.format("%Y-%m-%d %H:%M"),
                obs.value
            ),
        }
    }

    if let Some(max) = hydrograph.max_observation() {
        println!(
            "\n  max: {:.2} at {}",
            max.value,
            max.valid_time.format("%Y-%m-%d %H:%M UTC")
        );
    }

    Ok(())
}
