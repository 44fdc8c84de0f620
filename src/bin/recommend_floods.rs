//! Flood Hazard Recommendation
//!
//! Builds observed and aggregate forecast hydrographs for every river
//! forecast point, then derives the hazard attributes and recommendation
//! for each: crests, flood-stage crossings, flood category, record
//! status, and the recommended event window.
//!
//! Usage:
//!   cargo run --bin recommend_floods
//!
//! Options:
//!   --lid LID     Only process the given forecast point
//!   --json        Emit recommendations as a JSON array instead of text
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string

use chrono::{Duration, Utc};
use std::env;

use hydrograph_service::analysis::recommend::{recommend, FloodRecommendation};
use hydrograph_service::config;
use hydrograph_service::dao::postgres::PostgresFloodDao;
use hydrograph_service::dao::FloodDao;
use hydrograph_service::db;
use hydrograph_service::hydrograph::Hydrograph;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Parse arguments
    let args: Vec<String> = env::args().collect();
    let lid_filter = args
        .iter()
        .position(|a| a == "--lid")
        .and_then(|i| args.get(i + 1))
        .cloned();
    let json_output = args.contains(&"--json".to_string());

    if !json_output {
        println!("🌊 Flood Hazard Recommendation");
        println!("==============================\n");
    }

    let settings = config::load_settings();

    // Connect to database with validation
    let client = db::connect_and_verify(&["hydro"]).unwrap_or_else(|e| {
        eprintln!("\n{}\n", e);
        std::process::exit(1);
    });
    let mut dao = PostgresFloodDao::new(client);

    let mut points = dao.forecast_points()?;
    if let Some(lid) = &lid_filter {
        points.retain(|p| &p.lid == lid);
        if points.is_empty() {
            eprintln!("No forecast point with lid '{}'", lid);
            std::process::exit(1);
        }
    }
    if !json_output {
        println!("✓ Loaded {} forecast points\n", points.len());
    }

    let now = Utc::now();
    let observed_begin = now - Duration::hours(settings.query.observed_lookback_hours);
    let end_valid = now + Duration::hours(settings.query.forecast_horizon_hours);
    let basis_floor = now - Duration::hours(settings.query.basis_lookback_hours);

    let mut recommendations: Vec<FloodRecommendation> = Vec::new();
    let mut skipped = 0;
    let mut errors = 0;

    for point in &points {
        let observed = match Hydrograph::load_observed(
            &mut dao,
            &point.lid,
            &point.primary_pe,
            &point.observed_ts,
            observed_begin,
            now,
        ) {
            Ok(h) => h,
            Err(e) => {
                eprintln!("  ✗ {}: observed load failed: {}", point.lid, e);
                errors += 1;
                continue;
            }
        };

        let use_latest = settings.query.use_latest_forecast_only || point.use_latest_forecast;
        let forecast = match Hydrograph::load_forecast(
            &mut dao,
            &point.lid,
            &point.primary_pe,
            &point.forecast_ts,
            end_valid,
            basis_floor,
            use_latest,
        ) {
            Ok(h) => h,
            Err(e) => {
                eprintln!("  ✗ {}: forecast load failed: {}", point.lid, e);
                errors += 1;
                continue;
            }
        };

        let crests = match dao.crest_history(&point.lid) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("  ✗ {}: crest history load failed: {}", point.lid, e);
                errors += 1;
                continue;
            }
        };

        match recommend(
            point,
            &observed,
            &forecast,
            &crests,
            &settings.recommendation,
        ) {
            Some(rec) => {
                if !json_output {
                    print_recommendation(&rec, &point.name);
                }
                recommendations.push(rec);
            }
            None => skipped += 1,
        }
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        println!("{}", "=".repeat(50));
        println!("Summary:");
        println!("  Recommendations: {}", recommendations.len());
        println!("  No hazard: {}", skipped);
        println!("  Errors: {}", errors);
        println!("{}", "=".repeat(50));
    }

    Ok(())
}

fn print_recommendation(rec: &FloodRecommendation, name: &str) {
    println!("▲ {} — {}", rec.lid, name);
    println!("  hazard:   {}", rec.hazard);
    println!("  category: {} ({})", rec.category, rec.record_status);
    println!(
        "  max:      {:.2} ft at {}",
        rec.max_stage_ft,
        rec.max_stage_time.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(t) = rec.rise_above_time {
        println!("  rises above flood stage: {}", t.format("%Y-%m-%d %H:%M UTC"));
    }
    match rec.fall_below_time {
        Some(t) => println!("  falls below flood stage: {}", t.format("%Y-%m-%d %H:%M UTC")),
        None => println!("  falls below flood stage: not within forecast horizon"),
    }
    match rec.event_end {
        Some(end) => println!(
            "  window:   {} → {}",
            rec.event_start.format("%Y-%m-%d %H:%M UTC"),
            end.format("%Y-%m-%d %H:%M UTC")
        ),
        None => println!(
            "  window:   {} → until further notice",
            rec.event_start.format("%Y-%m-%d %H:%M UTC")
        ),
    }
    println!();
}
