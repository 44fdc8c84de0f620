/// Service settings loader - parses settings.toml
///
/// Separates query-window and recommendation tuning from code, making it
/// easy to widen lookback windows, adjust shift hours, or change the
/// near-record buffer without recompiling the service.

use serde::Deserialize;
use std::fs;

/// Settings controlling how hydrographs are queried from the database.
#[derive(Debug, Clone, Deserialize)]
pub struct QuerySettings {
    /// How far back from "now" the observed window begins, in hours.
    pub observed_lookback_hours: i64,

    /// How far forward from "now" forecast valid times are accepted, in hours.
    pub forecast_horizon_hours: i64,

    /// How far back from "now" forecast basis (issuance) times are
    /// accepted, in hours. Runs issued before this floor are ignored.
    pub basis_lookback_hours: i64,

    /// When true, only the most recently issued forecast run is used and
    /// the basis-time merge is skipped entirely.
    pub use_latest_forecast_only: bool,
}

/// Settings controlling hazard recommendation output.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationSettings {
    /// Hours subtracted from the rise-above time (and added to the
    /// fall-below time) when framing a recommended event window.
    pub shift_hours: i64,

    /// A maximum stage within this many feet below the period-of-record
    /// crest reports NearRecord status.
    pub near_record_buffer_ft: f64,

    /// When true, points below action stage still receive a
    /// HydrologicStatement recommendation instead of none.
    pub include_nonflood_points: bool,
}

/// Root settings structure for TOML parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub query: QuerySettings,
    pub recommendation: RecommendationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            query: QuerySettings {
                observed_lookback_hours: 72,
                forecast_horizon_hours: 336,
                basis_lookback_hours: 72,
                use_latest_forecast_only: false,
            },
            recommendation: RecommendationSettings {
                shift_hours: 6,
                near_record_buffer_ft: 0.5,
                include_nonflood_points: false,
            },
        }
    }
}

/// Loads service settings from settings.toml.
///
/// # Panics
/// Panics if the settings file is missing, malformed, or contains invalid
/// data. This is intentional — the service cannot operate without valid
/// query windows.
///
/// # File Location
/// Expects `settings.toml` in the current working directory (project root
/// when running via `cargo run`).
pub fn load_settings() -> Settings {
    let settings_path = "settings.toml";

    let contents = fs::read_to_string(settings_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", settings_path, e));

    parse_settings(&contents)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", settings_path, e))
}

/// Parses settings from a TOML string. Split out from `load_settings` so
/// malformed-input handling can be tested without touching the filesystem.
pub fn parse_settings(contents: &str) -> Result<Settings, toml::de::Error> {
    let settings: Settings = toml::from_str(contents)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_settings_from_shipped_file() {
        let settings = load_settings();
        assert!(settings.query.observed_lookback_hours > 0);
        assert!(settings.query.forecast_horizon_hours > 0);
        assert!(settings.query.basis_lookback_hours > 0);
    }

    #[test]
    fn test_parse_settings_reads_all_sections() {
        let toml_str = r#"
            [query]
            observed_lookback_hours = 48
            forecast_horizon_hours = 240
            basis_lookback_hours = 24
            use_latest_forecast_only = true

            [recommendation]
            shift_hours = 3
            near_record_buffer_ft = 1.0
            include_nonflood_points = true
        "#;
        let settings = parse_settings(toml_str).expect("valid settings should parse");
        assert_eq!(settings.query.observed_lookback_hours, 48);
        assert_eq!(settings.query.forecast_horizon_hours, 240);
        assert_eq!(settings.query.basis_lookback_hours, 24);
        assert!(settings.query.use_latest_forecast_only);
        assert_eq!(settings.recommendation.shift_hours, 3);
        assert_eq!(settings.recommendation.near_record_buffer_ft, 1.0);
        assert!(settings.recommendation.include_nonflood_points);
    }

    #[test]
    fn test_parse_settings_rejects_missing_section() {
        let toml_str = r#"
            [query]
            observed_lookback_hours = 48
            forecast_horizon_hours = 240
            basis_lookback_hours = 24
            use_latest_forecast_only = false
        "#;
        assert!(
            parse_settings(toml_str).is_err(),
            "settings without a [recommendation] section must not parse"
        );
    }

    #[test]
    fn test_default_settings_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.query.observed_lookback_hours, 72);
        assert_eq!(settings.query.basis_lookback_hours, 72);
        assert!(!settings.query.use_latest_forecast_only);
        assert!(settings.recommendation.near_record_buffer_ft > 0.0);
    }

    #[test]
    fn test_shipped_file_matches_defaults() {
        // settings.toml ships with the documented defaults; drift between
        // the file and Default would make test behavior diverge from a
        // fresh checkout's runtime behavior.
        let shipped = load_settings();
        let defaults = Settings::default();
        assert_eq!(
            shipped.query.observed_lookback_hours,
            defaults.query.observed_lookback_hours
        );
        assert_eq!(
            shipped.recommendation.shift_hours,
            defaults.recommendation.shift_hours
        );
    }
}
