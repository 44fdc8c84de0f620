/// Core data types for the river forecast hydrograph service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic, no I/O, and no external dependencies — only types
/// and the SHEF constants that give them meaning.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// SHEF codes and sentinels
// ---------------------------------------------------------------------------

/// SHEF physical element for river stage (gage height), in feet.
pub const PE_STAGE: &str = "HG";

/// SHEF physical element for river discharge, in cubic feet per second.
pub const PE_DISCHARGE: &str = "QR";

/// Default SHEF type-source for observed river readings.
pub const TS_OBSERVED: &str = "RG";

/// Default SHEF type-source for forecast river readings.
pub const TS_FORECAST: &str = "FF";

/// SHEF extremum code for an instantaneous (non-extremum) value.
pub const EXTREMUM_NONE: &str = "Z";

/// Probability carried by non-probabilistic data.
pub const PROBABILITY_NONE: f64 = -1.0;

/// Sentinel stored in the hydro database when a value is missing.
/// Rows carrying this value are never valid readings and must be
/// screened out during loading.
pub const MISSING_VALUE: f64 = -9999.0;

/// Quality-code floor for usable observed data. Codes below this value
/// mark the reading as questionable or bad; such rows are dropped by the
/// observed loader.
pub const QUESTIONABLE_BAD_THRESHOLD: i64 = 1_073_741_824;

/// Default quality code assigned to data that has passed no explicit QC.
pub const DEFAULT_QUALITY_CODE: i64 = 1_879_048_191;

// ---------------------------------------------------------------------------
// Observation type
// ---------------------------------------------------------------------------

/// A single SHEF-typed hydrologic datum for one station.
///
/// Covers both observed and forecast readings: `basis_time` is `Some` for
/// forecast rows (the time the forecast run was issued) and `None` for
/// observations. Instances are immutable once loaded; `Hydrograph`
/// clones one out when reporting a maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct ShefObservation {
    /// Station identifier (NWS location id, e.g. "PIAI2").
    pub lid: String,
    /// SHEF physical element code, e.g. "HG".
    pub physical_element: String,
    /// SHEF duration code (0 = instantaneous).
    pub duration: i32,
    /// SHEF type-source code, e.g. "RG" observed, "FF" forecast.
    pub type_source: String,
    /// SHEF extremum code, "Z" for none.
    pub extremum: String,
    /// Forecast probability; `PROBABILITY_NONE` when not probabilistic.
    pub probability: f64,
    /// The measured or forecast value, in the element's native unit.
    pub value: f64,
    /// Time the value is valid for.
    pub valid_time: DateTime<Utc>,
    /// Issuance time of the forecast run this row belongs to.
    /// `None` for observed data.
    pub basis_time: Option<DateTime<Utc>>,
    /// Quality code; see `QUESTIONABLE_BAD_THRESHOLD`.
    pub quality_code: i64,
}

impl ShefObservation {
    /// True if the quality code marks this reading as usable.
    pub fn passes_quality_check(&self) -> bool {
        self.quality_code >= QUESTIONABLE_BAD_THRESHOLD
    }

    /// True if the value is the missing-data sentinel.
    pub fn is_missing(&self) -> bool {
        (self.value - MISSING_VALUE).abs() < 0.1
    }
}

// ---------------------------------------------------------------------------
// Threshold types
// ---------------------------------------------------------------------------

/// Official NWS flood stage thresholds for a forecast point, in feet.
///
/// Stage levels in ascending order:
///   action < flood < moderate_flood < major_flood
#[derive(Debug, Clone, PartialEq)]
pub struct FloodThresholds {
    pub action_stage_ft: f64,
    pub flood_stage_ft: f64,
    pub moderate_flood_stage_ft: f64,
    pub major_flood_stage_ft: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
