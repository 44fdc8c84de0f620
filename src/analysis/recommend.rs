/// Flood hazard recommendation for a river forecast point.
///
/// Works from the point's observed and aggregate forecast hydrographs,
/// its NWS threshold ladder, and its period-of-record crest history:
///
/// 1. **Crests** — maximum of the observed series, maximum of the merged
///    forecast series, and the overall maximum across both (observed
///    wins ties, since it precedes the forecast in series order).
/// 2. **Stage crossings** — the first time the combined series rises to
///    flood stage and the last time it falls back below, linearly
///    interpolated between the bracketing readings.
/// 3. **Categorization** — flood category from the threshold ladder and
///    the record stage; record status from the record stage and the
///    configured near-record buffer.
/// 4. **Recommendation** — a hazard (warning / advisory / statement)
///    with an event window widened by the configured shift hours.
///
/// Points without an official threshold ladder yield no recommendation.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::RecommendationSettings;
use crate::dao::{CrestRecord, RiverForecastPoint};
use crate::hydrograph::Hydrograph;
use crate::model::ShefObservation;

// ---------------------------------------------------------------------------
// Derived attribute types
// ---------------------------------------------------------------------------

/// Flood category reached by the overall maximum stage, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FloodCategory {
    NonFlood,
    Minor,
    Moderate,
    Major,
    Record,
}

impl fmt::Display for FloodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloodCategory::NonFlood => write!(f, "non-flood"),
            FloodCategory::Minor => write!(f, "minor"),
            FloodCategory::Moderate => write!(f, "moderate"),
            FloodCategory::Major => write!(f, "major"),
            FloodCategory::Record => write!(f, "record"),
        }
    }
}

/// How the overall maximum compares to the period-of-record crest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FloodRecordStatus {
    NoRecord,
    NearRecord,
    NewRecordExpected,
}

impl fmt::Display for FloodRecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloodRecordStatus::NoRecord => write!(f, "no record"),
            FloodRecordStatus::NearRecord => write!(f, "near record"),
            FloodRecordStatus::NewRecordExpected => write!(f, "new record expected"),
        }
    }
}

/// The hazard this point should be considered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HazardType {
    FloodWarning,
    FloodAdvisory,
    HydrologicStatement,
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardType::FloodWarning => write!(f, "flood warning"),
            HazardType::FloodAdvisory => write!(f, "flood advisory"),
            HazardType::HydrologicStatement => write!(f, "hydrologic statement"),
        }
    }
}

/// Full recommendation for one forecast point.
#[derive(Debug, Clone, Serialize)]
pub struct FloodRecommendation {
    pub lid: String,
    pub hazard: HazardType,
    pub category: FloodCategory,
    pub record_status: FloodRecordStatus,
    pub observed_crest_ft: Option<f64>,
    pub observed_crest_time: Option<DateTime<Utc>>,
    pub forecast_crest_ft: Option<f64>,
    pub forecast_crest_time: Option<DateTime<Utc>>,
    /// Overall maximum across observed and forecast.
    pub max_stage_ft: f64,
    pub max_stage_time: DateTime<Utc>,
    /// First time the combined series reaches flood stage.
    pub rise_above_time: Option<DateTime<Utc>>,
    /// Last time the combined series drops back below flood stage.
    /// `None` when the series ends at or above flood stage.
    pub fall_below_time: Option<DateTime<Utc>>,
    /// Recommended event window, widened by the configured shift hours.
    /// `event_end` of `None` means open-ended (until further notice).
    pub event_start: DateTime<Utc>,
    pub event_end: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Attribute derivation
// ---------------------------------------------------------------------------

/// Flood category for a maximum stage against the threshold ladder and
/// the record stage. Boundaries are inclusive at each stage value.
pub fn flood_category(
    max_stage_ft: f64,
    thresholds: &crate::model::FloodThresholds,
    record_stage_ft: Option<f64>,
) -> FloodCategory {
    if let Some(record) = record_stage_ft {
        if max_stage_ft >= record {
            return FloodCategory::Record;
        }
    }
    if max_stage_ft >= thresholds.major_flood_stage_ft {
        FloodCategory::Major
    } else if max_stage_ft >= thresholds.moderate_flood_stage_ft {
        FloodCategory::Moderate
    } else if max_stage_ft >= thresholds.flood_stage_ft {
        FloodCategory::Minor
    } else {
        FloodCategory::NonFlood
    }
}

/// Record status for a maximum stage against the record stage.
pub fn record_status(
    max_stage_ft: f64,
    record_stage_ft: Option<f64>,
    near_record_buffer_ft: f64,
) -> FloodRecordStatus {
    let Some(record) = record_stage_ft else {
        return FloodRecordStatus::NoRecord;
    };
    if max_stage_ft >= record {
        FloodRecordStatus::NewRecordExpected
    } else if max_stage_ft >= record - near_record_buffer_ft {
        FloodRecordStatus::NearRecord
    } else {
        FloodRecordStatus::NoRecord
    }
}

/// Finds the first rise to `stage` and the last fall below it in a
/// time-ordered series. Crossing times are linearly interpolated between
/// the bracketing readings; a series that starts at or above the stage
/// rises at its first reading, and a series that ends at or above it
/// reports no fall.
pub fn stage_crossings(
    series: &[ShefObservation],
    stage: f64,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let Some(first) = series.first() else {
        return (None, None);
    };

    let mut rise = if first.value >= stage {
        Some(first.valid_time)
    } else {
        None
    };
    let mut fall = None;

    for pair in series.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if rise.is_none() && prev.value < stage && curr.value >= stage {
            rise = Some(interpolate_crossing(prev, curr, stage));
        }
        if prev.value >= stage && curr.value < stage {
            fall = Some(interpolate_crossing(prev, curr, stage));
        }
    }

    // A series ending at or above the stage has not yet fallen below it.
    if series.last().map(|o| o.value >= stage).unwrap_or(false) {
        fall = None;
    }

    (rise, fall)
}

fn interpolate_crossing(
    prev: &ShefObservation,
    curr: &ShefObservation,
    stage: f64,
) -> DateTime<Utc> {
    let span_ms = (curr.valid_time - prev.valid_time).num_milliseconds();
    if span_ms <= 0 {
        return curr.valid_time;
    }
    let fraction = (stage - prev.value) / (curr.value - prev.value);
    prev.valid_time + Duration::milliseconds((fraction * span_ms as f64).round() as i64)
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// Builds the recommendation for one forecast point, or `None` when the
/// point has no threshold ladder, no data, or (unless configured
/// otherwise) never reaches action stage.
pub fn recommend(
    point: &RiverForecastPoint,
    observed: &Hydrograph,
    forecast: &Hydrograph,
    crests: &[CrestRecord],
    settings: &RecommendationSettings,
) -> Option<FloodRecommendation> {
    let Some(thresholds) = point.thresholds.as_ref() else {
        debug!(lid = %point.lid, "no threshold ladder; skipping recommendation");
        return None;
    };

    // Combined series: observed first, then forecast; stable sort keeps
    // observed ahead of forecast at equal valid times, so observed wins
    // max ties.
    let mut combined: Vec<ShefObservation> = Vec::with_capacity(observed.len() + forecast.len());
    combined.extend_from_slice(observed.observations());
    combined.extend_from_slice(forecast.observations());
    combined.sort_by_key(|o| o.valid_time);

    if combined.is_empty() {
        debug!(lid = %point.lid, "no observed or forecast data; skipping recommendation");
        return None;
    }

    let mut max = &combined[0];
    for obs in &combined[1..] {
        if obs.value > max.value {
            max = obs;
        }
    }
    let max_stage_ft = max.value;
    let max_stage_time = max.valid_time;

    let observed_crest = if observed.is_empty() {
        None
    } else {
        observed.max_observation()
    };
    let forecast_crest = if forecast.is_empty() {
        None
    } else {
        forecast.max_observation()
    };

    // Crest history arrives highest stage first; fold anyway so the
    // result does not depend on DAO ordering.
    let record_stage_ft = crests
        .iter()
        .map(|c| c.stage_ft)
        .fold(None::<f64>, |acc, s| match acc {
            Some(best) if best >= s => Some(best),
            _ => Some(s),
        });

    let category = flood_category(max_stage_ft, thresholds, record_stage_ft);
    let status = record_status(
        max_stage_ft,
        record_stage_ft,
        settings.near_record_buffer_ft,
    );

    let hazard = if category >= FloodCategory::Minor {
        HazardType::FloodWarning
    } else if max_stage_ft >= thresholds.action_stage_ft {
        HazardType::FloodAdvisory
    } else if settings.include_nonflood_points {
        HazardType::HydrologicStatement
    } else {
        return None;
    };

    let (rise_above_time, fall_below_time) =
        stage_crossings(&combined, thresholds.flood_stage_ft);

    let shift = Duration::hours(settings.shift_hours);
    let event_start = rise_above_time.unwrap_or(max_stage_time) - shift;
    let event_end = fall_below_time.map(|t| t + shift);

    Some(FloodRecommendation {
        lid: point.lid.clone(),
        hazard,
        category,
        record_status: status,
        observed_crest_ft: observed_crest.as_ref().map(|o| o.value),
        observed_crest_time: observed_crest.as_ref().map(|o| o.valid_time),
        forecast_crest_ft: forecast_crest.as_ref().map(|o| o.value),
        forecast_crest_time: forecast_crest.as_ref().map(|o| o.valid_time),
        max_stage_ft,
        max_stage_time,
        rise_above_time,
        fall_below_time,
        event_start,
        event_end,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
