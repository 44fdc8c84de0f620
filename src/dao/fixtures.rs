/// Test fixtures: a deterministic in-memory `FloodDao`.
///
/// `FixtureDao` answers the same questions as the hydro schema but from
/// vectors built in code, so loader and recommendation behavior can be
/// exercised without a database. The canned scenarios are small but
/// structurally complete: SHEF-coded rows, multiple forecast runs with
/// overlapping valid-time spans, thresholds, and crest history.
///
/// Times in the canned scenarios are anchored at 2024-05-01 12:00 UTC
/// ("now" for the scenario) so assertions can be written against fixed
/// offsets rather than the wall clock.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::dao::{CrestRecord, DaoError, FloodDao, RiverForecastPoint};
use crate::model::{
    FloodThresholds, ShefObservation, DEFAULT_QUALITY_CODE, EXTREMUM_NONE, PE_STAGE,
    PROBABILITY_NONE, TS_FORECAST, TS_OBSERVED,
};

/// Anchor time for the canned scenarios.
pub fn scenario_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// In-memory DAO
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FixtureDao {
    points: Vec<RiverForecastPoint>,
    observed: Vec<ShefObservation>,
    forecast: Vec<ShefObservation>,
    crests: Vec<CrestRecord>,
}

impl FixtureDao {
    pub fn new() -> Self {
        FixtureDao::default()
    }

    pub fn add_point(&mut self, point: RiverForecastPoint) {
        self.points.push(point);
    }

    pub fn add_observed(&mut self, obs: ShefObservation) {
        self.observed.push(obs);
    }

    pub fn add_forecast(&mut self, fcst: ShefObservation) {
        self.forecast.push(fcst);
    }

    pub fn add_crest(&mut self, crest: CrestRecord) {
        self.crests.push(crest);
    }
}

impl FloodDao for FixtureDao {
    fn forecast_points(&mut self) -> Result<Vec<RiverForecastPoint>, DaoError> {
        let mut points = self.points.clone();
        points.sort_by(|a, b| a.lid.cmp(&b.lid));
        Ok(points)
    }

    fn forecast_point(&mut self, lid: &str) -> Result<RiverForecastPoint, DaoError> {
        self.points
            .iter()
            .find(|p| p.lid == lid)
            .cloned()
            .ok_or_else(|| DaoError::UnknownForecastPoint(lid.to_string()))
    }

    fn observed_readings(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ShefObservation>, DaoError> {
        let mut rows: Vec<ShefObservation> = self
            .observed
            .iter()
            .filter(|o| {
                o.lid == lid
                    && o.physical_element == pe
                    && o.type_source == ts
                    && o.valid_time >= begin
                    && o.valid_time <= end
            })
            .cloned()
            .collect();
        rows.sort_by_key(|o| o.valid_time);
        Ok(rows)
    }

    fn forecast_basis_times(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        basis_floor: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, DaoError> {
        let mut times: Vec<DateTime<Utc>> = self
            .forecast
            .iter()
            .filter(|o| o.lid == lid && o.physical_element == pe && o.type_source == ts)
            .filter_map(|o| o.basis_time)
            .filter(|b| *b >= basis_floor)
            .collect();
        times.sort();
        times.dedup();
        times.reverse();
        Ok(times)
    }

    fn forecast_readings(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        end_valid: DateTime<Utc>,
        basis_floor: DateTime<Utc>,
    ) -> Result<Vec<ShefObservation>, DaoError> {
        let mut rows: Vec<ShefObservation> = self
            .forecast
            .iter()
            .filter(|o| {
                o.lid == lid
                    && o.physical_element == pe
                    && o.type_source == ts
                    && o.valid_time <= end_valid
                    && o.basis_time.is_some_and(|b| b >= basis_floor)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|o| o.valid_time);
        Ok(rows)
    }

    fn crest_history(&mut self, lid: &str) -> Result<Vec<CrestRecord>, DaoError> {
        let mut crests: Vec<CrestRecord> = self
            .crests
            .iter()
            .filter(|c| c.lid == lid)
            .cloned()
            .collect();
        crests.sort_by(|a, b| b.stage_ft.total_cmp(&a.stage_ft));
        Ok(crests)
    }
}

// ---------------------------------------------------------------------------
// Row builders
// ---------------------------------------------------------------------------

/// An observed stage reading with default SHEF codes and passing quality.
pub fn observed_stage(lid: &str, value: f64, valid_time: DateTime<Utc>) -> ShefObservation {
    ShefObservation {
        lid: lid.to_string(),
        physical_element: PE_STAGE.to_string(),
        duration: 0,
        type_source: TS_OBSERVED.to_string(),
        extremum: EXTREMUM_NONE.to_string(),
        probability: PROBABILITY_NONE,
        value,
        valid_time,
        basis_time: None,
        quality_code: DEFAULT_QUALITY_CODE,
    }
}

/// A forecast stage reading belonging to the run issued at `basis_time`.
pub fn forecast_stage(
    lid: &str,
    value: f64,
    valid_time: DateTime<Utc>,
    basis_time: DateTime<Utc>,
) -> ShefObservation {
    ShefObservation {
        lid: lid.to_string(),
        physical_element: PE_STAGE.to_string(),
        duration: 0,
        type_source: TS_FORECAST.to_string(),
        extremum: EXTREMUM_NONE.to_string(),
        probability: PROBABILITY_NONE,
        value,
        valid_time,
        basis_time: Some(basis_time),
        quality_code: DEFAULT_QUALITY_CODE,
    }
}

// ---------------------------------------------------------------------------
// Canned scenarios
// ---------------------------------------------------------------------------

/// Peoria forecast point with the Kingston Mines threshold ladder.
pub fn peoria_point() -> RiverForecastPoint {
    RiverForecastPoint {
        lid: "PIAI2".to_string(),
        name: "Illinois River at Peoria, IL".to_string(),
        latitude: 40.6939,
        longitude: -89.5898,
        primary_pe: PE_STAGE.to_string(),
        observed_ts: TS_OBSERVED.to_string(),
        forecast_ts: TS_FORECAST.to_string(),
        use_latest_forecast: false,
        thresholds: Some(FloodThresholds {
            action_stage_ft: 14.0,
            flood_stage_ft: 16.0,
            moderate_flood_stage_ft: 20.0,
            major_flood_stage_ft: 24.0,
        }),
    }
}

/// Tributary point with no official thresholds — exercises the
/// no-recommendation path.
pub fn mackinaw_point() -> RiverForecastPoint {
    RiverForecastPoint {
        lid: "GNVI2".to_string(),
        name: "Mackinaw River near Green Valley, IL".to_string(),
        latitude: 40.7050,
        longitude: -89.6480,
        primary_pe: PE_STAGE.to_string(),
        observed_ts: TS_OBSERVED.to_string(),
        forecast_ts: TS_FORECAST.to_string(),
        use_latest_forecast: false,
        thresholds: None,
    }
}

/// A full flood event at Peoria:
///
/// - Observed (hourly, T-6h .. T0): steady rise from 13.0 ft through
///   action stage (14.0) to 15.8 ft — still below flood stage.
/// - Forecast run issued T-6h: valid T0 .. T+72h in 6h steps, cresting
///   21.2 ft at T+36h and falling back below flood stage by T+72h.
/// - Forecast run issued T0 (newer): valid T0 .. T+48h, same shape but
///   slightly higher. Overlaps the older run; the merge must prefer it
///   and clip the older run to the T+48h..T+72h remainder.
/// - Crest history: record 28.9 ft (1943), plus a lower 26.0 ft crest.
///
/// Expected outcome: Moderate category (merged crest 21.3 at or above
/// 20.0), NoRecord status, FloodWarning recommendation.
pub fn peoria_flood_scenario() -> FixtureDao {
    let now = scenario_now();
    let mut dao = FixtureDao::new();
    dao.add_point(peoria_point());
    dao.add_point(mackinaw_point());

    // Observed rise, hourly.
    for (hours_ago, stage) in [(6, 13.0), (5, 13.8), (4, 14.4), (3, 14.9), (2, 15.3), (1, 15.6)] {
        dao.add_observed(observed_stage(
            "PIAI2",
            stage,
            now - Duration::hours(hours_ago),
        ));
    }
    dao.add_observed(observed_stage("PIAI2", 15.8, now));

    // Older run, issued six hours ago: full horizon out to T+72h.
    let old_basis = now - Duration::hours(6);
    for (hours_ahead, stage) in [
        (0, 15.9),
        (6, 16.8),
        (12, 18.0),
        (18, 19.2),
        (24, 20.2),
        (30, 20.9),
        (36, 21.2),
        (42, 20.8),
        (48, 20.0),
        (54, 19.0),
        (60, 17.5),
        (66, 16.5),
        (72, 15.5),
    ] {
        dao.add_forecast(forecast_stage(
            "PIAI2",
            stage,
            now + Duration::hours(hours_ahead),
            old_basis,
        ));
    }

    // Newer run, issued now: shorter horizon, slightly higher crest.
    for (hours_ahead, stage) in [
        (0, 15.9),
        (6, 16.9),
        (12, 18.2),
        (18, 19.4),
        (24, 20.4),
        (30, 21.0),
        (36, 21.3),
        (42, 21.0),
        (48, 20.2),
    ] {
        dao.add_forecast(forecast_stage(
            "PIAI2",
            stage,
            now + Duration::hours(hours_ahead),
            now,
        ));
    }

    dao.add_crest(CrestRecord {
        lid: "PIAI2".to_string(),
        stage_ft: 28.9,
        crest_time: Utc.with_ymd_and_hms(1943, 5, 22, 6, 0, 0).unwrap(),
    });
    dao.add_crest(CrestRecord {
        lid: "PIAI2".to_string(),
        stage_ft: 26.0,
        crest_time: Utc.with_ymd_and_hms(2013, 4, 23, 18, 0, 0).unwrap(),
    });

    dao
}

/// A quiet river: observed and forecast both well below action stage.
pub fn peoria_quiet_scenario() -> FixtureDao {
    let now = scenario_now();
    let mut dao = FixtureDao::new();
    dao.add_point(peoria_point());

    for hours_ago in [6, 4, 2, 0] {
        dao.add_observed(observed_stage(
            "PIAI2",
            9.5,
            now - Duration::hours(hours_ago),
        ));
    }
    for hours_ahead in [6, 12, 18, 24] {
        dao.add_forecast(forecast_stage(
            "PIAI2",
            9.4,
            now + Duration::hours(hours_ahead),
            now,
        ));
    }

    dao
}
