/// Hydrograph assembly for one river forecast point.
///
/// A `Hydrograph` is the time-ordered series of SHEF readings for one
/// station + physical element + type-source, built either from an
/// observed window or from an aggregate of forecast runs. Forecast
/// assembly merges the runs' overlapping valid-time spans through the
/// basis-time de-overlap engine (`deoverlap`), so the result reads as a
/// single contiguous series preferring the most recently issued data.
///
/// A hydrograph is built once per query and never mutated; a fresh query
/// builds a fresh hydrograph.
///
/// Per-record problems (missing-value sentinel, failed quality check,
/// basis time matching no known run) are logged and skipped, never
/// propagated. Only DAO errors surface as `Err`.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, error};

use crate::dao::{DaoError, FloodDao};
use crate::model::ShefObservation;

pub mod deoverlap;

use self::deoverlap::{deoverlap_spans, retains, BasisSpan};

#[derive(Debug, Clone)]
pub struct Hydrograph {
    lid: String,
    physical_element: String,
    type_source: String,
    observations: Vec<ShefObservation>,
}

impl Hydrograph {
    /// Builds the observed hydrograph for valid times in [begin, end].
    ///
    /// Rows carrying the missing-value sentinel or failing the quality
    /// check are skipped with a debug log. An empty window yields an
    /// empty hydrograph, not an error.
    pub fn load_observed(
        dao: &mut dyn FloodDao,
        lid: &str,
        pe: &str,
        ts: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Hydrograph, DaoError> {
        let rows = dao.observed_readings(lid, pe, ts, begin, end)?;

        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if row.is_missing() {
                debug!(lid, valid = %row.valid_time, "skipping observed row: missing value");
                continue;
            }
            if !row.passes_quality_check() {
                debug!(
                    lid,
                    valid = %row.valid_time,
                    quality_code = row.quality_code,
                    "skipping observed row: failed quality check"
                );
                continue;
            }
            kept.push(row);
        }
        kept.sort_by_key(|r| r.valid_time);

        if kept.is_empty() {
            debug!(lid, pe, ts, "observed window is empty");
        }

        Ok(Hydrograph {
            lid: lid.to_string(),
            physical_element: pe.to_string(),
            type_source: ts.to_string(),
            observations: kept,
        })
    }

    /// Builds the aggregate forecast hydrograph.
    ///
    /// Considers forecast runs issued at or after `basis_floor`, with
    /// valid times at or before `end_valid`. With `use_latest` set (or
    /// when only one run exists) the merge is skipped and the retained
    /// run's rows are kept unchanged. Otherwise each run's valid-time
    /// span is clipped against more recently issued runs and rows are
    /// retained only inside their run's adjusted span.
    pub fn load_forecast(
        dao: &mut dyn FloodDao,
        lid: &str,
        pe: &str,
        ts: &str,
        end_valid: DateTime<Utc>,
        basis_floor: DateTime<Utc>,
        use_latest: bool,
    ) -> Result<Hydrograph, DaoError> {
        let mut hydrograph = Hydrograph {
            lid: lid.to_string(),
            physical_element: pe.to_string(),
            type_source: ts.to_string(),
            observations: Vec::new(),
        };

        let mut basis_times = dao.forecast_basis_times(lid, pe, ts, basis_floor)?;
        if basis_times.is_empty() {
            debug!(lid, pe, ts, "no forecast runs at or after the basis floor");
            return Ok(hydrograph);
        }
        if use_latest {
            // Basis times arrive most recent first.
            basis_times.truncate(1);
        }

        let rows = dao.forecast_readings(lid, pe, ts, end_valid, basis_floor)?;
        let mut screened = Vec::with_capacity(rows.len());
        for row in rows {
            if row.is_missing() {
                debug!(lid, valid = %row.valid_time, "skipping forecast row: missing value");
                continue;
            }
            screened.push(row);
        }

        // A single run cannot overlap anything; keep its rows unchanged.
        if basis_times.len() == 1 {
            let only = basis_times[0];
            let mut kept: Vec<ShefObservation> = screened
                .into_iter()
                .filter(|r| r.basis_time == Some(only))
                .collect();
            kept.sort_by_key(|r| r.valid_time);
            hydrograph.observations = kept;
            return Ok(hydrograph);
        }

        // Compute each run's [min, max] valid-time span.
        let mut bounds: HashMap<DateTime<Utc>, (DateTime<Utc>, DateTime<Utc>)> = HashMap::new();
        for row in &screened {
            let Some(basis) = row.basis_time else { continue };
            let entry = bounds
                .entry(basis)
                .or_insert((row.valid_time, row.valid_time));
            if row.valid_time < entry.0 {
                entry.0 = row.valid_time;
            }
            if row.valid_time > entry.1 {
                entry.1 = row.valid_time;
            }
        }

        let spans: Vec<BasisSpan> = basis_times
            .iter()
            .filter_map(|basis| {
                bounds.get(basis).map(|(start, end)| BasisSpan {
                    basis_time: *basis,
                    start: *start,
                    end: *end,
                })
            })
            .collect();

        let adjusted = deoverlap_spans(&spans);

        let mut kept = Vec::with_capacity(screened.len());
        for row in screened {
            let Some(basis) = row.basis_time else {
                debug!(lid, valid = %row.valid_time, "forecast row carries no basis time");
                continue;
            };
            if !basis_times.contains(&basis) {
                debug!(
                    lid,
                    basis = %basis,
                    valid = %row.valid_time,
                    "forecast row matches no known basis-time series"
                );
                continue;
            }
            if retains(&adjusted, basis, row.valid_time) {
                kept.push(row);
            }
        }
        kept.sort_by_key(|r| r.valid_time);
        hydrograph.observations = kept;

        Ok(hydrograph)
    }

    pub fn lid(&self) -> &str {
        &self.lid
    }

    pub fn physical_element(&self) -> &str {
        &self.physical_element
    }

    pub fn type_source(&self) -> &str {
        &self.type_source
    }

    /// The assembled, filtered, time-ordered series.
    pub fn observations(&self) -> &[ShefObservation] {
        &self.observations
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns a clone of the reading with the greatest value. The scan
    /// uses strictly-greater comparison, so ties resolve to the first
    /// occurrence in series order. An empty hydrograph logs an error and
    /// returns `None`.
    pub fn max_observation(&self) -> Option<ShefObservation> {
        let Some(first) = self.observations.first() else {
            error!(
                lid = %self.lid,
                pe = %self.physical_element,
                "maximum requested on an empty hydrograph"
            );
            return None;
        };

        let mut max = first;
        for obs in &self.observations[1..] {
            if obs.value > max.value {
                max = obs;
            }
        }
        Some(max.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::fixtures::{
        forecast_stage, observed_stage, peoria_flood_scenario, scenario_now, FixtureDao,
    };
    use crate::model::{MISSING_VALUE, PE_STAGE, TS_FORECAST, TS_OBSERVED};
    use chrono::Duration;

    #[test]
    fn test_observed_load_keeps_window_sorted() {
        let mut dao = peoria_flood_scenario();
        let now = scenario_now();
        let hydro = Hydrograph::load_observed(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_OBSERVED,
            now - Duration::hours(6),
            now,
        )
        .unwrap();

        assert_eq!(hydro.len(), 7);
        let times: Vec<_> = hydro.observations().iter().map(|o| o.valid_time).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted, "observed series must be time-ordered");
    }

    #[test]
    fn test_observed_load_screens_missing_and_bad_quality_rows() {
        let now = scenario_now();
        let mut dao = FixtureDao::new();
        dao.add_observed(observed_stage("PIAI2", 12.0, now - Duration::hours(2)));
        dao.add_observed(observed_stage(
            "PIAI2",
            MISSING_VALUE,
            now - Duration::hours(1),
        ));
        let mut rejected = observed_stage("PIAI2", 12.5, now);
        rejected.quality_code = 0;
        dao.add_observed(rejected);

        let hydro = Hydrograph::load_observed(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_OBSERVED,
            now - Duration::hours(6),
            now,
        )
        .unwrap();

        assert_eq!(hydro.len(), 1, "sentinel and rejected rows must be dropped");
        assert_eq!(hydro.observations()[0].value, 12.0);
    }

    #[test]
    fn test_observed_load_empty_window_yields_empty_hydrograph() {
        let mut dao = FixtureDao::new();
        let now = scenario_now();
        let hydro = Hydrograph::load_observed(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_OBSERVED,
            now - Duration::hours(6),
            now,
        )
        .unwrap();
        assert!(hydro.is_empty());
    }

    #[test]
    fn test_forecast_merge_prefers_newer_run_in_overlap() {
        let mut dao = peoria_flood_scenario();
        let now = scenario_now();
        let hydro = Hydrograph::load_forecast(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_FORECAST,
            now + Duration::hours(336),
            now - Duration::hours(72),
            false,
        )
        .unwrap();

        // Newer run covers T0..T+48h (9 rows); older run survives only
        // past the one-minute boundary: T+54, T+60, T+66, T+72.
        assert_eq!(hydro.len(), 13);

        let newer_basis = Some(now);
        let older_basis = Some(now - Duration::hours(6));
        for obs in hydro.observations() {
            if obs.valid_time <= now + Duration::hours(48) {
                assert_eq!(
                    obs.basis_time, newer_basis,
                    "overlap region must come from the newer run"
                );
            } else {
                assert_eq!(obs.basis_time, older_basis);
            }
        }

        // The overlap value at T+48h is the newer run's 20.2, not 20.0.
        let at_48 = hydro
            .observations()
            .iter()
            .find(|o| o.valid_time == now + Duration::hours(48))
            .unwrap();
        assert_eq!(at_48.value, 20.2);
    }

    #[test]
    fn test_forecast_use_latest_keeps_only_newest_run() {
        let mut dao = peoria_flood_scenario();
        let now = scenario_now();
        let hydro = Hydrograph::load_forecast(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_FORECAST,
            now + Duration::hours(336),
            now - Duration::hours(72),
            true,
        )
        .unwrap();

        assert_eq!(hydro.len(), 9);
        assert!(hydro
            .observations()
            .iter()
            .all(|o| o.basis_time == Some(now)));
    }

    #[test]
    fn test_forecast_single_run_keeps_all_rows_unchanged() {
        let now = scenario_now();
        let mut dao = FixtureDao::new();
        let basis = now - Duration::hours(6);
        for (hours_ahead, stage) in [(0, 15.9), (6, 16.8), (12, 18.0)] {
            dao.add_forecast(forecast_stage(
                "PIAI2",
                stage,
                now + Duration::hours(hours_ahead),
                basis,
            ));
        }

        let hydro = Hydrograph::load_forecast(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_FORECAST,
            now + Duration::hours(336),
            now - Duration::hours(72),
            false,
        )
        .unwrap();

        assert_eq!(hydro.len(), 3, "single run is never clipped");
    }

    #[test]
    fn test_forecast_no_runs_after_floor_yields_empty_hydrograph() {
        let mut dao = peoria_flood_scenario();
        let now = scenario_now();
        let hydro = Hydrograph::load_forecast(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_FORECAST,
            now + Duration::hours(336),
            now + Duration::hours(1),
            false,
        )
        .unwrap();
        assert!(hydro.is_empty());
    }

    #[test]
    fn test_max_observation_returns_greatest_value() {
        let mut dao = peoria_flood_scenario();
        let now = scenario_now();
        let hydro = Hydrograph::load_forecast(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_FORECAST,
            now + Duration::hours(336),
            now - Duration::hours(72),
            false,
        )
        .unwrap();

        let max = hydro.max_observation().expect("series is non-empty");
        assert_eq!(max.value, 21.3);
        assert_eq!(max.valid_time, now + Duration::hours(36));
    }

    #[test]
    fn test_max_observation_tie_resolves_to_first_occurrence() {
        let now = scenario_now();
        let mut dao = FixtureDao::new();
        dao.add_observed(observed_stage("PIAI2", 17.0, now - Duration::hours(3)));
        dao.add_observed(observed_stage("PIAI2", 17.0, now - Duration::hours(1)));

        let hydro = Hydrograph::load_observed(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_OBSERVED,
            now - Duration::hours(6),
            now,
        )
        .unwrap();

        let max = hydro.max_observation().unwrap();
        assert_eq!(max.valid_time, now - Duration::hours(3));
    }

    #[test]
    fn test_max_observation_on_empty_hydrograph_is_none() {
        let mut dao = FixtureDao::new();
        let now = scenario_now();
        let hydro = Hydrograph::load_observed(
            &mut dao,
            "PIAI2",
            PE_STAGE,
            TS_OBSERVED,
            now - Duration::hours(6),
            now,
        )
        .unwrap();
        assert!(hydro.max_observation().is_none());
    }
}
