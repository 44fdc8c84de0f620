/// Hydro-schema backed implementation of `FloodDao`.
///
/// Maps rows from the `hydro` PostgreSQL schema (see
/// `sql/001_hydro_schema.sql`) into the typed records of `dao::mod`.
/// Stage and value columns are NUMERIC and arrive as `rust_decimal`
/// values; rows whose numeric fields cannot be represented as `f64` are
/// skipped with a warning rather than failing the whole query.

use chrono::{DateTime, Utc};
use postgres::Client;
use rust_decimal::Decimal;
use tracing::warn;

use crate::dao::{CrestRecord, DaoError, FloodDao, RiverForecastPoint};
use crate::model::{FloodThresholds, ShefObservation, PROBABILITY_NONE};

pub struct PostgresFloodDao {
    client: Client,
}

impl PostgresFloodDao {
    pub fn new(client: Client) -> Self {
        PostgresFloodDao { client }
    }

    /// Consumes the DAO and returns the underlying client.
    pub fn into_client(self) -> Client {
        self.client
    }
}

/// NUMERIC columns come back as `Decimal`; the domain model works in f64.
fn decimal_to_f64(value: Decimal) -> Option<f64> {
    value.to_string().parse().ok()
}

/// Builds `FloodThresholds` from the four nullable stage columns.
/// A point with a partially filled threshold set is treated as having
/// none: categorization against an incomplete ladder is meaningless.
fn thresholds_from_columns(
    action: Option<Decimal>,
    flood: Option<Decimal>,
    moderate: Option<Decimal>,
    major: Option<Decimal>,
) -> Option<FloodThresholds> {
    Some(FloodThresholds {
        action_stage_ft: decimal_to_f64(action?)?,
        flood_stage_ft: decimal_to_f64(flood?)?,
        moderate_flood_stage_ft: decimal_to_f64(moderate?)?,
        major_flood_stage_ft: decimal_to_f64(major?)?,
    })
}

fn point_from_row(row: &postgres::Row) -> RiverForecastPoint {
    RiverForecastPoint {
        lid: row.get(0),
        name: row.get(1),
        latitude: row.get(2),
        longitude: row.get(3),
        primary_pe: row.get(4),
        observed_ts: row.get(5),
        forecast_ts: row.get(6),
        use_latest_forecast: row.get(7),
        thresholds: thresholds_from_columns(row.get(8), row.get(9), row.get(10), row.get(11)),
    }
}

impl FloodDao for PostgresFloodDao {
    fn forecast_points(&mut self) -> Result<Vec<RiverForecastPoint>, DaoError> {
        let rows = self.client.query(
            "SELECT lid, name, latitude, longitude, primary_pe, observed_ts,
                    forecast_ts, use_latest_forecast, action_stage_ft, flood_stage_ft,
                    moderate_flood_stage_ft, major_flood_stage_ft
             FROM hydro.forecast_point
             ORDER BY lid",
            &[],
        )?;

        Ok(rows.iter().map(point_from_row).collect())
    }

    fn forecast_point(&mut self, lid: &str) -> Result<RiverForecastPoint, DaoError> {
        let row = self.client.query_opt(
            "SELECT lid, name, latitude, longitude, primary_pe, observed_ts,
                    forecast_ts, use_latest_forecast, action_stage_ft, flood_stage_ft,
                    moderate_flood_stage_ft, major_flood_stage_ft
             FROM hydro.forecast_point
             WHERE lid = $1",
            &[&lid],
        )?;

        match row {
            Some(row) => Ok(point_from_row(&row)),
            None => Err(DaoError::UnknownForecastPoint(lid.to_string())),
        }
    }

    fn observed_readings(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ShefObservation>, DaoError> {
        let rows = self.client.query(
            "SELECT value, valid_time, dur, extremum, quality_code
             FROM hydro.observed_height
             WHERE lid = $1 AND pe = $2 AND ts = $3
               AND valid_time BETWEEN $4 AND $5
             ORDER BY valid_time",
            &[&lid, &pe, &ts, &begin, &end],
        )?;

        let mut readings = Vec::new();
        for row in rows {
            let value = match decimal_to_f64(row.get(0)) {
                Some(v) => v,
                None => {
                    warn!(lid, pe, "skipping observed row with unrepresentable value");
                    continue;
                }
            };
            readings.push(ShefObservation {
                lid: lid.to_string(),
                physical_element: pe.to_string(),
                duration: row.get(2),
                type_source: ts.to_string(),
                extremum: row.get(3),
                probability: PROBABILITY_NONE,
                value,
                valid_time: row.get(1),
                basis_time: None,
                quality_code: row.get(4),
            });
        }

        Ok(readings)
    }

    fn forecast_basis_times(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        basis_floor: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, DaoError> {
        let rows = self.client.query(
            "SELECT DISTINCT basis_time
             FROM hydro.forecast_height
             WHERE lid = $1 AND pe = $2 AND ts = $3 AND basis_time >= $4
             ORDER BY basis_time DESC",
            &[&lid, &pe, &ts, &basis_floor],
        )?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn forecast_readings(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        end_valid: DateTime<Utc>,
        basis_floor: DateTime<Utc>,
    ) -> Result<Vec<ShefObservation>, DaoError> {
        let rows = self.client.query(
            "SELECT value, valid_time, basis_time, dur, extremum, probability, quality_code
             FROM hydro.forecast_height
             WHERE lid = $1 AND pe = $2 AND ts = $3
               AND basis_time >= $4 AND valid_time <= $5
             ORDER BY valid_time",
            &[&lid, &pe, &ts, &basis_floor, &end_valid],
        )?;

        let mut readings = Vec::new();
        for row in rows {
            let value = match decimal_to_f64(row.get(0)) {
                Some(v) => v,
                None => {
                    warn!(lid, pe, "skipping forecast row with unrepresentable value");
                    continue;
                }
            };
            let probability = decimal_to_f64(row.get(5)).unwrap_or(PROBABILITY_NONE);
            readings.push(ShefObservation {
                lid: lid.to_string(),
                physical_element: pe.to_string(),
                duration: row.get(3),
                type_source: ts.to_string(),
                extremum: row.get(4),
                probability,
                value,
                valid_time: row.get(1),
                basis_time: Some(row.get(2)),
                quality_code: row.get(6),
            });
        }

        Ok(readings)
    }

    fn crest_history(&mut self, lid: &str) -> Result<Vec<CrestRecord>, DaoError> {
        let rows = self.client.query(
            "SELECT stage_ft, crest_time
             FROM hydro.crest
             WHERE lid = $1
             ORDER BY stage_ft DESC",
            &[&lid],
        )?;

        let mut crests = Vec::new();
        for row in rows {
            let stage_ft = match decimal_to_f64(row.get(0)) {
                Some(v) => v,
                None => {
                    warn!(lid, "skipping crest row with unrepresentable stage");
                    continue;
                }
            };
            crests.push(CrestRecord {
                lid: lid.to_string(),
                stage_ft,
                crest_time: row.get(1),
            });
        }

        Ok(crests)
    }
}
