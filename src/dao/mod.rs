/// Data-access boundary for the hydrograph service.
///
/// Every piece of external data — forecast-point metadata, observed and
/// forecast river readings, crest history — crosses the `FloodDao` trait.
/// The loaders and the recommendation analysis never touch SQL or row
/// layouts directly; they consume the typed records defined here.
///
/// Submodules:
/// - `postgres` — hydro-schema backed implementation (production)
/// - `fixtures` — deterministic in-memory implementation (tests)

use chrono::{DateTime, Utc};

use crate::model::{FloodThresholds, ShefObservation};

pub mod fixtures;
pub mod postgres;

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// Metadata for a single river forecast point.
#[derive(Debug, Clone)]
pub struct RiverForecastPoint {
    /// NWS location id, e.g. "PIAI2".
    pub lid: String,
    /// Official point name.
    pub name: String,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Primary SHEF physical element at this point, usually "HG".
    pub primary_pe: String,
    /// Type-source code of the observed series to load.
    pub observed_ts: String,
    /// Type-source code of the forecast series to load.
    pub forecast_ts: String,
    /// When true, only the most recent forecast run for this point is
    /// used, regardless of the service-wide setting.
    pub use_latest_forecast: bool,
    /// NWS flood stage thresholds, if defined for this point.
    /// Tributary points may not have official thresholds.
    pub thresholds: Option<FloodThresholds>,
}

/// One period-of-record crest for a forecast point.
#[derive(Debug, Clone, PartialEq)]
pub struct CrestRecord {
    pub lid: String,
    pub stage_ft: f64,
    pub crest_time: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise when retrieving hydro data.
#[derive(Debug)]
pub enum DaoError {
    /// The underlying database query failed.
    Db(::postgres::Error),
    /// The requested forecast point is not known to the data store.
    UnknownForecastPoint(String),
}

impl std::fmt::Display for DaoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaoError::Db(e) => write!(f, "Database error: {}", e),
            DaoError::UnknownForecastPoint(lid) => {
                write!(f, "Unknown forecast point: {}", lid)
            }
        }
    }
}

impl std::error::Error for DaoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaoError::Db(e) => Some(e),
            DaoError::UnknownForecastPoint(_) => None,
        }
    }
}

impl From<::postgres::Error> for DaoError {
    fn from(e: ::postgres::Error) -> Self {
        DaoError::Db(e)
    }
}

// ---------------------------------------------------------------------------
// The DAO trait
// ---------------------------------------------------------------------------

/// The sole collaborator boundary for hydro data retrieval.
///
/// Methods take `&mut self` because the production implementation wraps a
/// blocking `postgres::Client`; calls are synchronous and may block.
pub trait FloodDao {
    /// All forecast points known to the data store.
    fn forecast_points(&mut self) -> Result<Vec<RiverForecastPoint>, DaoError>;

    /// Metadata for a single forecast point.
    fn forecast_point(&mut self, lid: &str) -> Result<RiverForecastPoint, DaoError>;

    /// Observed readings for lid/pe/ts with valid time in [begin, end],
    /// ordered by valid time ascending.
    fn observed_readings(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ShefObservation>, DaoError>;

    /// Distinct forecast basis (issuance) times for lid/pe/ts at or after
    /// `basis_floor`, ordered descending (most recent first).
    fn forecast_basis_times(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        basis_floor: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, DaoError>;

    /// Forecast readings for lid/pe/ts with basis time at or after
    /// `basis_floor` and valid time at or before `end_valid`, ordered by
    /// valid time ascending.
    fn forecast_readings(
        &mut self,
        lid: &str,
        pe: &str,
        ts: &str,
        end_valid: DateTime<Utc>,
        basis_floor: DateTime<Utc>,
    ) -> Result<Vec<ShefObservation>, DaoError>;

    /// Period-of-record crests for a forecast point, highest stage first.
    fn crest_history(&mut self, lid: &str) -> Result<Vec<CrestRecord>, DaoError>;
}
