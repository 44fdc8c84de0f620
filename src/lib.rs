/// hydrograph_service: river forecast hydrograph aggregation and flood
/// hazard recommendation.
///
/// # Module structure
///
/// ```text
/// hydrograph_service
/// ├── model       — shared data types (ShefObservation, FloodThresholds, SHEF constants)
/// ├── config      — service settings loader (settings.toml)
/// ├── db          — PostgreSQL connection bootstrap and schema validation
/// ├── dao         — FloodDao trait: the sole data-access boundary
/// │   ├── postgres — hydro-schema backed implementation
/// │   └── fixtures — deterministic in-memory implementation (tests)
/// ├── hydrograph  — observed/forecast series assembly + max lookup
/// │   └── deoverlap — basis-time priority interval merge (pure)
/// └── analysis
///     └── recommend — crests, stage crossings, flood category,
///                     record status, hazard recommendation
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod dao;
pub mod db;
pub mod hydrograph;
pub mod model;
