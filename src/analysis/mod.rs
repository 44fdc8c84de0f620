/// Hazard analysis for assembled hydrographs.
///
/// Submodules:
/// - `recommend` — derives flood hazard attributes (crests, stage
///   crossings, flood category, record status) from a forecast point's
///   observed and forecast hydrographs and recommends a hazard.

pub mod recommend;
