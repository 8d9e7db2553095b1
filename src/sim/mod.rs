/// Weather, calendar and grid price model.
pub mod ambient;
pub mod env;
pub mod kpi;
/// Baseline controllers.
pub mod policy;
pub mod reward;
/// Bounded channel feeding the terminal monitor.
pub mod snapshot;
/// Solar geometry and clear-sky radiation.
pub mod solar;
pub mod types;
/// Hourly weather sources.
pub mod weather;
