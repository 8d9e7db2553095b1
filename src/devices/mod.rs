//! Building-side components of the microgrid: storage, generators and the
//! buildings that own them.

/// Capacity-clamped energy store.
pub mod battery;
/// Community member that produces, consumes, stores and trades energy.
pub mod building;
/// Solar and wind generators.
pub mod source;
pub mod types;

// Re-export the main types for convenience
pub use battery::Battery;
pub use building::{Building, Carryover, TickLedger};
pub use source::{EnergySource, SourceKind};
pub use types::{AmbientReading, GridSupply, TransferRequest};
