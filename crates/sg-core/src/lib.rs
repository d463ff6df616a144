/// Configuration, types, and shared structures for sonogate.
///
/// This crate contains the shared series types, the collaborator traits
/// (credential, actuator, sensor, progress, store), the stop latch and the
/// configuration logic used across the sonogate workspace.

pub mod config;
pub mod error;
pub mod series;
pub mod stop;
pub mod traits;

pub use config::GateConfig;
pub use error::CoreError;
pub use series::{MatchResult, OutlierReport, RecordedSeries, Sample};
pub use stop::StopSignal;
