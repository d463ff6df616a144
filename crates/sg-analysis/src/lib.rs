// Outlier extraction and randomized windowed matching for sonogate.

pub mod error;
pub mod matcher;
pub mod outliers;

pub use error::AnalysisError;
pub use matcher::{ExclusionBand, MatchParams, count_common_points, match_windows};
pub use outliers::{extract_outliers, percentile};
