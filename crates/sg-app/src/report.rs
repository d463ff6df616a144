use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sg_core::config::GateConfig;

use crate::session::SessionOutcome;

/// Rapport JSON d'une session : séries, outliers, résultat de comparaison.
#[derive(Debug, Serialize)]
pub struct SessionReport<'a> {
    pub generated_at: String,
    pub recording_name: &'a str,
    pub reference_name: &'a str,
    pub window_size: usize,
    pub tolerance: f64,
    pub exclusion_band: [f64; 2],
    /// Horodatages des outliers, dans l'ordre des indices.
    pub outlier_times: Vec<f64>,
    #[serde(flatten)]
    pub outcome: &'a SessionOutcome,
}

impl<'a> SessionReport<'a> {
    #[must_use]
    pub fn new(outcome: &'a SessionOutcome, config: &'a GateConfig) -> Self {
        let outlier_times = match (&outcome.outliers, &outcome.recording) {
            (Some(outliers), Some(recording)) => outliers.times(recording.times()),
            _ => Vec::new(),
        };
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            recording_name: &config.recording_name,
            reference_name: &config.reference_name,
            window_size: config.window_size(),
            tolerance: config.tolerance,
            exclusion_band: config.exclusion_band,
            outlier_times,
            outcome,
        }
    }
}

/// Écrit le rapport en JSON indenté.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_report(path: &Path, outcome: &SessionOutcome, config: &GateConfig) -> Result<()> {
    let report = SessionReport::new(outcome, config);
    let file = File::create(path)
        .with_context(|| format!("Impossible de créer {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)
        .with_context(|| format!("Impossible d'écrire le rapport {}", path.display()))?;
    writer.flush()?;
    log::info!("Rapport écrit dans {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use sg_core::series::{MatchResult, OutlierReport, RecordedSeries};

    use super::*;
    use crate::session::SessionState;

    #[test]
    fn report_carries_outcome_and_outlier_times() {
        let outcome = SessionOutcome {
            state: SessionState::Done,
            history: vec![
                SessionState::AwaitingCredential,
                SessionState::Recording,
                SessionState::Persisting,
                SessionState::Analyzing,
                SessionState::Done,
            ],
            recording: Some(
                RecordedSeries::new(vec![500.0, 900.0, 501.0], vec![0.1, 0.2, 0.3]).unwrap(),
            ),
            outliers: Some(OutlierReport {
                indices: vec![1],
                values: vec![900.0],
                lower: 480.0,
                upper: 520.0,
            }),
            matching: Some(MatchResult {
                matched: true,
                window_index: Some(2),
                start_index: Some(0),
                common_points: 4,
                trials_run: 2,
            }),
        };
        let config = GateConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_report(&path, &outcome, &config).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["state"], "Done");
        assert_eq!(json["outlier_times"], serde_json::json!([0.2]));
        assert_eq!(json["matching"]["window_index"], 2);
        assert_eq!(json["recording"]["values"].as_array().unwrap().len(), 3);
        assert_eq!(json["reference_name"], "Data_1");
    }
}
