use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Une lecture capteur horodatée.
///
/// `elapsed` est en secondes depuis le début de l'enregistrement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub elapsed: f64,
}

/// Série finalisée : valeurs et horodatages en deux tableaux parallèles.
///
/// C'est exactement la forme persistée par un `SeriesStore`. Les deux
/// tableaux ont toujours la même longueur.
///
/// # Example
/// ```
/// use sg_core::series::RecordedSeries;
/// let series = RecordedSeries::new(vec![100.0, 101.0], vec![0.1, 0.2]).unwrap();
/// assert_eq!(series.len(), 2);
/// assert!(RecordedSeries::new(vec![1.0], vec![]).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct RecordedSeries {
    values: Vec<f64>,
    times: Vec<f64>,
}

/// Forme brute désérialisée, validée par `TryFrom`.
#[derive(Deserialize)]
struct RawSeries {
    values: Vec<f64>,
    times: Vec<f64>,
}

impl TryFrom<RawSeries> for RecordedSeries {
    type Error = CoreError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Self::new(raw.values, raw.times)
    }
}

impl RecordedSeries {
    /// Build a series from two parallel arrays.
    ///
    /// # Errors
    /// Returns `CoreError::SeriesShape` if the arrays differ in length.
    pub fn new(values: Vec<f64>, times: Vec<f64>) -> Result<Self, CoreError> {
        if values.len() != times.len() {
            return Err(CoreError::SeriesShape {
                values: values.len(),
                times: times.len(),
            });
        }
        Ok(Self { values, times })
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<Sample> for RecordedSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let (values, times) = iter.into_iter().map(|s| (s.value, s.elapsed)).unzip();
        Self { values, times }
    }
}

/// Positions d'une série situées hors de la plage d'inliers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OutlierReport {
    /// Indices dans la série, croissants.
    pub indices: Vec<usize>,
    /// Valeurs aux indices signalés.
    pub values: Vec<f64>,
    /// Borne basse `Q1 - 1.5·IQR`.
    pub lower: f64,
    /// Borne haute `Q3 + 1.5·IQR`.
    pub upper: f64,
}

impl OutlierReport {
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Timestamps of the flagged samples, looked up in `times`.
    ///
    /// Indices beyond `times` are skipped.
    #[must_use]
    pub fn times(&self, times: &[f64]) -> Vec<f64> {
        self.indices
            .iter()
            .filter_map(|&i| times.get(i).copied())
            .collect()
    }
}

/// Issue de la comparaison fenêtrée. Terminale, jamais modifiée.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    /// Numéro (à partir de 1) de l'essai qui a réussi.
    pub window_index: Option<usize>,
    /// Start index of the successful window, or of the last one inspected.
    pub start_index: Option<usize>,
    /// Common points in that window.
    pub common_points: usize,
    /// Windows actually inspected.
    pub trials_run: usize,
}
