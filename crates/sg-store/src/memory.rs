use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use sg_core::series::RecordedSeries;
use sg_core::traits::SeriesStore;

use crate::error::StoreError;

/// Stockage volatil, pour les tests et la comparaison hors ligne.
///
/// # Example
/// ```
/// use sg_core::series::RecordedSeries;
/// use sg_core::traits::SeriesStore;
/// use sg_store::MemorySeriesStore;
///
/// let store = MemorySeriesStore::default();
/// let series = RecordedSeries::new(vec![1.0], vec![0.0]).unwrap();
/// store.save("Data_1", &series).unwrap();
/// assert_eq!(store.load("Data_1").unwrap(), series);
/// assert!(store.load("Data_2").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemorySeriesStore {
    series: Mutex<HashMap<String, RecordedSeries>>,
}

impl MemorySeriesStore {
    /// Pré-remplit le stockage avec une série nommée.
    #[must_use]
    pub fn with_series(self, name: &str, series: RecordedSeries) -> Self {
        self.series
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), series);
        self
    }

}

impl SeriesStore for MemorySeriesStore {
    type Error = StoreError;

    fn save(&self, name: &str, series: &RecordedSeries) -> Result<(), StoreError> {
        crate::check_name(name)?;
        self.series
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), series.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<RecordedSeries, StoreError> {
        crate::check_name(name)?;
        self.series
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }
}
