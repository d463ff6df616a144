use std::collections::VecDeque;

use sg_core::series::{RecordedSeries, Sample};

/// Fenêtre glissante des `capacity` lectures les plus récentes.
///
/// Valeurs et horodatages sont stockés côte à côte et évoluent toujours
/// ensemble : `values.len() == times.len()` en permanence.
///
/// # Example
/// ```
/// use sg_capture::buffer::SampleBuffer;
/// let mut buf = SampleBuffer::with_capacity(2);
/// buf.append(1.0, 0.1);
/// buf.append(2.0, 0.2);
/// buf.append(3.0, 0.3);
/// assert_eq!(buf.len(), 2);
/// assert_eq!(buf.into_series().values(), &[2.0, 3.0]);
/// ```
const PREALLOC_LIMIT: usize = 4096;

#[derive(Debug)]
pub struct SampleBuffer {
    values: VecDeque<f64>,
    times: VecDeque<f64>,
    capacity: usize,
}

impl SampleBuffer {
    /// Borne à `capacity` entrées. Une capacité nulle est ramenée à 1.
    ///
    /// La pré-allocation est plafonnée ; le buffer grandit ensuite jusqu'à `capacity`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let reserved = capacity.min(PREALLOC_LIMIT);
        Self {
            values: VecDeque::with_capacity(reserved),
            times: VecDeque::with_capacity(reserved),
            capacity,
        }
    }

    /// Ajoute une lecture, en évinçant la plus ancienne si le buffer est plein.
    #[inline]
    pub fn append(&mut self, value: f64, elapsed: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
            self.times.pop_front();
        }
        self.values.push_back(value);
        self.times.push_back(elapsed);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.values
            .iter()
            .zip(&self.times)
            .map(|(&value, &elapsed)| Sample { value, elapsed })
    }

    /// Fige le contenu en série finale.
    #[must_use]
    pub fn into_series(self) -> RecordedSeries {
        self.iter().collect()
    }
}
