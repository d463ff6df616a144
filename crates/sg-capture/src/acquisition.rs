use std::time::{Duration, Instant};

use sg_core::stop::StopSignal;
use sg_core::traits::SensorSource;

use crate::buffer::SampleBuffer;

/// Boucle d'acquisition : une scrutation non bloquante du capteur par tick.
///
/// Le signal d'arrêt est vérifié en haut de chaque tick ; l'attente entre
/// deux ticks se réveille dès qu'il est levé. Une lecture absente ou
/// illisible ne produit simplement aucun échantillon pour ce tick.
///
/// Retourne le nombre d'échantillons acceptés.
///
/// # Example
/// ```
/// use std::time::{Duration, Instant};
/// use sg_capture::acquisition::run_acquisition;
/// use sg_capture::buffer::SampleBuffer;
/// use sg_core::stop::StopSignal;
/// use sg_core::traits::SensorSource;
///
/// struct Silent;
/// impl SensorSource for Silent {
///     fn try_read(&mut self) -> Option<f64> { None }
/// }
///
/// let stop = StopSignal::new();
/// stop.raise();
/// let mut buf = SampleBuffer::with_capacity(10);
/// let n = run_acquisition(&mut Silent, &mut buf, &stop, Duration::from_millis(100), Instant::now());
/// assert_eq!(n, 0);
/// ```
pub fn run_acquisition(
    sensor: &mut dyn SensorSource,
    buffer: &mut SampleBuffer,
    stop: &StopSignal,
    tick: Duration,
    started: Instant,
) -> usize {
    log::info!("Acquisition démarrée (tick {} ms)", tick.as_millis());
    let mut accepted = 0;

    while !stop.is_raised() {
        if let Some(value) = sensor.try_read() {
            buffer.append(value, started.elapsed().as_secs_f64());
            accepted += 1;
        }
        stop.wait_timeout(tick);
    }

    log::info!(
        "Acquisition arrêtée : {accepted} lectures, {} conservées",
        buffer.len()
    );
    accepted
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use super::*;

    /// Rejoue un script de lectures puis lève l'arrêt.
    struct ScriptedSensor {
        script: VecDeque<Option<f64>>,
        stop: Arc<StopSignal>,
        reads: usize,
    }

    impl SensorSource for ScriptedSensor {
        fn try_read(&mut self) -> Option<f64> {
            self.reads += 1;
            let next = self.script.pop_front().flatten();
            if self.script.is_empty() {
                self.stop.raise();
            }
            next
        }
    }

    fn scripted(script: &[Option<f64>], stop: &Arc<StopSignal>) -> ScriptedSensor {
        ScriptedSensor {
            script: script.iter().copied().collect(),
            stop: Arc::clone(stop),
            reads: 0,
        }
    }

    #[test]
    fn missing_reads_are_skipped() {
        let stop = Arc::new(StopSignal::new());
        let mut sensor = scripted(&[Some(510.0), None, Some(497.0), None, Some(530.0)], &stop);
        let mut buf = SampleBuffer::with_capacity(10);
        let n = run_acquisition(
            &mut sensor,
            &mut buf,
            &stop,
            Duration::from_millis(1),
            Instant::now(),
        );
        assert_eq!(n, 3);
        assert_eq!(sensor.reads, 5, "one read per tick");
        assert_eq!(buf.into_series().values(), &[510.0, 497.0, 530.0]);
    }

    #[test]
    fn buffer_keeps_most_recent_window() {
        let stop = Arc::new(StopSignal::new());
        let script: Vec<Option<f64>> = (0..8).map(|i| Some(f64::from(i))).collect();
        let mut sensor = scripted(&script, &stop);
        let mut buf = SampleBuffer::with_capacity(3);
        run_acquisition(
            &mut sensor,
            &mut buf,
            &stop,
            Duration::from_millis(1),
            Instant::now(),
        );
        assert_eq!(buf.into_series().values(), &[5.0, 6.0, 7.0]);
    }

    #[test]
    fn elapsed_times_are_monotonic() {
        let stop = Arc::new(StopSignal::new());
        let script: Vec<Option<f64>> = (0..5).map(|i| Some(f64::from(i))).collect();
        let mut sensor = scripted(&script, &stop);
        let mut buf = SampleBuffer::with_capacity(10);
        run_acquisition(
            &mut sensor,
            &mut buf,
            &stop,
            Duration::from_millis(2),
            Instant::now(),
        );
        let series = buf.into_series();
        assert!(series.times().windows(2).all(|w| w[0] <= w[1]));
        assert!(series.times()[0] >= 0.0);
    }

    #[test]
    fn raised_stop_means_no_reads() {
        let stop = Arc::new(StopSignal::new());
        stop.raise();
        let mut sensor = scripted(&[Some(1.0)], &stop);
        let mut buf = SampleBuffer::with_capacity(4);
        let n = run_acquisition(
            &mut sensor,
            &mut buf,
            &stop,
            Duration::from_millis(100),
            Instant::now(),
        );
        assert_eq!(n, 0);
        assert_eq!(sensor.reads, 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn external_stop_ends_within_a_tick() {
        let stop = Arc::new(StopSignal::new());
        let mut sensor = scripted(&vec![None; 1000], &stop);
        let mut buf = SampleBuffer::with_capacity(4);
        let raiser = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            raiser.raise();
        });
        let start = Instant::now();
        run_acquisition(
            &mut sensor,
            &mut buf,
            &stop,
            Duration::from_millis(50),
            start,
        );
        handle.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(buf.is_empty());
    }
}
