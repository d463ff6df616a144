use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Verrou d'arrêt à écriture unique : une fois levé, il ne retombe jamais.
///
/// Partagé entre la boucle d'acquisition, le compte à rebours et le
/// gestionnaire Ctrl-C. Lever un signal déjà levé ne fait rien.
///
/// # Example
/// ```
/// use sg_core::stop::StopSignal;
/// let stop = StopSignal::new();
/// assert!(!stop.is_raised());
/// assert!(stop.raise());
/// assert!(!stop.raise(), "second raise is a no-op");
/// assert!(stop.is_raised());
/// ```
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lève le signal. Retourne `true` seulement pour le premier appel.
    pub fn raise(&self) -> bool {
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        if *raised {
            return false;
        }
        *raised = true;
        self.cond.notify_all();
        true
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        *self.raised.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attend au plus `timeout`, en se réveillant dès que le signal est levé.
    ///
    /// Retourne `true` si le signal est levé au retour.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        while !*raised {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            raised = self
                .cond
                .wait_timeout(raised, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *raised
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn wait_times_out_when_not_raised() {
        let stop = StopSignal::new();
        let start = Instant::now();
        assert!(!stop.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wait_wakes_early_on_raise() {
        let stop = Arc::new(StopSignal::new());
        let raiser = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            raiser.raise();
        });
        let start = Instant::now();
        assert!(stop.wait_timeout(Duration::from_secs(5)));
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "waiter should not sleep the whole timeout"
        );
        handle.join().unwrap();
    }

    #[test]
    fn raise_is_idempotent_across_threads() {
        let stop = Arc::new(StopSignal::new());
        let firsts: usize = (0..8)
            .map(|_| {
                let s = Arc::clone(&stop);
                thread::spawn(move || s.raise())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        assert_eq!(firsts, 1, "exactly one raise wins");
    }
}
