use sg_core::config::GateConfig;
use sg_core::series::MatchResult;

use crate::error::AnalysisError;

/// Plage fermée de valeurs exclues du comptage (plancher de bruit connu).
///
/// # Example
/// ```
/// use sg_analysis::matcher::ExclusionBand;
/// let band = ExclusionBand::new(279.0, 283.0);
/// assert!(band.contains(279.0) && band.contains(283.0));
/// assert!(!band.contains(283.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionBand {
    pub low: f64,
    pub high: f64,
}

impl ExclusionBand {
    #[must_use]
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Paramètres de la comparaison fenêtrée.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchParams {
    /// Longueur d'une fenêtre, en échantillons.
    pub window_size: usize,
    /// Écart absolu maximal entre deux points communs.
    pub tolerance: f64,
    pub exclusion_band: ExclusionBand,
    /// Fenêtres tirées au plus.
    pub trials: usize,
    /// Points communs requis pour déclarer une correspondance.
    pub min_common: usize,
}

impl MatchParams {
    #[must_use]
    pub fn from_config(config: &GateConfig) -> Self {
        let [low, high] = config.exclusion_band;
        Self {
            window_size: config.window_size(),
            tolerance: config.tolerance,
            exclusion_band: ExclusionBand::new(low, high),
            trials: config.trials as usize,
            min_common: config.min_common_points,
        }
    }
}

/// Compte les positions où les deux fenêtres concordent.
///
/// Une position est commune si `|current[i] - reference[i]| <= tolerance`
/// et qu'aucune des deux valeurs n'est dans la bande d'exclusion. Les
/// fenêtres sont comparées par index, sur leur longueur commune.
///
/// # Example
/// ```
/// use sg_analysis::matcher::{count_common_points, ExclusionBand};
/// let band = ExclusionBand::new(279.0, 283.0);
/// let n = count_common_points(&[100.0, 101.0, 280.0, 99.0], &[102.0, 100.0, 281.0, 95.0], 3.0, band);
/// assert_eq!(n, 2);
/// ```
#[must_use]
pub fn count_common_points(
    current: &[f64],
    reference: &[f64],
    tolerance: f64,
    band: ExclusionBand,
) -> usize {
    current
        .iter()
        .zip(reference)
        .filter(|&(&c, &r)| (c - r).abs() <= tolerance && !band.contains(c) && !band.contains(r))
        .count()
}

/// Tire au plus `trials` fenêtres aléatoires et s'arrête à la première
/// qui compte au moins `min_common` points communs.
///
/// Les deux séries sont alignées par index, pas par horodatage : la même
/// position de départ sert aux deux. Les départs sont tirés uniformément
/// et indépendamment dans `[0, n - window_size]`, `n` étant la longueur
/// commune ; deux essais peuvent retomber sur la même fenêtre.
///
/// # Errors
/// - `AnalysisError::InvalidParams` if `window_size` or `trials` is zero.
/// - `AnalysisError::InsufficientData` if either series is shorter than one
///   window. No window is drawn in that case.
///
/// # Example
/// ```
/// use sg_analysis::matcher::{match_windows, ExclusionBand, MatchParams};
/// let params = MatchParams {
///     window_size: 3,
///     tolerance: 3.0,
///     exclusion_band: ExclusionBand::new(279.0, 283.0),
///     trials: 5,
///     min_common: 2,
/// };
/// let series = [100.0, 104.0, 99.0, 101.0, 97.0];
/// let mut rng = fastrand::Rng::with_seed(1);
/// let result = match_windows(&series, &series, &params, &mut rng).unwrap();
/// assert!(result.matched);
/// assert_eq!(result.window_index, Some(1));
/// ```
pub fn match_windows(
    current: &[f64],
    reference: &[f64],
    params: &MatchParams,
    rng: &mut fastrand::Rng,
) -> Result<MatchResult, AnalysisError> {
    if params.window_size == 0 {
        return Err(AnalysisError::InvalidParams(
            "window_size doit être > 0".to_string(),
        ));
    }
    if params.trials == 0 {
        return Err(AnalysisError::InvalidParams(
            "trials doit être > 0".to_string(),
        ));
    }

    let comparable = current.len().min(reference.len());
    if comparable < params.window_size {
        return Err(AnalysisError::InsufficientData {
            current: current.len(),
            reference: reference.len(),
            window_size: params.window_size,
        });
    }

    let last_start = comparable - params.window_size;
    let mut result = MatchResult::default();

    for trial in 1..=params.trials {
        let start = rng.usize(0..=last_start);
        let end = start + params.window_size;
        let common = count_common_points(
            &current[start..end],
            &reference[start..end],
            params.tolerance,
            params.exclusion_band,
        );
        log::debug!("Fenêtre {trial}/{} @ {start} : {common} points communs", params.trials);

        result.start_index = Some(start);
        result.common_points = common;
        result.trials_run = trial;

        if common >= params.min_common {
            log::info!(
                "Correspondance dans la fenêtre {trial} ({common} points communs ≥ {})",
                params.min_common
            );
            result.matched = true;
            result.window_index = Some(trial);
            return Ok(result);
        }
    }

    log::info!(
        "Aucune fenêtre sur {} n'atteint {} points communs",
        params.trials,
        params.min_common
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(window_size: usize, trials: usize, min_common: usize) -> MatchParams {
        MatchParams {
            window_size,
            tolerance: 3.0,
            exclusion_band: ExclusionBand::new(279.0, 283.0),
            trials,
            min_common,
        }
    }

    /// Signal plausible, hors bande d'exclusion.
    fn signal(len: usize) -> Vec<f64> {
        (0..len).map(|i| 480.0 + ((i * 37) % 61) as f64).collect()
    }

    #[test]
    fn scenario_counts_two_common_points() {
        let band = ExclusionBand::new(279.0, 283.0);
        let current = [100.0, 101.0, 280.0, 99.0];
        let reference = [102.0, 100.0, 281.0, 95.0];
        assert_eq!(count_common_points(&current, &reference, 3.0, band), 2);
    }

    #[test]
    fn either_value_in_band_excludes_the_point() {
        let band = ExclusionBand::new(279.0, 283.0);
        assert_eq!(count_common_points(&[281.0], &[284.0], 3.0, band), 0);
        assert_eq!(count_common_points(&[284.0], &[281.0], 3.0, band), 0);
        assert_eq!(count_common_points(&[284.0], &[286.0], 3.0, band), 1);
    }

    #[test]
    fn identical_series_match_on_first_trial() {
        let series = signal(300);
        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let result = match_windows(&series, &series, &params(50, 5, 4), &mut rng).unwrap();
            assert!(result.matched);
            assert_eq!(result.window_index, Some(1));
            assert_eq!(result.trials_run, 1, "short-circuits on first success");
            assert_eq!(result.common_points, 50);
        }
    }

    #[test]
    fn disjoint_series_exhaust_all_trials() {
        let current = signal(300);
        let reference: Vec<f64> = current.iter().map(|v| v + 100.0).collect();
        let mut rng = fastrand::Rng::with_seed(7);
        let result = match_windows(&current, &reference, &params(50, 5, 4), &mut rng).unwrap();
        assert!(!result.matched);
        assert_eq!(result.window_index, None);
        assert_eq!(result.trials_run, 5, "never more than `trials` windows");
        assert_eq!(result.common_points, 0);
    }

    #[test]
    fn band_masking_everything_prevents_match() {
        let series = vec![281.0; 120];
        let mut rng = fastrand::Rng::with_seed(3);
        let result = match_windows(&series, &series, &params(50, 5, 4), &mut rng).unwrap();
        assert!(!result.matched);
        assert_eq!(result.trials_run, 5);
    }

    #[test]
    fn short_current_fails_without_drawing() {
        let current = signal(49);
        let reference = signal(300);
        let mut rng = fastrand::Rng::with_seed(11);
        let seed_before = rng.get_seed();
        let err = match_windows(&current, &reference, &params(50, 5, 4), &mut rng).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                current: 49,
                reference: 300,
                window_size: 50
            }
        );
        assert_eq!(rng.get_seed(), seed_before, "zero trials performed");
    }

    #[test]
    fn short_reference_also_fails() {
        let mut rng = fastrand::Rng::with_seed(11);
        let err = match_windows(&signal(300), &signal(10), &params(50, 5, 4), &mut rng);
        assert!(matches!(err, Err(AnalysisError::InsufficientData { .. })));
    }

    #[test]
    fn zero_window_or_trials_are_rejected() {
        let series = signal(100);
        let mut rng = fastrand::Rng::with_seed(0);
        assert!(matches!(
            match_windows(&series, &series, &params(0, 5, 4), &mut rng),
            Err(AnalysisError::InvalidParams(_))
        ));
        assert!(matches!(
            match_windows(&series, &series, &params(50, 0, 4), &mut rng),
            Err(AnalysisError::InvalidParams(_))
        ));
    }

    #[test]
    fn windows_stay_inside_the_series() {
        let current = signal(60);
        let reference: Vec<f64> = current.iter().map(|v| v + 50.0).collect();
        let mut rng = fastrand::Rng::with_seed(99);
        for _ in 0..200 {
            let result = match_windows(&current, &reference, &params(50, 3, 1), &mut rng).unwrap();
            assert!(result.start_index.unwrap() <= 10);
        }
        let exact = signal(50);
        let result = match_windows(&exact, &exact, &params(50, 1, 1), &mut rng).unwrap();
        assert_eq!(result.start_index, Some(0), "single possible window");
    }

    #[test]
    fn match_found_on_later_trial_when_only_a_segment_agrees() {
        // Seules les 50 dernières positions concordent : avec 60 positions et
        // 11 départs possibles, seul le départ 10 réussit.
        let mut current = signal(60);
        let reference = current.clone();
        for v in current.iter_mut().take(10) {
            *v += 500.0;
        }
        let strict = params(50, 200, 50);
        let mut rng = fastrand::Rng::with_seed(5);
        let result = match_windows(&current, &reference, &strict, &mut rng).unwrap();
        // P(aucun tirage sur 10 en 200 essais) = (10/11)^200 ≈ 5e-9
        assert!(result.matched);
        assert_eq!(result.start_index, Some(10));
        assert_eq!(result.window_index, Some(result.trials_run));
    }

    #[test]
    fn params_follow_config() {
        let config = GateConfig::default();
        let p = MatchParams::from_config(&config);
        assert_eq!(p.window_size, 50);
        assert_eq!(p.trials, 5);
        assert_eq!(p.min_common, 4);
        assert!(p.exclusion_band.contains(281.0));
    }
}
