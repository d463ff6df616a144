use sg_core::series::OutlierReport;

/// Multiplicateur de l'IQR pour les bornes de Tukey.
const IQR_FENCE: f64 = 1.5;

/// Percentile `p` (0–100) d'une série triée, par interpolation linéaire.
///
/// `rank = p·(n-1)/100`, puis interpolation entre les statistiques d'ordre
/// `floor(rank)` et `ceil(rank)`. Retourne NaN pour une série vide.
///
/// # Example
/// ```
/// use sg_analysis::outliers::percentile;
/// let sorted = [1.0, 2.0, 3.0, 4.0];
/// assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
/// assert!((percentile(&sorted, 100.0) - 4.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = p.clamp(0.0, 100.0) * (sorted.len() - 1) as f64 / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Signale les valeurs strictement hors de `[Q1 - 1.5·IQR, Q3 + 1.5·IQR]`.
///
/// Déterministe. Avec un IQR nul, toute valeur différente des quartiles est
/// signalée. Une entrée vide viole le contrat de l'appelant : le rapport
/// est vide avec des bornes NaN.
///
/// # Example
/// ```
/// use sg_analysis::outliers::extract_outliers;
/// let report = extract_outliers(&[10.0, 11.0, 12.0, 11.0, 95.0, 10.0]);
/// assert_eq!(report.indices, vec![4]);
/// assert_eq!(report.values, vec![95.0]);
/// ```
#[must_use]
pub fn extract_outliers(values: &[f64]) -> OutlierReport {
    if values.is_empty() {
        log::warn!("Extraction d'outliers sur une série vide");
        return OutlierReport {
            lower: f64::NAN,
            upper: f64::NAN,
            ..OutlierReport::default()
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    let (indices, flagged): (Vec<usize>, Vec<f64>) = values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v < lower || v > upper)
        .map(|(i, &v)| (i, v))
        .unzip();

    log::debug!(
        "Q1={q1:.3} Q3={q3:.3} IQR={iqr:.3} → bornes [{lower:.3}, {upper:.3}], {} outliers",
        indices.len()
    );

    OutlierReport {
        indices,
        values: flagged,
        lower,
        upper,
    }
}
