//! Regression metrics used to judge a model offline.

use anyhow::bail;

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> anyhow::Result<()> {
    if y_true.len() != y_pred.len() {
        bail!(
            "length mismatch: {} targets vs {} predictions",
            y_true.len(),
            y_pred.len()
        );
    }
    if y_true.is_empty() {
        bail!("cannot score an empty sample");
    }
    Ok(())
}

/// Root mean squared error.
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> anyhow::Result<f64> {
    check_lengths(y_true, y_pred)?;
    let mse = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    Ok(mse.sqrt())
}

/// Coefficient of determination.
///
/// A constant target gives 1.0 for a perfect fit and 0.0 otherwise.
pub fn r2(y_true: &[f64], y_pred: &[f64]) -> anyhow::Result<f64> {
    check_lengths(y_true, y_pred)?;
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
