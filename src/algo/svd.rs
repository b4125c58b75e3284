use ndarray::{s, Array2};
use ndarray_linalg::SVD;

use crate::error::VectorizeError;

/// Uncentered truncated SVD projection `U_k Σ_k` of `x` onto its top
/// `components` singular directions.
///
/// Each component's sign is fixed so its largest absolute entry is positive,
/// making the output deterministic across LAPACK builds.
pub fn truncated_svd(x: &Array2<f64>, components: usize) -> Result<Array2<f64>, VectorizeError> {
    let (u, sigma, _) = x
        .svd(true, false)
        .map_err(|e| VectorizeError::Reduction(e.to_string()))?;
    let u = u.ok_or_else(|| VectorizeError::Reduction("no left singular vectors".into()))?;

    let k = components.min(sigma.len());
    let mut reduced = u.slice(s![.., ..k]).to_owned();
    for (j, mut column) in reduced.columns_mut().into_iter().enumerate() {
        let pivot = column
            .iter()
            .copied()
            .fold(0.0f64, |best, val| if val.abs() > best.abs() { val } else { best });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        column.mapv_inplace(|v| sign * v * sigma[j]);
    }
    Ok(reduced)
}
