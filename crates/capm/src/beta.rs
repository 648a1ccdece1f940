//! Market beta - systematic risk exposure.
//!
//! Beta is the slope of the ordinary least-squares line through the paired
//! (benchmark return, instrument return) samples:
//! `β = Cov(R_i, R_m) / Var(R_m)` and `α = mean(R_i) - β · mean(R_m)`.
//!
//! Beta = 1 means the instrument moves in line with the benchmark. Beta > 1
//! indicates amplified benchmark movements; beta < 0 an inverse relationship.

use crate::{CapmError, Result, ReturnTable};
use derive_more::Display;
use indexmap::IndexMap;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Slope and intercept of an instrument's returns regressed on benchmark
/// returns.
#[derive(Debug, Display, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[display("beta {beta:.4}, alpha {alpha:.6}")]
pub struct BetaEstimate {
    /// Sensitivity to benchmark returns (OLS slope).
    pub beta: f64,
    /// Return not explained by the benchmark (OLS intercept).
    pub alpha: f64,
}

/// Estimate beta and alpha for one instrument column of a return table.
pub fn estimate_beta(returns: &ReturnTable, instrument: &str) -> Result<BetaEstimate> {
    if instrument == returns.benchmark_column() {
        return Err(CapmError::InvalidInput(format!(
            "'{instrument}' is the benchmark, not an instrument"
        )));
    }
    let benchmark = returns.benchmark_values()?;
    let series = returns.values(instrument)?;
    let estimate = fit_line(&benchmark, &series)?;
    debug!(instrument, beta = estimate.beta, alpha = estimate.alpha, "estimated beta");
    Ok(estimate)
}

/// Estimate beta for every instrument of a return table.
///
/// A failing instrument is recorded under its name and does not stop the
/// others.
pub fn estimate_betas(returns: &ReturnTable) -> IndexMap<String, Result<BetaEstimate>> {
    returns
        .instruments()
        .into_iter()
        .map(|name| {
            let estimate = estimate_beta(returns, name);
            if let Err(err) = &estimate {
                warn!(instrument = name, error = %err, "beta estimation failed");
            }
            (name.to_string(), estimate)
        })
        .collect()
}

/// Fit `y ≈ alpha + beta * x` by ordinary least squares.
///
/// Needs at least two finite pairs and non-zero variance in `x`.
pub fn fit_line(x: &[f64], y: &[f64]) -> Result<BetaEstimate> {
    if x.len() != y.len() {
        return Err(CapmError::InvalidInput(format!(
            "paired samples differ in length: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(CapmError::too_few_rows(2, x.len()));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(CapmError::InvalidInput(
            "regression samples must be finite".to_string(),
        ));
    }

    let constant = x.iter().all(|v| *v == x[0]);

    let x = ArrayView1::from(x);
    let y = ArrayView1::from(y);
    let (Some(mean_x), Some(mean_y)) = (x.mean(), y.mean()) else {
        return Err(CapmError::too_few_rows(2, 0));
    };

    let dx = &x - mean_x;
    let dy = &y - mean_y;
    let var_x = dx.dot(&dx);
    // identical samples can leave a rounding residue after centering, and
    // distinct but tiny samples can square to zero
    if constant || var_x == 0.0 {
        return Err(CapmError::InsufficientData(
            "benchmark returns have zero variance".to_string(),
        ));
    }

    let beta = dx.dot(&dy) / var_x;
    Ok(BetaEstimate {
        beta,
        alpha: mean_y - beta * mean_x,
    })
}
