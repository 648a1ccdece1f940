//! End-to-end CAPM analysis over a price table.
//!
//! The benchmark is analysed once for the whole table. Each instrument is then
//! processed on its own: a zero price or a degenerate series in one
//! instrument is recorded against that instrument and the rest of the batch
//! carries on.

use crate::{
    BetaEstimate, CapmConfig, CapmError, PriceTable, Result, annualize, daily_return,
    estimate_beta,
};
use indexmap::IndexMap;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Beta and expected return of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InstrumentAnalysis {
    /// Regression of the instrument's returns on the benchmark's.
    pub beta: BetaEstimate,
    /// CAPM expected annual return.
    pub expected_return: f64,
}

/// Runs the return, beta and CAPM pipeline.
#[derive(Debug, Clone, Default)]
pub struct CapmAnalysis {
    config: CapmConfig,
}

impl CapmAnalysis {
    /// Create an analysis with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analysis with a custom configuration.
    pub const fn with_config(config: CapmConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub const fn config(&self) -> &CapmConfig {
        &self.config
    }

    /// Analyse every instrument of `table`.
    ///
    /// Fails only when the benchmark itself cannot be analysed; instrument
    /// failures are recorded in the report.
    pub fn run(&self, table: &PriceTable) -> Result<AnalysisReport> {
        let benchmark_returns = daily_return(&table.benchmark_only()?)?;
        let market_mean_daily_return = benchmark_returns.benchmark_mean()?;
        let market_return = annualize(market_mean_daily_return, self.config.trading_days);
        debug!(market_mean_daily_return, market_return, "benchmark analysed");

        let mut instruments = IndexMap::new();
        for name in table.instruments() {
            let outcome = self.analyze_instrument(table, name, market_mean_daily_return);
            match &outcome {
                Ok(analysis) => debug!(
                    instrument = name,
                    beta = analysis.beta.beta,
                    expected_return = analysis.expected_return,
                    "instrument analysed"
                ),
                Err(err) => warn!(instrument = name, error = %err, "skipping instrument"),
            }
            instruments.insert(name.to_string(), outcome);
        }

        let report = AnalysisReport {
            market_mean_daily_return,
            market_return,
            risk_free_rate: self.config.risk_free_rate,
            instruments,
        };
        info!(
            analysed = report.successes().count(),
            skipped = report.failures().len(),
            "analysis complete"
        );
        Ok(report)
    }

    fn analyze_instrument(
        &self,
        table: &PriceTable,
        name: &str,
        market_mean_daily_return: f64,
    ) -> Result<InstrumentAnalysis> {
        let returns = daily_return(&table.select_instrument(name)?)?;
        let beta = estimate_beta(&returns, name)?;
        Ok(InstrumentAnalysis {
            beta,
            expected_return: self
                .config
                .expected_return(beta.beta, market_mean_daily_return),
        })
    }
}

/// Outcome of a [`CapmAnalysis`] run.
#[derive(Debug)]
pub struct AnalysisReport {
    /// Mean daily benchmark return.
    pub market_mean_daily_return: f64,
    /// Annualized benchmark return.
    pub market_return: f64,
    /// Risk-free rate used for the expected returns.
    pub risk_free_rate: f64,
    /// Per-instrument outcome, in table order.
    pub instruments: IndexMap<String, Result<InstrumentAnalysis>>,
}

impl AnalysisReport {
    /// Successfully analysed instruments, in table order.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &InstrumentAnalysis)> {
        self.instruments
            .iter()
            .filter_map(|(name, outcome)| outcome.as_ref().ok().map(|a| (name.as_str(), a)))
    }

    /// Instruments that could not be analysed, with the reason.
    pub fn failures(&self) -> Vec<(&str, &CapmError)> {
        self.instruments
            .iter()
            .filter_map(|(name, outcome)| outcome.as_ref().err().map(|e| (name.as_str(), e)))
            .collect()
    }

    /// Beta estimates keyed by instrument.
    pub fn betas(&self) -> IndexMap<String, BetaEstimate> {
        self.successes()
            .map(|(name, analysis)| (name.to_string(), analysis.beta))
            .collect()
    }

    /// CAPM expected returns keyed by instrument.
    pub fn expected_returns(&self) -> IndexMap<String, f64> {
        self.successes()
            .map(|(name, analysis)| (name.to_string(), analysis.expected_return))
            .collect()
    }

    /// Display table with columns `Stock`, `Beta Value`, `Alpha Value`,
    /// rounded to two decimals.
    pub fn beta_frame(&self) -> Result<DataFrame> {
        let (names, (betas, alphas)): (Vec<&str>, (Vec<f64>, Vec<f64>)) = self
            .successes()
            .map(|(name, a)| (name, (round2(a.beta.beta), round2(a.beta.alpha))))
            .unzip();
        Ok(df![
            "Stock" => names,
            "Beta Value" => betas,
            "Alpha Value" => alphas,
        ]?)
    }

    /// Display table with columns `Stock`, `Return Value`, rounded to two
    /// decimals.
    pub fn return_frame(&self) -> Result<DataFrame> {
        let (names, returns): (Vec<&str>, Vec<f64>) = self
            .successes()
            .map(|(name, a)| (name, round2(a.expected_return)))
            .unzip();
        Ok(df![
            "Stock" => names,
            "Return Value" => returns,
        ]?)
    }

    /// Serializable view of the report.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            market_return: self.market_return,
            risk_free_rate: self.risk_free_rate,
            instruments: self
                .instruments
                .iter()
                .map(|(name, outcome)| {
                    let summary = match outcome {
                        Ok(analysis) => InstrumentSummary {
                            beta: Some(analysis.beta.beta),
                            alpha: Some(analysis.beta.alpha),
                            expected_return: Some(analysis.expected_return),
                            error: None,
                        },
                        Err(err) => InstrumentSummary {
                            error: Some(err.to_string()),
                            ..InstrumentSummary::default()
                        },
                    };
                    (name.clone(), summary)
                })
                .collect(),
        }
    }
}

/// Serializable summary of an [`AnalysisReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Annualized benchmark return.
    pub market_return: f64,
    /// Risk-free rate.
    pub risk_free_rate: f64,
    /// Per-instrument results, in table order.
    pub instruments: IndexMap<String, InstrumentSummary>,
}

/// Result or failure of one instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstrumentSummary {
    /// OLS slope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// OLS intercept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    /// CAPM expected annual return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_return: Option<f64>,
    /// Why the instrument was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Round half away from zero to two decimals.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
