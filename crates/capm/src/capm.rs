//! Capital Asset Pricing Model expected returns.
//!
//! `E[R_i] = R_f + β_i · (R_m - R_f)` where `R_m` is the benchmark's mean
//! daily return annualized over `trading_days`.

use crate::{BetaEstimate, CapmConfig};
use indexmap::IndexMap;

/// Annualize a mean daily return by simple scaling.
pub fn annualize(mean_daily_return: f64, trading_days: u32) -> f64 {
    mean_daily_return * f64::from(trading_days)
}

/// Expected annual return of an instrument with the given beta.
pub fn capm_return(
    beta: f64,
    market_mean_daily_return: f64,
    risk_free_rate: f64,
    trading_days: u32,
) -> f64 {
    let market_return = annualize(market_mean_daily_return, trading_days);
    risk_free_rate + beta * (market_return - risk_free_rate)
}

impl CapmConfig {
    /// Expected annual return using this configuration's risk-free rate and
    /// annualization factor.
    pub fn expected_return(&self, beta: f64, market_mean_daily_return: f64) -> f64 {
        capm_return(
            beta,
            market_mean_daily_return,
            self.risk_free_rate,
            self.trading_days,
        )
    }

    /// Expected annual return for every estimated beta, keyed like the input.
    pub fn expected_returns(
        &self,
        betas: &IndexMap<String, BetaEstimate>,
        market_mean_daily_return: f64,
    ) -> IndexMap<String, f64> {
        betas
            .iter()
            .map(|(name, estimate)| {
                (
                    name.clone(),
                    self.expected_return(estimate.beta, market_mean_daily_return),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0004)]
    #[case(-0.0011)]
    #[case(0.0)]
    fn test_unit_beta_earns_market(#[case] m: f64) {
        assert_eq!(capm_return(1.0, m, 0.0, 252), m * 252.0);
    }

    #[rstest]
    #[case(0.0, 0.0005)]
    #[case(0.045, 0.002)]
    #[case(0.03, -0.004)]
    fn test_zero_beta_earns_risk_free(#[case] rf: f64, #[case] m: f64) {
        assert_eq!(capm_return(0.0, m, rf, 252), rf);
    }

    #[test]
    fn test_capm_with_risk_free_rate() {
        // R_m = 0.0005 * 252 = 0.126
        let expected = capm_return(1.2, 0.0005, 0.04, 252);
        assert_relative_eq!(expected, 0.04 + 1.2 * (0.126 - 0.04), epsilon = 1e-12);
    }

    #[test]
    fn test_config_expected_returns() {
        let config = CapmConfig::default().with_trading_days(250);
        let mut betas = IndexMap::new();
        betas.insert("TSLA".to_string(), BetaEstimate { beta: 2.0, alpha: 0.0 });
        betas.insert("KO".to_string(), BetaEstimate { beta: 0.5, alpha: 0.0 });

        let returns = config.expected_returns(&betas, 0.001);
        assert_eq!(returns.keys().collect::<Vec<_>>(), vec!["TSLA", "KO"]);
        assert_relative_eq!(returns["TSLA"], 0.5, epsilon = 1e-12);
        assert_relative_eq!(returns["KO"], 0.125, epsilon = 1e-12);
    }
}
