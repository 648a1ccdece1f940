//! Analysis configuration.

use serde::{Deserialize, Serialize};

/// Trading days per year used to annualize daily returns.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Default name of the benchmark price column.
pub const DEFAULT_BENCHMARK_COLUMN: &str = "benchmark";

/// Default name of the date column.
pub const DEFAULT_DATE_COLUMN: &str = "date";

/// Configuration shared by the table constructors and the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapmConfig {
    /// Annual risk-free rate plugged into the CAPM formula.
    pub risk_free_rate: f64,
    /// Number of trading days used to annualize the mean benchmark return.
    pub trading_days: u32,
    /// Name of the benchmark price column.
    pub benchmark_column: String,
    /// Name of the date column (ISO-8601 strings).
    pub date_column: String,
}

impl Default for CapmConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            trading_days: TRADING_DAYS_PER_YEAR,
            benchmark_column: DEFAULT_BENCHMARK_COLUMN.to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
        }
    }
}

impl CapmConfig {
    /// Set the annual risk-free rate.
    pub const fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    /// Set the annualization factor.
    pub const fn with_trading_days(mut self, trading_days: u32) -> Self {
        self.trading_days = trading_days;
        self
    }

    /// Set the benchmark column name.
    pub fn with_benchmark_column(mut self, name: impl Into<String>) -> Self {
        self.benchmark_column = name.into();
        self
    }

    /// Set the date column name.
    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CapmConfig::default();
        assert_eq!(config.risk_free_rate, 0.0);
        assert_eq!(config.trading_days, 252);
        assert_eq!(config.benchmark_column, "benchmark");
        assert_eq!(config.date_column, "date");
    }

    #[test]
    fn test_custom_config() {
        let config = CapmConfig::default()
            .with_risk_free_rate(0.04)
            .with_trading_days(250)
            .with_benchmark_column("sp500")
            .with_date_column("Date");
        assert_eq!(config.risk_free_rate, 0.04);
        assert_eq!(config.trading_days, 250);
        assert_eq!(config.benchmark_column, "sp500");
        assert_eq!(config.date_column, "Date");
    }
}
