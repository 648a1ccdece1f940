#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod beta;
pub mod capm;
pub mod config;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod returns;
pub mod table;

// Re-export core types
pub use analysis::{
    AnalysisReport, CapmAnalysis, InstrumentAnalysis, InstrumentSummary, ReportSummary,
};
pub use beta::{BetaEstimate, estimate_beta, estimate_betas, fit_line};
pub use capm::{annualize, capm_return};
pub use config::{
    CapmConfig, DEFAULT_BENCHMARK_COLUMN, DEFAULT_DATE_COLUMN, TRADING_DAYS_PER_YEAR,
};
pub use error::{CapmError, Result};
pub use merge::{PriceSeries, merge_series};
pub use normalize::normalize;
pub use returns::daily_return;
pub use table::{PriceTable, ReturnTable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
