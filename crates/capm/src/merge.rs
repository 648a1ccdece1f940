//! Align per-symbol price histories into a single [`PriceTable`].
//!
//! Each source series may cover different trading days. Only dates present
//! in every series (the benchmark included) survive the inner join.

use crate::{CapmConfig, CapmError, PriceTable, Result};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Price history of a single symbol.
///
/// Holds a date column and one `f64` price column named after the symbol.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    date_column: String,
    frame: DataFrame,
}

impl PriceSeries {
    /// Take `price_column` of `frame` as the history of `symbol`.
    pub fn from_frame(
        symbol: impl Into<String>,
        frame: DataFrame,
        date_column: &str,
        price_column: &str,
    ) -> Result<Self> {
        let symbol = symbol.into();
        for name in [date_column, price_column] {
            if frame.column(name).is_err() {
                return Err(CapmError::missing_column(name));
            }
        }
        let frame = frame
            .lazy()
            .select([
                col(date_column).cast(DataType::String),
                col(price_column)
                    .cast(DataType::Float64)
                    .alias(symbol.as_str()),
            ])
            .collect()?;

        Ok(Self {
            symbol,
            date_column: date_column.to_string(),
            frame,
        })
    }

    /// Build a series from parallel date and price vectors.
    pub fn from_points(
        symbol: impl Into<String>,
        dates: Vec<String>,
        prices: Vec<f64>,
    ) -> Result<Self> {
        let symbol = symbol.into();
        if dates.len() != prices.len() {
            return Err(CapmError::InvalidInput(format!(
                "series '{symbol}' has {} dates but {} prices",
                dates.len(),
                prices.len()
            )));
        }
        let frame = DataFrame::new(vec![
            Column::new("date".into(), dates),
            Column::new(symbol.as_str().into(), prices),
        ])?;
        Ok(Self {
            symbol,
            date_column: "date".to_string(),
            frame,
        })
    }

    /// Relabel the series, renaming its price column to `symbol`.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Result<Self> {
        let symbol = symbol.into();
        if symbol == self.date_column {
            return Err(CapmError::InvalidInput(format!(
                "symbol '{symbol}' collides with the date column"
            )));
        }
        self.frame.rename(&self.symbol, symbol.as_str().into())?;
        self.symbol = symbol;
        Ok(self)
    }

    /// Symbol this series belongs to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Underlying frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Rename columns to `date_column` and `value_column`.
    fn aligned(&self, date_column: &str, value_column: &str) -> LazyFrame {
        self.frame.clone().lazy().select([
            col(self.date_column.as_str()).alias(date_column),
            col(self.symbol.as_str()).alias(value_column),
        ])
    }
}

/// Inner-join instrument histories with the benchmark on date.
///
/// Instrument columns keep the order of `instruments` and the benchmark
/// becomes the last column, renamed to `config.benchmark_column`. Rows are
/// sorted by ascending date.
pub fn merge_series(
    benchmark: &PriceSeries,
    instruments: &[PriceSeries],
    config: &CapmConfig,
) -> Result<PriceTable> {
    if instruments.is_empty() {
        return Err(CapmError::InvalidInput(
            "at least one instrument series is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for series in instruments {
        let symbol = series.symbol();
        if symbol == config.benchmark_column
            || symbol == config.date_column
            || symbol == benchmark.symbol()
        {
            return Err(CapmError::InvalidInput(format!(
                "instrument symbol '{symbol}' collides with a reserved column"
            )));
        }
        if !seen.insert(symbol) {
            return Err(CapmError::InvalidInput(format!(
                "instrument '{symbol}' supplied more than once"
            )));
        }
    }

    let date = config.date_column.as_str();
    let on = [col(date)];
    let joined = instruments
        .iter()
        .map(|series| series.aligned(date, series.symbol()))
        .chain(std::iter::once(
            benchmark.aligned(date, &config.benchmark_column),
        ))
        .reduce(|merged, next| {
            merged.join(next, on.clone(), on.clone(), JoinArgs::new(JoinType::Inner))
        })
        .ok_or_else(|| CapmError::InvalidInput("nothing to merge".to_string()))?;

    let frame = joined
        .sort([date], SortMultipleOptions::default())
        .collect()?;

    for series in instruments.iter().chain(std::iter::once(benchmark)) {
        debug!(
            symbol = series.symbol(),
            observations = series.len(),
            "merged series"
        );
    }
    if frame.height() == 0 {
        return Err(CapmError::InvalidInput(
            "series share no common dates".to_string(),
        ));
    }
    info!(
        benchmark = benchmark.symbol(),
        instruments = instruments.len(),
        rows = frame.height(),
        "aligned price table"
    );

    PriceTable::new(frame, config)
}
