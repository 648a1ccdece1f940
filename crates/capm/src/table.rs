//! Validated price and return tables.
//!
//! Both tables wrap a polars [`DataFrame`] holding one ISO-8601 date column,
//! one `f64` column per instrument and exactly one benchmark column. Dates are
//! unique and ascending, so every column is aligned to the same trading days.

use crate::{CapmConfig, CapmError, Result};
use chrono::{Months, NaiveDate};
use polars::prelude::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Names of the structural columns of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) date: String,
    pub(crate) benchmark: String,
}

impl Layout {
    fn from_config(config: &CapmConfig) -> Self {
        Self {
            date: config.date_column.clone(),
            benchmark: config.benchmark_column.clone(),
        }
    }

    /// Every column other than the date, in frame order.
    fn value_columns<'a>(&self, frame: &'a DataFrame) -> Vec<&'a str> {
        frame
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .filter(|name| *name != self.date)
            .collect()
    }

    /// Value columns other than the benchmark, in frame order.
    fn instrument_columns<'a>(&self, frame: &'a DataFrame) -> Vec<&'a str> {
        self.value_columns(frame)
            .into_iter()
            .filter(|name| *name != self.benchmark)
            .collect()
    }
}

fn column<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Column> {
    frame
        .column(name)
        .map_err(|_| CapmError::missing_column(name))
}

fn dates(frame: &DataFrame, layout: &Layout) -> Result<Vec<String>> {
    Ok(column(frame, &layout.date)?
        .str()?
        .into_no_null_iter()
        .map(str::to_owned)
        .collect())
}

fn values(frame: &DataFrame, layout: &Layout, name: &str) -> Result<Vec<f64>> {
    if name == layout.date {
        return Err(CapmError::InvalidInput(format!(
            "'{name}' is the date column, not a value column"
        )));
    }
    Ok(column(frame, name)?.f64()?.into_no_null_iter().collect())
}

const fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

/// Aligned daily prices: one date column, one column per instrument and one
/// benchmark column.
#[derive(Debug, Clone)]
pub struct PriceTable {
    frame: DataFrame,
    layout: Layout,
}

impl PriceTable {
    /// Validate a frame and wrap it as a price table.
    ///
    /// The date column must hold unique, ascending ISO-8601 dates (a polars
    /// `Date` column is accepted and converted). Every other column must be
    /// numeric with no nulls and only finite values; integer columns are cast
    /// to `f64`. Zero-row tables are accepted here and rejected by the
    /// operations that need data.
    pub fn new(frame: DataFrame, config: &CapmConfig) -> Result<Self> {
        let layout = Layout::from_config(config);

        let date_dtype = column(&frame, &layout.date)?.dtype().clone();
        if !matches!(date_dtype, DataType::String | DataType::Date) {
            return Err(CapmError::InvalidInput(format!(
                "date column '{}' has type {date_dtype}, expected ISO-8601 strings",
                layout.date
            )));
        }
        column(&frame, &layout.benchmark)?;

        let mut casts = vec![col(layout.date.as_str()).cast(DataType::String)];
        for name in layout.value_columns(&frame) {
            let dtype = column(&frame, name)?.dtype();
            if !is_numeric(dtype) {
                return Err(CapmError::InvalidInput(format!(
                    "column '{name}' has non-numeric type {dtype}"
                )));
            }
            casts.push(col(name).cast(DataType::Float64));
        }
        let frame = frame.lazy().with_columns(casts).collect()?;

        validate_dates(&frame, &layout)?;
        for name in layout.value_columns(&frame) {
            let series = column(&frame, name)?;
            if series.null_count() > 0 {
                return Err(CapmError::InvalidInput(format!(
                    "column '{name}' contains {} missing prices",
                    series.null_count()
                )));
            }
            if series.f64()?.into_no_null_iter().any(|v| !v.is_finite()) {
                return Err(CapmError::InvalidInput(format!(
                    "column '{name}' contains non-finite prices"
                )));
            }
        }

        Ok(Self { frame, layout })
    }

    /// Rewrap a frame derived from this table without revalidating it.
    pub(crate) fn with_frame(&self, frame: DataFrame) -> Self {
        Self {
            frame,
            layout: self.layout.clone(),
        }
    }

    pub(crate) const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Underlying frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume the table and return its frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Number of dated rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Name of the date column.
    pub fn date_column(&self) -> &str {
        &self.layout.date
    }

    /// Name of the benchmark column.
    pub fn benchmark_column(&self) -> &str {
        &self.layout.benchmark
    }

    /// Instrument column names in table order.
    pub fn instruments(&self) -> Vec<&str> {
        self.layout.instrument_columns(&self.frame)
    }

    /// Every price column (instruments and benchmark) in table order.
    pub fn value_columns(&self) -> Vec<&str> {
        self.layout.value_columns(&self.frame)
    }

    /// Dates of every row.
    pub fn dates(&self) -> Result<Vec<String>> {
        dates(&self.frame, &self.layout)
    }

    /// Prices of one column.
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        values(&self.frame, &self.layout, name)
    }

    /// Benchmark prices.
    pub fn benchmark_values(&self) -> Result<Vec<f64>> {
        self.values(&self.layout.benchmark)
    }

    /// A table holding only the date and benchmark columns.
    pub fn benchmark_only(&self) -> Result<Self> {
        let frame = self
            .frame
            .select([self.layout.date.as_str(), self.layout.benchmark.as_str()])?;
        Ok(self.with_frame(frame))
    }

    /// A table holding the date, one instrument and the benchmark.
    pub fn select_instrument(&self, name: &str) -> Result<Self> {
        if name == self.layout.date || name == self.layout.benchmark {
            return Err(CapmError::InvalidInput(format!(
                "'{name}' is not an instrument column"
            )));
        }
        column(&self.frame, name)?;
        let frame = self.frame.select([
            self.layout.date.as_str(),
            name,
            self.layout.benchmark.as_str(),
        ])?;
        Ok(self.with_frame(frame))
    }

    /// Rows dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Result<Self> {
        let start = start.format(DATE_FORMAT).to_string();
        let frame = self
            .frame
            .clone()
            .lazy()
            .filter(col(self.layout.date.as_str()).gt_eq(lit(start)))
            .collect()?;
        Ok(self.with_frame(frame))
    }

    /// Rows within `years` calendar years of the last date.
    pub fn trailing_years(&self, years: u32) -> Result<Self> {
        let dates = self.dates()?;
        let Some(last) = dates.last() else {
            return Err(CapmError::InvalidInput(
                "cannot window an empty price table".to_string(),
            ));
        };
        let last = NaiveDate::parse_from_str(last, DATE_FORMAT).map_err(|err| {
            CapmError::InvalidInput(format!("unparseable date '{last}': {err}"))
        })?;
        let start = last
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        self.since(start)
    }
}

fn validate_dates(frame: &DataFrame, layout: &Layout) -> Result<()> {
    let dates = column(frame, &layout.date)?.str()?;
    if dates.null_count() > 0 {
        return Err(CapmError::InvalidInput(format!(
            "date column '{}' contains missing dates",
            layout.date
        )));
    }
    let mut previous: Option<&str> = None;
    for date in dates.into_no_null_iter() {
        if let Some(prev) = previous {
            if date <= prev {
                return Err(CapmError::InvalidInput(format!(
                    "dates must be unique and ascending, found '{date}' after '{prev}'"
                )));
            }
        }
        previous = Some(date);
    }
    Ok(())
}

/// Simple daily returns derived from a [`PriceTable`].
///
/// Has the same columns as its source and one fewer row: the first date has
/// no prior price and is dropped.
#[derive(Debug, Clone)]
pub struct ReturnTable {
    frame: DataFrame,
    layout: Layout,
}

impl ReturnTable {
    pub(crate) const fn from_parts(frame: DataFrame, layout: Layout) -> Self {
        Self { frame, layout }
    }

    /// Underlying frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume the table and return its frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Number of return rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Name of the date column.
    pub fn date_column(&self) -> &str {
        &self.layout.date
    }

    /// Name of the benchmark column.
    pub fn benchmark_column(&self) -> &str {
        &self.layout.benchmark
    }

    /// Instrument column names in table order.
    pub fn instruments(&self) -> Vec<&str> {
        self.layout.instrument_columns(&self.frame)
    }

    /// Dates of every return row.
    pub fn dates(&self) -> Result<Vec<String>> {
        dates(&self.frame, &self.layout)
    }

    /// Returns of one column.
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        values(&self.frame, &self.layout, name)
    }

    /// Benchmark returns.
    pub fn benchmark_values(&self) -> Result<Vec<f64>> {
        self.values(&self.layout.benchmark)
    }

    /// Mean daily benchmark return.
    pub fn benchmark_mean(&self) -> Result<f64> {
        let returns = self.benchmark_values()?;
        if returns.is_empty() {
            return Err(CapmError::too_few_rows(1, 0));
        }
        Ok(returns.iter().sum::<f64>() / returns.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df![
            "date" => ["2024-01-02", "2024-01-03", "2024-01-04"],
            "AAPL" => [185.0, 184.0, 181.5],
            "MSFT" => [370, 368, 367],
            "benchmark" => [4742.8, 4704.8, 4688.7],
        ]
        .unwrap()
    }

    #[test]
    fn test_price_table_columns() {
        let table = PriceTable::new(sample(), &CapmConfig::default()).unwrap();

        assert_eq!(table.height(), 3);
        assert_eq!(table.instruments(), vec!["AAPL", "MSFT"]);
        assert_eq!(table.value_columns(), vec!["AAPL", "MSFT", "benchmark"]);
        assert_eq!(table.values("MSFT").unwrap(), vec![370.0, 368.0, 367.0]);
        assert_eq!(table.dates().unwrap()[2], "2024-01-04");
    }

    #[test]
    fn test_missing_benchmark_column() {
        let config = CapmConfig::default().with_benchmark_column("sp500");
        let err = PriceTable::new(sample(), &config).unwrap_err();
        assert!(matches!(err, CapmError::InvalidInput(msg) if msg.contains("sp500")));
    }

    #[test]
    fn test_unordered_dates_rejected() {
        let df = df![
            "date" => ["2024-01-03", "2024-01-02"],
            "benchmark" => [1.0, 2.0],
        ]
        .unwrap();
        let err = PriceTable::new(df, &CapmConfig::default()).unwrap_err();
        assert!(matches!(err, CapmError::InvalidInput(_)));
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let df = df![
            "date" => ["2024-01-02", "2024-01-02"],
            "benchmark" => [1.0, 2.0],
        ]
        .unwrap();
        assert!(PriceTable::new(df, &CapmConfig::default()).is_err());
    }

    #[test]
    fn test_missing_price_rejected() {
        let df = df![
            "date" => ["2024-01-02", "2024-01-03"],
            "AAPL" => [Some(1.0), None],
            "benchmark" => [1.0, 2.0],
        ]
        .unwrap();
        let err = PriceTable::new(df, &CapmConfig::default()).unwrap_err();
        assert!(matches!(err, CapmError::InvalidInput(msg) if msg.contains("AAPL")));
    }

    #[test]
    fn test_narrow_integer_columns_cast() {
        let df = df![
            "date" => ["2024-01-02", "2024-01-03", "2024-01-04"],
            "AAPL" => [185i16, 184, 181],
            "MSFT" => [120u8, 118, 117],
            "KO" => [60i8, 61, 59],
            "benchmark" => [4742u16, 4704, 4688],
        ]
        .unwrap();
        let table = PriceTable::new(df, &CapmConfig::default()).unwrap();

        assert_eq!(table.values("AAPL").unwrap(), vec![185.0, 184.0, 181.0]);
        assert_eq!(table.values("MSFT").unwrap(), vec![120.0, 118.0, 117.0]);
        assert_eq!(table.values("KO").unwrap(), vec![60.0, 61.0, 59.0]);
        assert_eq!(table.benchmark_values().unwrap()[0], 4742.0);
        assert_eq!(table.frame().column("AAPL").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_non_numeric_column_rejected() {
        let df = df![
            "date" => ["2024-01-02"],
            "name" => ["Apple"],
            "benchmark" => [1.0],
        ]
        .unwrap();
        assert!(PriceTable::new(df, &CapmConfig::default()).is_err());
    }

    #[test]
    fn test_select_instrument() {
        let table = PriceTable::new(sample(), &CapmConfig::default()).unwrap();
        let pair = table.select_instrument("MSFT").unwrap();

        assert_eq!(pair.instruments(), vec!["MSFT"]);
        assert_eq!(pair.height(), 3);
        assert!(table.select_instrument("benchmark").is_err());
        assert!(table.select_instrument("TSLA").is_err());
        assert!(table.benchmark_only().unwrap().instruments().is_empty());
    }

    #[test]
    fn test_since_and_trailing_years() {
        let df = df![
            "date" => ["2021-06-30", "2022-12-30", "2023-07-03", "2024-06-28"],
            "benchmark" => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();
        let table = PriceTable::new(df, &CapmConfig::default()).unwrap();

        let since = table
            .since(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
            .unwrap();
        assert_eq!(since.height(), 2);

        let trailing = table.trailing_years(2).unwrap();
        assert_eq!(
            trailing.dates().unwrap(),
            vec!["2022-12-30", "2023-07-03", "2024-06-28"]
        );
    }
}
