//! Simple daily returns.
//!
//! `r[t] = p[t] / p[t-1] - 1`, computed independently for every price column.
//! The first row has no prior price and is dropped rather than filled.

use crate::{CapmError, PriceTable, Result, ReturnTable};
use polars::prelude::*;
use tracing::debug;

/// Compute the daily return of every price column.
///
/// Needs at least two rows ([`CapmError::InsufficientData`] otherwise). A zero
/// price anywhere before the last row would make the next ratio undefined and
/// fails with [`CapmError::DivisionByZero`] naming the column and date.
pub fn daily_return(table: &PriceTable) -> Result<ReturnTable> {
    let rows = table.height();
    if rows < 2 {
        return Err(CapmError::too_few_rows(2, rows));
    }

    let mut returns = Vec::new();
    for name in table.value_columns() {
        let prices = table.values(name)?;
        if let Some(idx) = prices[..rows - 1].iter().position(|&p| p == 0.0) {
            let date = table.dates()?.swap_remove(idx);
            return Err(CapmError::DivisionByZero {
                column: name.to_string(),
                date,
            });
        }
        debug!(column = name, rows, "computing daily returns");
        returns.push((col(name) / col(name).shift(lit(1)) - lit(1.0)).alias(name));
    }

    let frame = table
        .frame()
        .clone()
        .lazy()
        .with_columns(returns)
        .slice(1, (rows - 1) as IdxSize)
        .collect()?;

    Ok(ReturnTable::from_parts(frame, table.layout().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CapmConfig;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn table(aapl: &[f64], benchmark: &[f64]) -> PriceTable {
        let dates: Vec<String> = (0..aapl.len())
            .map(|day| format!("2024-03-{:02}", day + 1))
            .collect();
        let df = df![
            "date" => dates,
            "AAPL" => aapl,
            "benchmark" => benchmark,
        ]
        .unwrap();
        PriceTable::new(df, &CapmConfig::default()).unwrap()
    }

    #[test]
    fn test_daily_return_values() {
        let prices = table(&[50.0, 52.0, 50.0, 54.0], &[100.0, 102.0, 101.0, 103.0]);
        let returns = daily_return(&prices).unwrap();

        assert_eq!(returns.height(), 3);
        assert_eq!(
            returns.dates().unwrap(),
            vec!["2024-03-02", "2024-03-03", "2024-03-04"]
        );

        let expected_benchmark = [0.02, -0.009_803_921_568_627_45, 0.019_801_980_198_019_8];
        for (actual, expected) in returns.benchmark_values().unwrap().iter().zip(expected_benchmark) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-12);
        }

        let expected_aapl = [0.04, -0.038_461_538_461_538_46, 0.08];
        for (actual, expected) in returns.values("AAPL").unwrap().iter().zip(expected_aapl) {
            assert_abs_diff_eq!(*actual, expected, epsilon = 1e-12);
        }
    }

    #[rstest]
    #[case(2)]
    #[case(5)]
    #[case(30)]
    fn test_constant_series_has_zero_returns(#[case] rows: usize) {
        let prices = table(&vec![42.0; rows], &vec![100.0; rows]);
        let returns = daily_return(&prices).unwrap();

        assert_eq!(returns.height(), rows - 1);
        assert!(returns.values("AAPL").unwrap().iter().all(|r| *r == 0.0));
        assert_eq!(returns.benchmark_mean().unwrap(), 0.0);
    }

    #[test]
    fn test_zero_price_is_division_by_zero() {
        let prices = table(&[50.0, 0.0, 50.0], &[100.0, 102.0, 101.0]);
        let err = daily_return(&prices).unwrap_err();

        match err {
            CapmError::DivisionByZero { column, date } => {
                assert_eq!(column, "AAPL");
                assert_eq!(date, "2024-03-02");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_on_last_row_is_allowed() {
        // -100% is a valid return; nothing divides by the final price
        let prices = table(&[50.0, 25.0, 0.0], &[100.0, 102.0, 101.0]);
        let returns = daily_return(&prices).unwrap();
        assert_eq!(returns.values("AAPL").unwrap(), vec![-0.5, -1.0]);
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let prices = table(&[50.0], &[100.0]);
        let err = daily_return(&prices).unwrap_err();
        assert!(matches!(err, CapmError::InsufficientData(_)));
    }
}
