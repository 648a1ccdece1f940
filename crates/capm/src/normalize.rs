//! Rebase price series to a common starting value.

use crate::{CapmError, PriceTable, Result};
use polars::prelude::*;
use tracing::debug;

/// Divide every price column by its first-row value so each series starts
/// at 1.0.
///
/// The input is not modified. Fails with [`CapmError::InvalidInput`] on an
/// empty table and with [`CapmError::DivisionByZero`] when a column starts at
/// zero.
pub fn normalize(table: &PriceTable) -> Result<PriceTable> {
    if table.is_empty() {
        return Err(CapmError::InvalidInput(
            "cannot normalize an empty price table".to_string(),
        ));
    }

    let mut frame = table.frame().clone();
    for name in table.value_columns() {
        let prices = table.values(name)?;
        let base = prices[0];
        if base == 0.0 {
            let date = table.dates()?.swap_remove(0);
            return Err(CapmError::DivisionByZero {
                column: name.to_string(),
                date,
            });
        }
        debug!(column = name, base, "rebasing series");
        // element-wise division keeps the first row at exactly 1.0
        let rebased: Vec<f64> = prices.iter().map(|p| p / base).collect();
        frame.with_column(Column::new(name.into(), rebased))?;
    }

    Ok(table.with_frame(frame))
}
