use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assumptions::Assumptions;
use crate::error::ForecastError;
use crate::types::{safe_divide, Money, Month, Rate};
use crate::ForecastResult;

/// Largest magnitude (1e26) any statement line may take. Twelve months of it,
/// and the difference between two such totals, still fit in a `Decimal`.
pub const MAX_LINE_ITEM: Money = dec!(100000000000000000000000000);

/// Income statement for a single projected month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatement {
    pub month: Month,
    pub sales: Money,
    pub cost_of_sales: Money,
    pub gross_profit: Money,
    pub operating_expense: Money,
    pub ebit: Money,
    pub financial_expense: Money,
    pub pre_tax_profit: Money,
    pub taxes: Money,
    pub net_profit: Money,
}

impl MonthlyStatement {
    /// Gross profit over sales, zero when there are no sales.
    pub fn gross_margin(&self) -> Rate {
        safe_divide(self.gross_profit, self.sales)
    }

    /// Net profit over sales, zero when there are no sales.
    pub fn net_margin(&self) -> Rate {
        safe_divide(self.net_profit, self.sales)
    }
}

/// Compute one month of the income statement.
///
/// Sales compound from `initial_sales` at `effective_growth_rate` anchored at
/// January, then the month's seasonality factor and accumulated event impact
/// are applied in that order. Cost ratios, expenses and the tax rate come
/// straight from the assumption set and do not vary by scenario.
///
/// Fails with `InvalidInput` when sales leave the `MAX_LINE_ITEM` range.
pub fn monthly_statement(
    month: Month,
    assumptions: &Assumptions,
    effective_growth_rate: Rate,
) -> ForecastResult<MonthlyStatement> {
    let mut sales = Decimal::ONE
        .checked_add(effective_growth_rate)
        .and_then(|base| compound(base, month.index()))
        .and_then(|growth| assumptions.initial_sales().checked_mul(growth));

    if let Some(factor) = assumptions.seasonality_factor(month) {
        sales = sales.and_then(|s| s.checked_mul(factor));
    }
    if let Some(impact) = assumptions.event_impact(month) {
        sales = sales.and_then(|s| s.checked_mul(Decimal::ONE.checked_add(impact)?));
    }

    let sales = bounded(sales, month, "sales")?;
    let cost_of_sales = bounded(
        sales.checked_mul(assumptions.cost_of_sales_ratio()),
        month,
        "cost_of_sales",
    )?;

    derive_statement(
        month,
        sales,
        cost_of_sales,
        assumptions.monthly_operating_expense(),
        assumptions.monthly_financial_expense(),
        assumptions.tax_rate(),
    )
}

/// Derive gross profit through net profit from the four source lines.
/// Taxes are only levied on a positive pre-tax profit.
///
/// Every source and derived line must stay within `MAX_LINE_ITEM`.
pub fn derive_statement(
    month: Month,
    sales: Money,
    cost_of_sales: Money,
    operating_expense: Money,
    financial_expense: Money,
    tax_rate: Rate,
) -> ForecastResult<MonthlyStatement> {
    let sales = bounded(Some(sales), month, "sales")?;
    let cost_of_sales = bounded(Some(cost_of_sales), month, "cost_of_sales")?;
    let operating_expense = bounded(Some(operating_expense), month, "operating_expense")?;
    let financial_expense = bounded(Some(financial_expense), month, "financial_expense")?;

    let gross_profit = bounded(sales.checked_sub(cost_of_sales), month, "gross_profit")?;
    let ebit = bounded(gross_profit.checked_sub(operating_expense), month, "ebit")?;
    let pre_tax_profit = bounded(ebit.checked_sub(financial_expense), month, "pre_tax_profit")?;
    let taxes = bounded(tax_on(pre_tax_profit, tax_rate), month, "taxes")?;
    let net_profit = bounded(pre_tax_profit.checked_sub(taxes), month, "net_profit")?;

    Ok(MonthlyStatement {
        month,
        sales,
        cost_of_sales,
        gross_profit,
        operating_expense,
        ebit,
        financial_expense,
        pre_tax_profit,
        taxes,
        net_profit,
    })
}

/// Tax on a pre-tax profit, `None` on overflow.
pub(crate) fn tax_on(pre_tax_profit: Money, tax_rate: Rate) -> Option<Money> {
    pre_tax_profit.max(Decimal::ZERO).checked_mul(tax_rate)
}

/// Accept a line that was computed without overflow and lies within
/// `MAX_LINE_ITEM`.
pub(crate) fn bounded(value: Option<Money>, month: Month, line: &str) -> ForecastResult<Money> {
    value
        .filter(|v| v.abs() <= MAX_LINE_ITEM)
        .ok_or_else(|| ForecastError::InvalidInput {
            field: line.to_string(),
            reason: format!("{month}: {line} exceeds the supported magnitude of {MAX_LINE_ITEM}"),
        })
}

/// Raise `base` to a small integer power by repeated multiplication,
/// keeping the result exact in decimal. `None` on overflow.
fn compound(base: Decimal, periods: usize) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..periods {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{AssumptionsInput, SpecialEvent};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn sample_input() -> AssumptionsInput {
        AssumptionsInput {
            initial_sales: dec!(50000),
            monthly_growth_rate: dec!(0.03),
            cost_of_sales_ratio: dec!(0.60),
            monthly_operating_expense: dec!(20000),
            monthly_financial_expense: dec!(1000),
            tax_rate: dec!(0.25),
            seasonality: None,
            special_events: None,
        }
    }

    fn sample_assumptions() -> Assumptions {
        Assumptions::new(&sample_input()).unwrap()
    }

    #[test]
    fn test_january_row_breaks_even_at_ebit() {
        let row = monthly_statement(Month::Jan, &sample_assumptions(), dec!(0.03)).unwrap();
        assert_eq!(
            row,
            MonthlyStatement {
                month: Month::Jan,
                sales: dec!(50000),
                cost_of_sales: dec!(30000),
                gross_profit: dec!(20000),
                operating_expense: dec!(20000),
                ebit: dec!(0),
                financial_expense: dec!(1000),
                pre_tax_profit: dec!(-1000),
                taxes: dec!(0),
                net_profit: dec!(-1000),
            }
        );
    }

    #[test]
    fn test_february_row_compounds_once() {
        let row = monthly_statement(Month::Feb, &sample_assumptions(), dec!(0.03)).unwrap();
        // 50000 * 1.03 = 51500
        assert_eq!(row.sales, dec!(51500));
        assert_eq!(row.cost_of_sales, dec!(30900));
        assert_eq!(row.gross_profit, dec!(20600));
        assert_eq!(row.ebit, dec!(600));
        assert_eq!(row.pre_tax_profit, dec!(-400));
        assert_eq!(row.taxes, dec!(0));
        assert_eq!(row.net_profit, dec!(-400));
    }

    #[test]
    fn test_taxes_levied_on_positive_profit() {
        let row = monthly_statement(Month::Dec, &sample_assumptions(), dec!(0.03)).unwrap();
        assert!(row.pre_tax_profit > Decimal::ZERO);
        assert_eq!(row.taxes, row.pre_tax_profit * dec!(0.25));
        assert_eq!(row.net_profit, row.pre_tax_profit - row.taxes);
    }

    #[test]
    fn test_december_compounds_eleven_times() {
        let row = monthly_statement(Month::Dec, &sample_assumptions(), dec!(0.03)).unwrap();
        let mut factor = Decimal::ONE;
        for _ in 0..11 {
            factor *= dec!(1.03);
        }
        assert_eq!(row.sales, dec!(50000) * factor);
    }

    #[test]
    fn test_seasonality_then_event_applied_multiplicatively() {
        let mut input = sample_input();
        input.seasonality = Some(BTreeMap::from([("Ene".to_string(), dec!(1.2))]));
        input.special_events = Some(vec![SpecialEvent {
            month: "Ene".into(),
            impact: dec!(0.10),
            name: None,
        }]);
        let a = Assumptions::new(&input).unwrap();
        let row = monthly_statement(Month::Jan, &a, dec!(0.03)).unwrap();
        // 50000 * 1.2 * 1.1
        assert_eq!(row.sales, dec!(66000));
    }

    #[test]
    fn test_unit_seasonality_reproduces_baseline() {
        let base = sample_assumptions();
        let mut input = sample_input();
        input.seasonality = Some(
            Month::ALL
                .iter()
                .map(|m| (m.label().to_string(), Decimal::ONE))
                .collect(),
        );
        let seasonal = Assumptions::new(&input).unwrap();
        for month in Month::ALL {
            assert_eq!(
                monthly_statement(month, &base, dec!(0.03)).unwrap(),
                monthly_statement(month, &seasonal, dec!(0.03)).unwrap()
            );
        }
    }

    #[test]
    fn test_calculator_is_pure() {
        let a = sample_assumptions();
        let first = monthly_statement(Month::Jun, &a, dec!(0.036)).unwrap();
        let second = monthly_statement(Month::Jun, &a, dec!(0.036)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_negative_growth_shrinks_sales() {
        let row = monthly_statement(Month::Mar, &sample_assumptions(), dec!(-0.10)).unwrap();
        // 50000 * 0.9^2
        assert_eq!(row.sales, dec!(40500));
    }

    #[test]
    fn test_derive_statement_matches_formulas() {
        let row = derive_statement(
            Month::Apr,
            dec!(48000),
            dec!(28800),
            dec!(19000),
            dec!(950),
            dec!(0.30),
        )
        .unwrap();
        assert_eq!(row.gross_profit, dec!(19200));
        assert_eq!(row.ebit, dec!(200));
        assert_eq!(row.pre_tax_profit, dec!(-750));
        assert_eq!(row.taxes, dec!(0));
        assert_eq!(row.net_profit, dec!(-750));
    }

    #[test]
    fn test_margins_zero_guarded() {
        let row = derive_statement(Month::Jan, dec!(0), dec!(0), dec!(100), dec!(0), dec!(0.25))
            .unwrap();
        assert_eq!(row.gross_margin(), Decimal::ZERO);
        assert_eq!(row.net_margin(), Decimal::ZERO);

        let row = monthly_statement(Month::Jan, &sample_assumptions(), dec!(0.03)).unwrap();
        assert_eq!(row.gross_margin(), dec!(0.4));
        assert_eq!(row.net_margin(), dec!(-0.02));
    }

    #[test]
    fn test_runaway_growth_is_rejected() {
        let mut input = sample_input();
        input.monthly_growth_rate = dec!(1000);
        let a = Assumptions::new(&input).unwrap();
        // 1001^11 no longer fits in a decimal
        let err = monthly_statement(Month::Dec, &a, dec!(1000)).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput { ref field, .. } if field == "sales"));
        // January has not compounded yet
        assert!(monthly_statement(Month::Jan, &a, dec!(1000)).is_ok());
    }

    #[test]
    fn test_line_items_beyond_bound_are_rejected() {
        let over = MAX_LINE_ITEM + Decimal::ONE;
        assert!(derive_statement(Month::Jan, over, dec!(0), dec!(0), dec!(0), dec!(0.25)).is_err());
        assert!(derive_statement(Month::Jan, dec!(0), over, dec!(0), dec!(0), dec!(0.25)).is_err());

        // Each line at the bound, but the derived loss goes past it
        let err = derive_statement(
            Month::Jan,
            dec!(0),
            MAX_LINE_ITEM,
            MAX_LINE_ITEM,
            dec!(0),
            dec!(0.25),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ebit"));

        let at_bound =
            derive_statement(Month::Jan, MAX_LINE_ITEM, dec!(0), dec!(0), dec!(0), dec!(1)).unwrap();
        assert_eq!(at_bound.net_profit, Decimal::ZERO);
    }
}
