use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use crate::assumptions::{Assumptions, AssumptionsInput};
use crate::statement::{monthly_statement, MonthlyStatement};
use crate::types::{safe_divide, with_metadata, ComputationOutput, Money, Month, Rate};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Twelve monthly income statements in calendar order, built at one
/// effective growth rate. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    effective_growth_rate: Rate,
    rows: Vec<MonthlyStatement>,
}

impl Projection {
    pub fn effective_growth_rate(&self) -> Rate {
        self.effective_growth_rate
    }

    pub fn rows(&self) -> &[MonthlyStatement] {
        &self.rows
    }

    pub fn row(&self, month: Month) -> &MonthlyStatement {
        &self.rows[month.index()]
    }

    pub fn total_sales(&self) -> Money {
        self.rows.iter().map(|r| r.sales).sum()
    }

    pub fn total_net_profit(&self) -> Money {
        self.rows.iter().map(|r| r.net_profit).sum()
    }
}

/// A month singled out by net profit (best or worst of a projection).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthExtreme {
    pub month: Month,
    pub net_profit: Money,
    /// True when the month closes with a net loss
    pub is_loss: bool,
}

impl From<&MonthlyStatement> for MonthExtreme {
    fn from(row: &MonthlyStatement) -> Self {
        MonthExtreme {
            month: row.month,
            net_profit: row.net_profit,
            is_loss: row.net_profit < Decimal::ZERO,
        }
    }
}

/// Aggregate metrics across the 12 projected months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionSummary {
    pub total_sales: Money,
    pub total_gross_profit: Money,
    pub total_net_profit: Money,
    /// total_gross_profit / total_sales, zero without sales
    pub gross_margin: Rate,
    /// total_net_profit / total_sales, zero without sales
    pub net_margin: Rate,
    pub average_ebit: Money,
    pub best_month: MonthExtreme,
    pub worst_month: MonthExtreme,
    pub loss_months: usize,
}

/// Output of a single (realistic) projection run.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionOutput {
    pub projection: Projection,
    pub summary: ProjectionSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the 12-month projection at `effective_growth_rate`.
///
/// Every month is computed independently from its index, so row order is the
/// calendar order of [`Month::ALL`]. Fails when a month's figures overflow the
/// supported magnitude, so a built projection can always be totalled.
pub fn build_projection(
    assumptions: &Assumptions,
    effective_growth_rate: Rate,
) -> ForecastResult<Projection> {
    let rows = Month::ALL
        .iter()
        .map(|&month| monthly_statement(month, assumptions, effective_growth_rate))
        .collect::<ForecastResult<Vec<MonthlyStatement>>>()?;

    debug!(
        growth = %effective_growth_rate,
        seasonality = assumptions.seasonality_enabled(),
        events = assumptions.events_enabled(),
        "built 12-month projection"
    );

    Ok(Projection {
        effective_growth_rate,
        rows,
    })
}

/// Totals, margins and best/worst months of a projection. Ties on net profit
/// resolve to the earliest month.
pub fn summarize_projection(projection: &Projection) -> ProjectionSummary {
    let rows = projection.rows();

    let total_sales = projection.total_sales();
    let total_gross_profit: Money = rows.iter().map(|r| r.gross_profit).sum();
    let total_net_profit = projection.total_net_profit();
    let total_ebit: Money = rows.iter().map(|r| r.ebit).sum();

    ProjectionSummary {
        total_sales,
        total_gross_profit,
        total_net_profit,
        gross_margin: safe_divide(total_gross_profit, total_sales),
        net_margin: safe_divide(total_net_profit, total_sales),
        average_ebit: safe_divide(total_ebit, Decimal::from(rows.len())),
        best_month: pick_month(rows, |candidate, current| candidate > current),
        worst_month: pick_month(rows, |candidate, current| candidate < current),
        loss_months: rows.iter().filter(|r| r.net_profit < Decimal::ZERO).count(),
    }
}

/// Validate the assumptions and project the realistic case at the assumption
/// set's own growth rate.
pub fn project_income_statement(
    input: &AssumptionsInput,
) -> ForecastResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let assumptions = Assumptions::new(input)?;
    let projection = build_projection(&assumptions, assumptions.monthly_growth_rate())?;
    let summary = summarize_projection(&projection);

    for row in projection.rows() {
        if row.net_profit < Decimal::ZERO {
            warnings.push(format!(
                "{}: net loss of {} (net margin {}%)",
                row.month,
                (-row.net_profit).round_dp(2),
                (row.net_margin() * dec!(100)).round_dp(2)
            ));
        }
    }
    if summary.total_net_profit < Decimal::ZERO {
        warnings.push(format!(
            "Projected year closes with a net loss of {}",
            (-summary.total_net_profit).round_dp(2)
        ));
    }

    let output = ProjectionOutput {
        projection,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "12-Month Projected Income Statement (compound monthly growth)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Walk the rows in order and keep the first one no later row `replaces`.
fn pick_month(rows: &[MonthlyStatement], replaces: fn(Money, Money) -> bool) -> MonthExtreme {
    let mut chosen: Option<MonthExtreme> = None;
    for row in rows {
        match chosen {
            Some(current) if !replaces(row.net_profit, current.net_profit) => {}
            _ => chosen = Some(MonthExtreme::from(row)),
        }
    }
    chosen.unwrap_or(MonthExtreme {
        month: Month::Jan,
        net_profit: Decimal::ZERO,
        is_loss: false,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
