use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, warn};

use crate::assumptions::{Assumptions, AssumptionsInput};
use crate::error::ForecastError;
use crate::projection::build_projection;
use crate::statement::{bounded, tax_on, MonthlyStatement};
use crate::types::{with_metadata, ComputationOutput, Money, Month, Rate, MONTHS_IN_YEAR};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Required columns of an actuals table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Month,
    Sales,
    CostOfSales,
    OperatingExpense,
    FinancialExpense,
}

impl Column {
    pub const REQUIRED: [Column; 5] = [
        Column::Month,
        Column::Sales,
        Column::CostOfSales,
        Column::OperatingExpense,
        Column::FinancialExpense,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Month => "month",
            Column::Sales => "sales",
            Column::CostOfSales => "cost_of_sales",
            Column::OperatingExpense => "operating_expense",
            Column::FinancialExpense => "financial_expense",
        }
    }

    /// Normalized header spellings accepted for this column.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Month => &["month", "mes"],
            Column::Sales => &["sales", "ventas"],
            Column::CostOfSales => &["cost_of_sales", "costo_de_ventas"],
            Column::OperatingExpense => &[
                "operating_expense",
                "operating_expenses",
                "gastos_operativos",
            ],
            Column::FinancialExpense => &[
                "financial_expense",
                "financial_expenses",
                "gastos_financieros",
            ],
        }
    }

    fn matches(self, header: &str) -> bool {
        let normalized = normalize_header(header);
        self.aliases().contains(&normalized.as_str())
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

// ---------------------------------------------------------------------------
// Validated table
// ---------------------------------------------------------------------------

/// One month of observed figures. Cells that could not be read as numbers
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActualRow {
    pub month: Month,
    pub sales: Option<Money>,
    pub cost_of_sales: Option<Money>,
    pub operating_expense: Option<Money>,
    pub financial_expense: Option<Money>,
}

/// A numeric cell that was present but unreadable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IgnoredCell {
    /// 1-based data row
    pub row: usize,
    pub column: String,
    pub value: String,
}

/// Actuals validated against the fixed schema: every required column present,
/// at most 12 rows, each month at most once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActualsTable {
    rows: Vec<ActualRow>,
    ignored_cells: Vec<IgnoredCell>,
}

impl ActualsTable {
    /// Validate loosely-typed rows, e.g. parsed from a spreadsheet or CSV.
    pub fn from_rows(rows: &[Map<String, Value>]) -> ForecastResult<Self> {
        parse_table(rows).inspect_err(|e| warn!(error = %e, "rejected actuals table"))
    }

    pub fn rows(&self) -> &[ActualRow] {
        &self.rows
    }

    pub fn ignored_cells(&self) -> &[IgnoredCell] {
        &self.ignored_cells
    }
}

fn parse_table(rows: &[Map<String, Value>]) -> ForecastResult<ActualsTable> {
    if rows.is_empty() {
        return Err(ForecastError::InsufficientData(
            "Actuals table has no rows".into(),
        ));
    }
    if rows.len() > MONTHS_IN_YEAR {
        return Err(ForecastError::InvalidInput {
            field: "actuals".into(),
            reason: format!("At most {MONTHS_IN_YEAR} rows allowed, got {}", rows.len()),
        });
    }

    let mut seen: BTreeSet<Month> = BTreeSet::new();
    let mut parsed = Vec::with_capacity(rows.len());
    let mut ignored_cells = Vec::new();

    for (i, raw) in rows.iter().enumerate() {
        let row_no = i + 1;
        let cell = |column: Column| -> ForecastResult<(&String, &Value)> {
            raw.iter()
                .find(|(header, _)| column.matches(header))
                .ok_or_else(|| ForecastError::MissingColumn(column.name().into()))
        };

        let (_, month_value) = cell(Column::Month)?;
        let month = parse_month_cell(row_no, month_value)?;
        if !seen.insert(month) {
            return Err(ForecastError::MalformedData {
                row: row_no,
                reason: format!("Month {month} appears more than once"),
            });
        }

        let mut number = |column: Column| -> ForecastResult<Option<Money>> {
            let (header, value) = cell(column)?;
            let amount = coerce_number(value);
            if amount.is_none() && !is_blank(value) {
                ignored_cells.push(IgnoredCell {
                    row: row_no,
                    column: header.clone(),
                    value: display_cell(value),
                });
            }
            Ok(amount)
        };

        parsed.push(ActualRow {
            month,
            sales: number(Column::Sales)?,
            cost_of_sales: number(Column::CostOfSales)?,
            operating_expense: number(Column::OperatingExpense)?,
            financial_expense: number(Column::FinancialExpense)?,
        });
    }

    debug!(
        rows = parsed.len(),
        ignored = ignored_cells.len(),
        "parsed actuals table"
    );

    Ok(ActualsTable {
        rows: parsed,
        ignored_cells,
    })
}

fn parse_month_cell(row: usize, value: &Value) -> ForecastResult<Month> {
    let label = match value {
        Value::String(s) => s.as_str(),
        other => {
            return Err(ForecastError::MalformedData {
                row,
                reason: format!("Month cell must be a label, got {other}"),
            })
        }
    };
    label.parse().map_err(|_| ForecastError::MalformedData {
        row,
        reason: format!("'{label}' is not a month label"),
    })
}

/// Read a cell as a number the way a spreadsheet coercion would; anything
/// unreadable is treated as no value.
fn coerce_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn display_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Income statement derived from actuals. A missing source cell leaves every
/// line that depends on it empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActualStatement {
    pub month: Month,
    pub sales: Option<Money>,
    pub cost_of_sales: Option<Money>,
    pub gross_profit: Option<Money>,
    pub operating_expense: Option<Money>,
    pub ebit: Option<Money>,
    pub financial_expense: Option<Money>,
    pub pre_tax_profit: Option<Money>,
    pub taxes: Option<Money>,
    pub net_profit: Option<Money>,
}

impl ActualStatement {
    /// The full statement, when no line is missing.
    pub fn complete(&self) -> Option<MonthlyStatement> {
        Some(MonthlyStatement {
            month: self.month,
            sales: self.sales?,
            cost_of_sales: self.cost_of_sales?,
            gross_profit: self.gross_profit?,
            operating_expense: self.operating_expense?,
            ebit: self.ebit?,
            financial_expense: self.financial_expense?,
            pre_tax_profit: self.pre_tax_profit?,
            taxes: self.taxes?,
            net_profit: self.net_profit?,
        })
    }
}

/// Sums over the reported values of each line; missing cells are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActualTotals {
    pub months_reported: usize,
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

/// Apply the projection's derivation (gross profit through net profit) to
/// actual figures, using the same tax rate. Reported cells are held to the
/// same magnitude bound as projected lines.
pub fn derive_actuals(
    table: &ActualsTable,
    tax_rate: Rate,
) -> ForecastResult<Vec<ActualStatement>> {
    table
        .rows()
        .iter()
        .map(|row| {
            let month = row.month;
            let reported = |value: Option<Money>, line: &str| {
                value.map(|v| bounded(Some(v), month, line)).transpose()
            };
            let sales = reported(row.sales, "sales")?;
            let cost_of_sales = reported(row.cost_of_sales, "cost_of_sales")?;
            let operating_expense = reported(row.operating_expense, "operating_expense")?;
            let financial_expense = reported(row.financial_expense, "financial_expense")?;

            let gross_profit = sales
                .zip(cost_of_sales)
                .map(|(s, c)| bounded(s.checked_sub(c), month, "gross_profit"))
                .transpose()?;
            let ebit = gross_profit
                .zip(operating_expense)
                .map(|(g, o)| bounded(g.checked_sub(o), month, "ebit"))
                .transpose()?;
            let pre_tax_profit = ebit
                .zip(financial_expense)
                .map(|(e, f)| bounded(e.checked_sub(f), month, "pre_tax_profit"))
                .transpose()?;
            let taxes = pre_tax_profit
                .map(|p| bounded(tax_on(p, tax_rate), month, "taxes"))
                .transpose()?;
            let net_profit = pre_tax_profit
                .zip(taxes)
                .map(|(p, t)| bounded(p.checked_sub(t), month, "net_profit"))
                .transpose()?;

            Ok(ActualStatement {
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
        })
        .collect()
}

pub fn total_actuals(statements: &[ActualStatement]) -> ActualTotals {
    fn sum(values: impl Iterator<Item = Option<Money>>) -> Money {
        values.flatten().sum()
    }

    ActualTotals {
        months_reported: statements.len(),
        sales: sum(statements.iter().map(|s| s.sales)),
        cost_of_sales: sum(statements.iter().map(|s| s.cost_of_sales)),
        gross_profit: sum(statements.iter().map(|s| s.gross_profit)),
        operating_expense: sum(statements.iter().map(|s| s.operating_expense)),
        ebit: sum(statements.iter().map(|s| s.ebit)),
        financial_expense: sum(statements.iter().map(|s| s.financial_expense)),
        pre_tax_profit: sum(statements.iter().map(|s| s.pre_tax_profit)),
        taxes: sum(statements.iter().map(|s| s.taxes)),
        net_profit: sum(statements.iter().map(|s| s.net_profit)),
    }
}

// ---------------------------------------------------------------------------
// Projected vs actual
// ---------------------------------------------------------------------------

/// Projected vs actual figures for one reported month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthVariance {
    pub month: Month,
    pub projected_sales: Money,
    pub actual_sales: Option<Money>,
    /// actual - projected
    pub sales_variance: Option<Money>,
    pub projected_net_profit: Money,
    pub actual_net_profit: Option<Money>,
    /// actual - projected
    pub net_profit_variance: Option<Money>,
    /// True when actual net profit meets or beats the projection
    pub favorable: Option<bool>,
    pub projected_gross_margin: Rate,
    pub projected_net_margin: Rate,
    /// Only for months with every actual line reported
    pub actual_gross_margin: Option<Rate>,
    pub actual_net_margin: Option<Rate>,
}

/// Input for a projected-vs-actual comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub assumptions: AssumptionsInput,
    /// Rows with month, sales, cost_of_sales, operating_expense and
    /// financial_expense columns (Spanish headers accepted)
    pub actuals: Vec<Map<String, Value>>,
}

/// Output of a projected-vs-actual comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonOutput {
    pub actuals: Vec<ActualStatement>,
    pub totals: ActualTotals,
    pub variances: Vec<MonthVariance>,
}

/// Validate assumptions and actuals, derive the actual statements, and
/// compare them month by month against the realistic projection.
pub fn compare_with_actuals(
    input: &ComparisonInput,
) -> ForecastResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let assumptions = Assumptions::new(&input.assumptions)?;
    let table = ActualsTable::from_rows(&input.actuals)?;
    let projection = build_projection(&assumptions, assumptions.monthly_growth_rate())?;

    for cell in table.ignored_cells() {
        warnings.push(format!(
            "Row {}: '{}' value '{}' is not numeric and was left out",
            cell.row, cell.column, cell.value
        ));
    }

    let actuals = derive_actuals(&table, assumptions.tax_rate())?;
    let totals = total_actuals(&actuals);

    let variances = actuals
        .iter()
        .map(|actual| {
            let projected = projection.row(actual.month);
            let net_profit_variance = actual.net_profit.map(|n| n - projected.net_profit);
            let complete = actual.complete();
            MonthVariance {
                month: actual.month,
                projected_sales: projected.sales,
                actual_sales: actual.sales,
                sales_variance: actual.sales.map(|s| s - projected.sales),
                projected_net_profit: projected.net_profit,
                actual_net_profit: actual.net_profit,
                net_profit_variance,
                favorable: net_profit_variance.map(|v| v >= Decimal::ZERO),
                projected_gross_margin: projected.gross_margin(),
                projected_net_margin: projected.net_margin(),
                actual_gross_margin: complete.as_ref().map(MonthlyStatement::gross_margin),
                actual_net_margin: complete.as_ref().map(MonthlyStatement::net_margin),
            }
        })
        .collect();

    let output = ComparisonOutput {
        actuals,
        totals,
        variances,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Projected vs Actual Income Statement",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
