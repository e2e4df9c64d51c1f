use clap::Args;
use serde_json::Value;

use income_forecast_core::comparison::{self, ComparisonInput};

use super::assumptions::AssumptionArgs;
use crate::input;

/// Arguments for comparing actuals against the realistic projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompareArgs {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    /// CSV file with columns month, sales, cost_of_sales, operating_expense,
    /// financial_expense (Spanish headers accepted)
    #[arg(long)]
    pub actuals: String,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison_input = ComparisonInput {
        assumptions: args.assumptions.resolve()?,
        actuals: input::actuals::read_actuals_csv(&args.actuals)?,
    };
    let result = comparison::compare_with_actuals(&comparison_input)?;
    Ok(serde_json::to_value(result)?)
}
