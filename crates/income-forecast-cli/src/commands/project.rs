use clap::Args;
use serde_json::Value;

use income_forecast_core::projection;

use super::assumptions::AssumptionArgs;

/// Arguments for the single-scenario projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = args.assumptions.resolve()?;
    let result = projection::project_income_statement(&input)?;
    Ok(serde_json::to_value(result)?)
}
