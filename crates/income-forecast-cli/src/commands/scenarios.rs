use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use income_forecast_core::scenarios::engine::{self, ScenarioInput, ScenarioVariation};

use super::assumptions::AssumptionArgs;

/// Arguments for the three-scenario run
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScenarioArgs {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    /// Percentage applied to the growth rate in the optimistic case (default 20)
    #[arg(long)]
    pub optimistic_variation: Option<Decimal>,

    /// Percentage applied to the growth rate in the pessimistic case (default -20)
    #[arg(long, allow_hyphen_values = true)]
    pub pessimistic_variation: Option<Decimal>,
}

pub fn run_scenarios(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut scenario_input = match args.assumptions.read_document()? {
        // Either a full scenario document or a bare assumption set
        Some(data) if data.get("assumptions").is_some() => serde_json::from_value(data)?,
        Some(data) => ScenarioInput {
            assumptions: serde_json::from_value(data)?,
            variation: ScenarioVariation::default(),
        },
        None => ScenarioInput {
            assumptions: args.assumptions.input_from_flags()?,
            variation: ScenarioVariation::default(),
        },
    };

    if let Some(pct) = args.optimistic_variation {
        scenario_input.variation.optimistic_pct = pct;
    }
    if let Some(pct) = args.pessimistic_variation {
        scenario_input.variation.pessimistic_pct = pct;
    }

    let result = engine::run_scenario_analysis(&scenario_input)?;
    Ok(serde_json::to_value(result)?)
}
