use napi::Result as NapiResult;
use napi_derive::napi;

use income_forecast_core::assumptions::AssumptionsInput;
use income_forecast_core::comparison::{self, ComparisonInput};
use income_forecast_core::projection;
use income_forecast_core::scenarios::engine::{self, ScenarioInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Twelve-month income statement for an assumption set (JSON in, JSON out).
#[napi]
pub fn project_income_statement(input_json: String) -> NapiResult<String> {
    let input: AssumptionsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = projection::project_income_statement(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn run_scenario_analysis(input_json: String) -> NapiResult<String> {
    let input: ScenarioInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::run_scenario_analysis(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Actuals
// ---------------------------------------------------------------------------

/// Compare rows of observed figures against the realistic projection.
#[napi]
pub fn compare_with_actuals(input_json: String) -> NapiResult<String> {
    let input: ComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::compare_with_actuals(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
