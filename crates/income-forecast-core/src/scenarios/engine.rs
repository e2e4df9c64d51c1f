use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::debug;

use crate::assumptions::{Assumptions, AssumptionsInput};
use crate::projection::{build_projection, Projection};
use crate::scenarios::sensitivity::{analyze_sensitivity, SensitivityReport};
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::error::ForecastError;
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One of the three named growth variants of an assumption set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Optimistic,
    Realistic,
    Pessimistic,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Optimistic,
        ScenarioKind::Realistic,
        ScenarioKind::Pessimistic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScenarioKind::Optimistic => "Optimistic",
            ScenarioKind::Realistic => "Realistic",
            ScenarioKind::Pessimistic => "Pessimistic",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Percent variations applied to the base growth rate (20 = +20%).
///
/// Expected `optimistic_pct > 0 > pessimistic_pct`, but not enforced: other
/// values produce a valid bundle whose labels no longer match its ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioVariation {
    pub optimistic_pct: Decimal,
    pub pessimistic_pct: Decimal,
}

impl Default for ScenarioVariation {
    fn default() -> Self {
        ScenarioVariation {
            optimistic_pct: dec!(20),
            pessimistic_pct: dec!(-20),
        }
    }
}

impl ScenarioVariation {
    /// Variation percent for `kind`; the realistic case is never varied.
    pub fn pct_for(&self, kind: ScenarioKind) -> Decimal {
        match kind {
            ScenarioKind::Optimistic => self.optimistic_pct,
            ScenarioKind::Realistic => Decimal::ZERO,
            ScenarioKind::Pessimistic => self.pessimistic_pct,
        }
    }
}

/// Optimistic, realistic and pessimistic projections of one assumption set.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioBundle {
    pub base_growth_rate: Rate,
    pub variation: ScenarioVariation,
    pub optimistic: Projection,
    pub realistic: Projection,
    pub pessimistic: Projection,
}

impl ScenarioBundle {
    pub fn get(&self, kind: ScenarioKind) -> &Projection {
        match kind {
            ScenarioKind::Optimistic => &self.optimistic,
            ScenarioKind::Realistic => &self.realistic,
            ScenarioKind::Pessimistic => &self.pessimistic,
        }
    }

    /// Scenarios in optimistic, realistic, pessimistic order.
    pub fn iter(&self) -> impl Iterator<Item = (ScenarioKind, &Projection)> {
        ScenarioKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Input for a full scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub assumptions: AssumptionsInput,
    #[serde(default)]
    pub variation: ScenarioVariation,
}

/// Output of a full scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutput {
    pub scenarios: ScenarioBundle,
    pub sensitivity: SensitivityReport,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scale the growth rate itself by `(1 + variation_pct / 100)`.
///
/// 3% with a +20% variation is 3.6%, not 23%. A zero base rate therefore
/// gives identical scenarios and a negative one swaps their ordering. The
/// scaled rate is held to the same `>= -1` floor as the base rate.
pub fn effective_growth_rate(
    base_growth_rate: Rate,
    variation_pct: Decimal,
) -> ForecastResult<Rate> {
    let rate = Decimal::ONE
        .checked_add(variation_pct / dec!(100))
        .and_then(|multiplier| base_growth_rate.checked_mul(multiplier))
        .ok_or_else(|| ForecastError::InvalidInput {
            field: "variation".into(),
            reason: format!("Variation {variation_pct}% on {base_growth_rate} overflows"),
        })?;

    if rate < -Decimal::ONE {
        return Err(ForecastError::InvalidInput {
            field: "variation".into(),
            reason: format!(
                "Variation {variation_pct}% takes growth {base_growth_rate} to {rate}, below -1 (-100%)"
            ),
        });
    }
    Ok(rate)
}

/// Build the three scenario projections from one assumption set.
///
/// Only the growth rate differs between scenarios; cost ratios, expenses,
/// seasonality and events are shared.
pub fn build_scenarios(
    assumptions: &Assumptions,
    base_growth_rate: Rate,
    variation: &ScenarioVariation,
) -> ForecastResult<ScenarioBundle> {
    let optimistic_rate = effective_growth_rate(base_growth_rate, variation.optimistic_pct)?;
    let pessimistic_rate = effective_growth_rate(base_growth_rate, variation.pessimistic_pct)?;

    debug!(
        base = %base_growth_rate,
        optimistic = %optimistic_rate,
        pessimistic = %pessimistic_rate,
        "building scenario bundle"
    );

    #[cfg(feature = "parallel")]
    let (optimistic, (realistic, pessimistic)) = rayon::join(
        || build_projection(assumptions, optimistic_rate),
        || {
            rayon::join(
                || build_projection(assumptions, base_growth_rate),
                || build_projection(assumptions, pessimistic_rate),
            )
        },
    );

    #[cfg(not(feature = "parallel"))]
    let (optimistic, realistic, pessimistic) = (
        build_projection(assumptions, optimistic_rate),
        build_projection(assumptions, base_growth_rate),
        build_projection(assumptions, pessimistic_rate),
    );

    Ok(ScenarioBundle {
        base_growth_rate,
        variation: *variation,
        optimistic: optimistic?,
        realistic: realistic?,
        pessimistic: pessimistic?,
    })
}

/// Validate the assumptions, build the bundle at the assumption set's growth
/// rate and run the sensitivity analysis over it.
pub fn run_scenario_analysis(
    input: &ScenarioInput,
) -> ForecastResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let assumptions = Assumptions::new(&input.assumptions)?;
    let base = assumptions.monthly_growth_rate();
    let variation = input.variation;

    if base.is_zero() {
        warnings.push(
            "Base growth rate is zero; the variations scale the rate itself, so all three scenarios are identical"
                .into(),
        );
    } else if base < Decimal::ZERO {
        warnings.push(format!(
            "Base growth rate {base} is negative; the optimistic variation deepens the decline and the pessimistic one softens it"
        ));
    }
    if variation.optimistic_pct <= Decimal::ZERO {
        warnings.push(format!(
            "Optimistic variation {}% is not positive",
            variation.optimistic_pct
        ));
    }
    if variation.pessimistic_pct >= Decimal::ZERO {
        warnings.push(format!(
            "Pessimistic variation {}% is not negative",
            variation.pessimistic_pct
        ));
    }

    let scenarios = build_scenarios(&assumptions, base, &variation)?;
    let sensitivity = analyze_sensitivity(&scenarios);

    let worst = sensitivity.pessimistic.worst_month;
    if worst.is_loss {
        warnings.push(format!(
            "Pessimistic scenario: {} at risk with a net loss of {}",
            worst.month,
            (-worst.net_profit).round_dp(2)
        ));
    }

    let output = ScenarioOutput {
        scenarios,
        sensitivity,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Optimistic/Realistic/Pessimistic Scenario Analysis (multiplicative growth variation)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
