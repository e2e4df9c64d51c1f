use serde::Serialize;

use crate::projection::{summarize_projection, MonthExtreme, Projection};
use crate::scenarios::engine::{ScenarioBundle, ScenarioKind};
use crate::types::{Money, Month, Rate};

/// Headline metrics for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioMetrics {
    pub scenario: ScenarioKind,
    pub effective_growth_rate: Rate,
    pub total_sales: Money,
    pub total_net_profit: Money,
    /// total_net_profit / total_sales, zero without sales
    pub net_margin: Rate,
    /// Highest net profit month (earliest on ties)
    pub best_month: MonthExtreme,
    /// Lowest net profit month (earliest on ties)
    pub worst_month: MonthExtreme,
}

/// Spread of the annual net profit across the three scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnualRange {
    /// optimistic - realistic
    pub upside: Money,
    /// realistic - pessimistic
    pub downside: Money,
    /// optimistic - pessimistic
    pub range: Money,
}

impl AnnualRange {
    pub fn from_totals(optimistic: Money, realistic: Money, pessimistic: Money) -> Self {
        AnnualRange {
            upside: optimistic - realistic,
            downside: realistic - pessimistic,
            range: optimistic - pessimistic,
        }
    }
}

/// Net profit of one month under each scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySpread {
    pub month: Month,
    pub pessimistic: Money,
    pub realistic: Money,
    pub optimistic: Money,
    /// Highest minus lowest of the three
    pub spread: Money,
}

/// Sensitivity analysis over a scenario bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub optimistic: ScenarioMetrics,
    pub realistic: ScenarioMetrics,
    pub pessimistic: ScenarioMetrics,
    pub annual_range: AnnualRange,
    pub monthly_spread: Vec<MonthlySpread>,
}

impl SensitivityReport {
    pub fn metrics(&self, kind: ScenarioKind) -> &ScenarioMetrics {
        match kind {
            ScenarioKind::Optimistic => &self.optimistic,
            ScenarioKind::Realistic => &self.realistic,
            ScenarioKind::Pessimistic => &self.pessimistic,
        }
    }
}

pub fn scenario_metrics(scenario: ScenarioKind, projection: &Projection) -> ScenarioMetrics {
    let summary = summarize_projection(projection);
    ScenarioMetrics {
        scenario,
        effective_growth_rate: projection.effective_growth_rate(),
        total_sales: summary.total_sales,
        total_net_profit: summary.total_net_profit,
        net_margin: summary.net_margin,
        best_month: summary.best_month,
        worst_month: summary.worst_month,
    }
}

/// Reduce the three projections of a bundle to totals, extremes and the
/// upside/downside range of annual net profit.
pub fn analyze_sensitivity(bundle: &ScenarioBundle) -> SensitivityReport {
    let optimistic = scenario_metrics(ScenarioKind::Optimistic, &bundle.optimistic);
    let realistic = scenario_metrics(ScenarioKind::Realistic, &bundle.realistic);
    let pessimistic = scenario_metrics(ScenarioKind::Pessimistic, &bundle.pessimistic);

    let annual_range = AnnualRange::from_totals(
        optimistic.total_net_profit,
        realistic.total_net_profit,
        pessimistic.total_net_profit,
    );

    let monthly_spread = Month::ALL
        .iter()
        .map(|&month| {
            let pes = bundle.pessimistic.row(month).net_profit;
            let real = bundle.realistic.row(month).net_profit;
            let opt = bundle.optimistic.row(month).net_profit;
            let high = opt.max(real).max(pes);
            let low = opt.min(real).min(pes);
            MonthlySpread {
                month,
                pessimistic: pes,
                realistic: real,
                optimistic: opt,
                spread: high - low,
            }
        })
        .collect();

    SensitivityReport {
        optimistic,
        realistic,
        pessimistic,
        annual_range,
        monthly_spread,
    }
}
