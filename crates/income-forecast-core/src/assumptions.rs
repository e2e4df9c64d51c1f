use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::ForecastError;
use crate::statement::MAX_LINE_ITEM;
use crate::types::{Money, Month, Rate};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A one-off event that moves sales in a given month by a fraction
/// (0.15 = +15%, -0.30 = -30%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialEvent {
    /// Month label, e.g. "Dic" or "Dec"
    pub month: String,
    /// Sales impact as a fraction
    pub impact: Rate,
    /// Free-form description, e.g. "Black Friday campaign"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Raw business assumptions for one forecasting run, as collected by a form,
/// CLI or config file. Convert into [`Assumptions`] before projecting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssumptionsInput {
    /// Sales in the first month
    pub initial_sales: Money,
    /// Compounding monthly change in sales (may be negative)
    pub monthly_growth_rate: Rate,
    /// Cost of sales as a fraction of sales
    pub cost_of_sales_ratio: Rate,
    /// Fixed operating expense per month
    pub monthly_operating_expense: Money,
    /// Fixed financial (interest) expense per month
    pub monthly_financial_expense: Money,
    /// Income tax rate applied to positive pre-tax profit
    pub tax_rate: Rate,
    /// Sales multiplier by month label; months left out use 1.0.
    /// Omit entirely to disable seasonality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<BTreeMap<String, Decimal>>,
    /// One-off sales events. Omit entirely to disable events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_events: Option<Vec<SpecialEvent>>,
}

// ---------------------------------------------------------------------------
// Validated assumption set
// ---------------------------------------------------------------------------

/// Validated, immutable assumption set. The only way to obtain one is through
/// [`Assumptions::new`], so the calculators never see out-of-range values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assumptions {
    initial_sales: Money,
    monthly_growth_rate: Rate,
    cost_of_sales_ratio: Rate,
    monthly_operating_expense: Money,
    monthly_financial_expense: Money,
    tax_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    seasonality: Option<BTreeMap<Month, Decimal>>,
    /// Accumulated impact per month
    #[serde(skip_serializing_if = "Option::is_none")]
    event_impacts: Option<BTreeMap<Month, Rate>>,
}

impl Assumptions {
    pub fn new(input: &AssumptionsInput) -> ForecastResult<Self> {
        build(input).inspect_err(|e| warn!(error = %e, "rejected assumption set"))
    }

    pub fn initial_sales(&self) -> Money {
        self.initial_sales
    }

    pub fn monthly_growth_rate(&self) -> Rate {
        self.monthly_growth_rate
    }

    pub fn cost_of_sales_ratio(&self) -> Rate {
        self.cost_of_sales_ratio
    }

    pub fn monthly_operating_expense(&self) -> Money {
        self.monthly_operating_expense
    }

    pub fn monthly_financial_expense(&self) -> Money {
        self.monthly_financial_expense
    }

    pub fn tax_rate(&self) -> Rate {
        self.tax_rate
    }

    pub fn seasonality_enabled(&self) -> bool {
        self.seasonality.is_some()
    }

    pub fn events_enabled(&self) -> bool {
        self.event_impacts.is_some()
    }

    /// Seasonality factor explicitly set for `month`, if seasonality is on.
    pub fn seasonality_factor(&self, month: Month) -> Option<Decimal> {
        self.seasonality.as_ref()?.get(&month).copied()
    }

    /// Accumulated event impact for `month`, if events are on.
    pub fn event_impact(&self, month: Month) -> Option<Rate> {
        self.event_impacts.as_ref()?.get(&month).copied()
    }
}

impl TryFrom<&AssumptionsInput> for Assumptions {
    type Error = ForecastError;

    fn try_from(input: &AssumptionsInput) -> ForecastResult<Self> {
        Assumptions::new(input)
    }
}

impl TryFrom<AssumptionsInput> for Assumptions {
    type Error = ForecastError;

    fn try_from(input: AssumptionsInput) -> ForecastResult<Self> {
        Assumptions::new(&input)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn build(input: &AssumptionsInput) -> ForecastResult<Assumptions> {
    validate_amount("initial_sales", input.initial_sales)?;
    validate_amount("monthly_operating_expense", input.monthly_operating_expense)?;
    validate_amount("monthly_financial_expense", input.monthly_financial_expense)?;
    validate_rate("cost_of_sales_ratio", input.cost_of_sales_ratio)?;
    validate_rate("tax_rate", input.tax_rate)?;

    // Below -100% the compounded sales would flip sign every month
    if input.monthly_growth_rate < -Decimal::ONE {
        return Err(ForecastError::InvalidInput {
            field: "monthly_growth_rate".into(),
            reason: format!(
                "Growth rate must be at least -1 (-100%), got {}",
                input.monthly_growth_rate
            ),
        });
    }

    let seasonality = input
        .seasonality
        .as_ref()
        .map(parse_seasonality)
        .transpose()?;

    let event_impacts = input
        .special_events
        .as_ref()
        .map(|events| accumulate_events(events))
        .transpose()?;

    Ok(Assumptions {
        initial_sales: input.initial_sales,
        monthly_growth_rate: input.monthly_growth_rate,
        cost_of_sales_ratio: input.cost_of_sales_ratio,
        monthly_operating_expense: input.monthly_operating_expense,
        monthly_financial_expense: input.monthly_financial_expense,
        tax_rate: input.tax_rate,
        seasonality,
        event_impacts,
    })
}

fn parse_seasonality(
    factors: &BTreeMap<String, Decimal>,
) -> ForecastResult<BTreeMap<Month, Decimal>> {
    let mut parsed = BTreeMap::new();
    for (label, factor) in factors {
        let month = parse_month_key(&format!("seasonality.{label}"), label)?;
        if *factor <= Decimal::ZERO {
            return Err(ForecastError::InvalidInput {
                field: format!("seasonality.{label}"),
                reason: format!("Seasonality factor must be positive, got {factor}"),
            });
        }
        if parsed.insert(month, *factor).is_some() {
            return Err(ForecastError::InvalidInput {
                field: format!("seasonality.{label}"),
                reason: format!("Month {month} is given more than one factor"),
            });
        }
    }
    Ok(parsed)
}

fn accumulate_events(events: &[SpecialEvent]) -> ForecastResult<BTreeMap<Month, Rate>> {
    let mut impacts: BTreeMap<Month, Rate> = BTreeMap::new();
    for (i, event) in events.iter().enumerate() {
        let month = parse_month_key(&format!("special_events[{i}].month"), &event.month)?;
        let total = impacts.entry(month).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(event.impact)
            .ok_or_else(|| ForecastError::InvalidInput {
                field: format!("special_events[{i}].impact"),
                reason: format!("Combined impact for {month} overflows"),
            })?;
    }

    for (month, impact) in &impacts {
        if *impact < -Decimal::ONE {
            return Err(ForecastError::InvalidInput {
                field: "special_events".into(),
                reason: format!(
                    "Combined impact for {month} is {impact}, which would make sales negative"
                ),
            });
        }
    }
    Ok(impacts)
}

fn parse_month_key(field: &str, label: &str) -> ForecastResult<Month> {
    label.parse().map_err(|_| ForecastError::InvalidInput {
        field: field.into(),
        reason: format!("'{label}' is not a month label"),
    })
}

fn validate_rate(field: &str, value: Rate) -> ForecastResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ForecastError::InvalidInput {
            field: field.into(),
            reason: format!("Rate must be between 0 and 1, got {value}"),
        });
    }
    Ok(())
}

fn validate_amount(field: &str, value: Money) -> ForecastResult<()> {
    if value < Decimal::ZERO {
        return Err(ForecastError::InvalidInput {
            field: field.into(),
            reason: format!("Value must be non-negative, got {value}"),
        });
    }
    if value > MAX_LINE_ITEM {
        return Err(ForecastError::InvalidInput {
            field: field.into(),
            reason: format!("Value must not exceed {MAX_LINE_ITEM}, got {value}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

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

    fn event(month: &str, impact: Decimal) -> SpecialEvent {
        SpecialEvent {
            month: month.into(),
            impact,
            name: None,
        }
    }

    #[test]
    fn test_valid_input_accepted() {
        let a = Assumptions::new(&sample_input()).unwrap();
        assert_eq!(a.initial_sales(), dec!(50000));
        assert_eq!(a.monthly_growth_rate(), dec!(0.03));
        assert!(!a.seasonality_enabled());
        assert!(!a.events_enabled());
        assert_eq!(a.seasonality_factor(Month::Jan), None);
    }

    #[test]
    fn test_negative_sales_rejected() {
        let mut input = sample_input();
        input.initial_sales = dec!(-1);
        let err = Assumptions::new(&input).unwrap_err();
        assert!(err.to_string().contains("initial_sales"));
    }

    #[test]
    fn test_ratio_above_one_rejected() {
        let mut input = sample_input();
        input.cost_of_sales_ratio = dec!(1.2);
        assert!(Assumptions::new(&input).is_err());
    }

    #[test]
    fn test_negative_tax_rate_rejected() {
        let mut input = sample_input();
        input.tax_rate = dec!(-0.1);
        assert!(Assumptions::new(&input).is_err());
    }

    #[test]
    fn test_negative_expense_rejected() {
        let mut input = sample_input();
        input.monthly_financial_expense = dec!(-5);
        assert!(Assumptions::new(&input).is_err());
    }

    #[test]
    fn test_negative_growth_allowed_down_to_minus_one() {
        let mut input = sample_input();
        input.monthly_growth_rate = dec!(-0.2);
        assert!(Assumptions::new(&input).is_ok());
        input.monthly_growth_rate = dec!(-1);
        assert!(Assumptions::new(&input).is_ok());
        input.monthly_growth_rate = dec!(-1.01);
        assert!(Assumptions::new(&input).is_err());
    }

    #[test]
    fn test_seasonality_keys_parsed() {
        let mut input = sample_input();
        input.seasonality = Some(BTreeMap::from([
            ("Dic".to_string(), dec!(1.5)),
            ("jul".to_string(), dec!(0.8)),
        ]));
        let a = Assumptions::new(&input).unwrap();
        assert!(a.seasonality_enabled());
        assert_eq!(a.seasonality_factor(Month::Dec), Some(dec!(1.5)));
        assert_eq!(a.seasonality_factor(Month::Jul), Some(dec!(0.8)));
        assert_eq!(a.seasonality_factor(Month::Jan), None);
    }

    #[test]
    fn test_unknown_seasonality_key_rejected() {
        let mut input = sample_input();
        input.seasonality = Some(BTreeMap::from([("Smarch".to_string(), dec!(1.1))]));
        let err = Assumptions::new(&input).unwrap_err();
        assert!(err.to_string().contains("Smarch"));
    }

    #[test]
    fn test_duplicate_seasonality_month_rejected() {
        let mut input = sample_input();
        input.seasonality = Some(BTreeMap::from([
            ("Dic".to_string(), dec!(1.5)),
            ("Dec".to_string(), dec!(1.2)),
        ]));
        assert!(Assumptions::new(&input).is_err());
    }

    #[test]
    fn test_non_positive_seasonality_factor_rejected() {
        let mut input = sample_input();
        input.seasonality = Some(BTreeMap::from([("Mar".to_string(), dec!(0))]));
        assert!(Assumptions::new(&input).is_err());
    }

    #[test]
    fn test_events_accumulate_additively() {
        let mut input = sample_input();
        input.special_events = Some(vec![
            event("Nov", dec!(0.20)),
            event("Nov", dec!(0.15)),
            event("Feb", dec!(-0.10)),
        ]);
        let a = Assumptions::new(&input).unwrap();
        assert_eq!(a.event_impact(Month::Nov), Some(dec!(0.35)));
        assert_eq!(a.event_impact(Month::Feb), Some(dec!(-0.10)));
        assert_eq!(a.event_impact(Month::Jan), None);
    }

    #[test]
    fn test_event_with_unknown_month_rejected() {
        let mut input = sample_input();
        input.special_events = Some(vec![event("Month13", dec!(0.1))]);
        assert!(Assumptions::new(&input).is_err());
    }

    #[test]
    fn test_combined_event_impact_below_minus_one_rejected() {
        let mut input = sample_input();
        input.special_events = Some(vec![event("Jun", dec!(-0.6)), event("Jun", dec!(-0.5))]);
        assert!(Assumptions::new(&input).is_err());
    }

    #[test]
    fn test_empty_event_list_enables_events_with_no_impact() {
        let mut input = sample_input();
        input.special_events = Some(vec![]);
        let a = Assumptions::new(&input).unwrap();
        assert!(a.events_enabled());
        assert_eq!(a.event_impact(Month::Jun), None);
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = serde_json::json!({
            "initial_sales": "50000",
            "monthly_growth_rate": "0.03",
            "cost_of_sales_ratio": "0.6",
            "monthly_operating_expense": "20000",
            "monthly_financial_expense": "1000",
            "tax_rate": "0.25",
            "seasonality": { "Dic": "1.4" },
            "special_events": [ { "month": "Nov", "impact": "0.2", "name": "Promo" } ]
        });
        let input: AssumptionsInput = serde_json::from_value(json).unwrap();
        let a = Assumptions::try_from(input).unwrap();
        assert_eq!(a.seasonality_factor(Month::Dec), Some(dec!(1.4)));
        assert_eq!(a.event_impact(Month::Nov), Some(dec!(0.2)));
    }

    #[test]
    fn test_amounts_above_supported_magnitude_rejected() {
        let mut input = sample_input();
        input.initial_sales = dec!(10000000000000000000000000000); // 1e28
        let err = Assumptions::new(&input).unwrap_err();
        assert!(err.to_string().contains("initial_sales"));

        let mut input = sample_input();
        input.monthly_operating_expense = MAX_LINE_ITEM + Decimal::ONE;
        assert!(Assumptions::new(&input).is_err());

        let mut input = sample_input();
        input.initial_sales = MAX_LINE_ITEM;
        assert!(Assumptions::new(&input).is_ok());
    }

    #[test]
    fn test_overflowing_event_impacts_rejected() {
        let mut input = sample_input();
        input.special_events = Some(vec![
            SpecialEvent {
                month: "Mar".into(),
                impact: Decimal::MAX,
                name: None,
            },
            SpecialEvent {
                month: "Mar".into(),
                impact: Decimal::MAX,
                name: None,
            },
        ]);
        let err = Assumptions::new(&input).unwrap_err();
        assert!(err.to_string().contains("special_events[1].impact"));
    }
}
