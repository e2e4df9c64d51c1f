use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use income_forecast_core::assumptions::{AssumptionsInput, SpecialEvent};

use crate::input;

/// Assumption flags shared by every command, used when neither `--input`
/// nor piped JSON is given.
#[derive(Args)]
pub struct AssumptionArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Sales in January
    #[arg(long)]
    pub initial_sales: Option<Decimal>,

    /// Monthly growth rate (e.g. 0.03 for 3%)
    #[arg(long, allow_hyphen_values = true)]
    pub growth_rate: Option<Decimal>,

    /// Cost of sales as a fraction of sales
    #[arg(long)]
    pub cost_of_sales_ratio: Option<Decimal>,

    /// Fixed operating expense per month
    #[arg(long)]
    pub operating_expense: Option<Decimal>,

    /// Fixed financial expense per month
    #[arg(long, default_value = "0")]
    pub financial_expense: Decimal,

    /// Income tax rate on positive pre-tax profit
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Seasonality factor as MONTH=FACTOR (e.g. Dic=1.3), repeatable
    #[arg(long = "season", value_name = "MONTH=FACTOR")]
    pub seasonality: Vec<String>,

    /// Special event as MONTH=IMPACT[:NAME] (e.g. Nov=0.2:Black Friday), repeatable
    #[arg(long = "event", value_name = "MONTH=IMPACT[:NAME]")]
    pub events: Vec<String>,
}

impl AssumptionArgs {
    /// JSON document from `--input` or stdin, if either was given.
    pub fn read_document(&self) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        match self.input {
            Some(ref path) => Ok(Some(input::file::read_json_value(path)?)),
            None => input::stdin::read_stdin(),
        }
    }

    /// Resolve the assumption set from the input file, piped JSON or flags,
    /// in that order.
    pub fn resolve(&self) -> Result<AssumptionsInput, Box<dyn std::error::Error>> {
        match self.read_document()? {
            Some(data) => Ok(serde_json::from_value(data)?),
            None => {
                debug!("no JSON input, building assumptions from flags");
                self.input_from_flags()
            }
        }
    }

    pub fn input_from_flags(&self) -> Result<AssumptionsInput, Box<dyn std::error::Error>> {
        let seasonality = if self.seasonality.is_empty() {
            None
        } else {
            let mut factors = BTreeMap::new();
            for pair in &self.seasonality {
                let (month, factor) = split_pair(pair, "--season")?;
                factors.insert(month.to_string(), factor.parse::<Decimal>()?);
            }
            Some(factors)
        };

        let special_events = if self.events.is_empty() {
            None
        } else {
            let mut events = Vec::with_capacity(self.events.len());
            for pair in &self.events {
                let (month, rest) = split_pair(pair, "--event")?;
                let (impact, name) = match rest.split_once(':') {
                    Some((impact, name)) => (impact, Some(name.trim().to_string())),
                    None => (rest, None),
                };
                events.push(SpecialEvent {
                    month: month.to_string(),
                    impact: impact.trim().parse()?,
                    name,
                });
            }
            Some(events)
        };

        Ok(AssumptionsInput {
            initial_sales: self
                .initial_sales
                .ok_or("--initial-sales is required (or provide --input)")?,
            monthly_growth_rate: self
                .growth_rate
                .ok_or("--growth-rate is required (or provide --input)")?,
            cost_of_sales_ratio: self
                .cost_of_sales_ratio
                .ok_or("--cost-of-sales-ratio is required (or provide --input)")?,
            monthly_operating_expense: self
                .operating_expense
                .ok_or("--operating-expense is required (or provide --input)")?,
            monthly_financial_expense: self.financial_expense,
            tax_rate: self
                .tax_rate
                .ok_or("--tax-rate is required (or provide --input)")?,
            seasonality,
            special_events,
        })
    }
}

fn split_pair<'a>(
    pair: &'a str,
    flag: &str,
) -> Result<(&'a str, &'a str), Box<dyn std::error::Error>> {
    pair.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| format!("{flag} must be MONTH=VALUE, got '{pair}'").into())
}
