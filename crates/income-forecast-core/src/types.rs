use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ForecastError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Number of months in a projection.
pub const MONTHS_IN_YEAR: usize = 12;

/// Calendar month of the projection year, in fixed Jan..Dec order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; MONTHS_IN_YEAR] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Zero-based position in the year (Jan = 0).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical label used in statements and exports.
    pub fn label(self) -> &'static str {
        match self {
            Month::Jan => "Ene",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Abr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Ago",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dic",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Month {
    type Err = ForecastError;

    /// Accepts Spanish and English abbreviations and full names, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let month = match s.trim().to_lowercase().as_str() {
            "ene" | "jan" | "enero" | "january" => Month::Jan,
            "feb" | "febrero" | "february" => Month::Feb,
            "mar" | "marzo" | "march" => Month::Mar,
            "abr" | "apr" | "abril" | "april" => Month::Apr,
            "may" | "mayo" => Month::May,
            "jun" | "junio" | "june" => Month::Jun,
            "jul" | "julio" | "july" => Month::Jul,
            "ago" | "aug" | "agosto" | "august" => Month::Aug,
            "sep" | "sept" | "septiembre" | "setiembre" | "september" => Month::Sep,
            "oct" | "octubre" | "october" => Month::Oct,
            "nov" | "noviembre" | "november" => Month::Nov,
            "dic" | "dec" | "diciembre" | "december" => Month::Dec,
            _ => {
                return Err(ForecastError::InvalidInput {
                    field: "month".into(),
                    reason: format!("Unknown month label '{s}'"),
                })
            }
        };
        Ok(month)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Ratio that is zero when the denominator is zero or the quotient does not
/// fit in a `Decimal`.
pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_months_in_calendar_order() {
        for (i, month) in Month::ALL.iter().enumerate() {
            assert_eq!(month.index(), i);
        }
    }

    #[test]
    fn test_parse_spanish_and_english_labels() {
        assert_eq!("Ene".parse::<Month>().unwrap(), Month::Jan);
        assert_eq!("jan".parse::<Month>().unwrap(), Month::Jan);
        assert_eq!(" Dic ".parse::<Month>().unwrap(), Month::Dec);
        assert_eq!("August".parse::<Month>().unwrap(), Month::Aug);
        assert_eq!("ago".parse::<Month>().unwrap(), Month::Aug);
        assert!("Foo".parse::<Month>().is_err());
        assert!("".parse::<Month>().is_err());
    }

    #[test]
    fn test_month_serializes_as_label() {
        let json = serde_json::to_string(&Month::Apr).unwrap();
        assert_eq!(json, "\"Abr\"");
        let back: Month = serde_json::from_str("\"apr\"").unwrap();
        assert_eq!(back, Month::Apr);
    }

    #[test]
    fn test_safe_divide_zero_denominator() {
        assert_eq!(safe_divide(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_divide(dec!(10), dec!(4)), dec!(2.5));
    }

    #[test]
    fn test_safe_divide_overflowing_quotient() {
        // A large loss over a tiny sales figure
        let loss = -crate::statement::MAX_LINE_ITEM;
        assert_eq!(safe_divide(loss, dec!(0.0000001)), Decimal::ZERO);
    }
}
