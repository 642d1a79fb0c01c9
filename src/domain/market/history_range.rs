use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Span of daily history requested from the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    /// A trailing period such as `3mo` or `1y`.
    Period(Period),
    /// Everything from the given date up to today.
    Since(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::Max => "max",
        }
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            "max" => Ok(Period::Max),
            _ => bail!(
                "Invalid history period: {}. Must be one of 1mo, 3mo, 6mo, 1y, 2y, 5y, max",
                s
            ),
        }
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryRange::Period(p) => write!(f, "{}", p.as_str()),
            HistoryRange::Since(date) => write!(f, "since {}", date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parsing() {
        assert_eq!(Period::from_str("3mo").unwrap(), Period::ThreeMonths);
        assert_eq!(Period::from_str("1Y").unwrap(), Period::OneYear);
        assert!(Period::from_str("3 months").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(HistoryRange::Period(Period::ThreeMonths).to_string(), "3mo");
        let date = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        assert_eq!(HistoryRange::Since(date).to_string(), "since 2015-01-01");
    }
}
