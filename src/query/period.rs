//! Relative time windows

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Look-back window selected by a period token such as `1h` or `7d`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Period {
    FiveMinutes,
    FifteenMinutes,
    #[default]
    OneHour,
    SixHours,
    OneDay,
    SevenDays,
    FourteenDays,
    TwentyOneDays,
    ThirtyDays,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
}

impl Period {
    pub const ALL: [Period; 12] = [
        Period::FiveMinutes,
        Period::FifteenMinutes,
        Period::OneHour,
        Period::SixHours,
        Period::OneDay,
        Period::SevenDays,
        Period::FourteenDays,
        Period::TwentyOneDays,
        Period::ThirtyDays,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::TwelveMonths,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == token)
    }

    /// Unknown or absent tokens resolve to `default`
    pub fn parse_or(token: Option<&str>, default: Period) -> Self {
        token.and_then(Self::parse).unwrap_or(default)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::FiveMinutes => "5m",
            Period::FifteenMinutes => "15m",
            Period::OneHour => "1h",
            Period::SixHours => "6h",
            Period::OneDay => "24h",
            Period::SevenDays => "7d",
            Period::FourteenDays => "14d",
            Period::TwentyOneDays => "21d",
            Period::ThirtyDays => "30d",
            Period::ThreeMonths => "3M",
            Period::SixMonths => "6M",
            Period::TwelveMonths => "12M",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Period::FiveMinutes => Duration::minutes(5),
            Period::FifteenMinutes => Duration::minutes(15),
            Period::OneHour => Duration::hours(1),
            Period::SixHours => Duration::hours(6),
            Period::OneDay => Duration::hours(24),
            Period::SevenDays => Duration::days(7),
            Period::FourteenDays => Duration::days(14),
            Period::TwentyOneDays => Duration::days(21),
            Period::ThirtyDays => Duration::days(30),
            // Months are fixed-length
            Period::ThreeMonths => Duration::days(90),
            Period::SixMonths => Duration::days(180),
            Period::TwelveMonths => Duration::days(365),
        }
    }

    /// Oldest timestamp still inside the window
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }

    /// Entries at exactly the cutoff are inside the window
    pub fn contains(&self, now: DateTime<Utc>, created_at: DateTime<Utc>) -> bool {
        created_at >= self.cutoff(now)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_every_token_round_trips() {
        for period in Period::ALL {
            assert_eq!(Period::parse(period.as_str()), Some(period));
            assert_eq!(period.cutoff(now()), now() - period.duration());
        }
    }

    #[test]
    fn test_month_tokens_are_case_sensitive() {
        assert_eq!(Period::parse("3M"), Some(Period::ThreeMonths));
        assert_eq!(Period::parse("3m"), None);
        assert_eq!(Period::TwelveMonths.duration(), Duration::days(365));
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(Period::parse_or(Some("2w"), Period::OneHour), Period::OneHour);
        assert_eq!(Period::parse_or(None, Period::OneDay), Period::OneDay);
        assert_eq!(Period::parse_or(Some("7d"), Period::OneHour), Period::SevenDays);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let period = Period::OneHour;
        let cutoff = period.cutoff(now());
        assert!(period.contains(now(), cutoff));
        assert!(!period.contains(now(), cutoff - Duration::seconds(1)));
    }
}
