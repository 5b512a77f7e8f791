use serde::{Deserialize, Serialize};

/// History lookup window
///
/// Only the fixed set of windows below is supported. Anything else,
/// including a missing value, falls back to thirty minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryRange {
    #[default]
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "7d")]
    SevenDays,
}

impl HistoryRange {
    pub const ALL: [HistoryRange; 6] = [
        HistoryRange::ThirtyMinutes,
        HistoryRange::OneHour,
        HistoryRange::TwelveHours,
        HistoryRange::OneDay,
        HistoryRange::ThreeDays,
        HistoryRange::SevenDays,
    ];

    /// Parse a query-string value, defaulting to thirty minutes
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("30m") => HistoryRange::ThirtyMinutes,
            Some("1h") => HistoryRange::OneHour,
            Some("12h") => HistoryRange::TwelveHours,
            Some("24h") => HistoryRange::OneDay,
            Some("3d") => HistoryRange::ThreeDays,
            Some("7d") => HistoryRange::SevenDays,
            _ => HistoryRange::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryRange::ThirtyMinutes => "30m",
            HistoryRange::OneHour => "1h",
            HistoryRange::TwelveHours => "12h",
            HistoryRange::OneDay => "24h",
            HistoryRange::ThreeDays => "3d",
            HistoryRange::SevenDays => "7d",
        }
    }

    /// Length of the window
    pub fn duration(&self) -> chrono::Duration {
        match self {
            HistoryRange::ThirtyMinutes => chrono::Duration::minutes(30),
            HistoryRange::OneHour => chrono::Duration::hours(1),
            HistoryRange::TwelveHours => chrono::Duration::hours(12),
            HistoryRange::OneDay => chrono::Duration::hours(24),
            HistoryRange::ThreeDays => chrono::Duration::days(3),
            HistoryRange::SevenDays => chrono::Duration::days(7),
        }
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
