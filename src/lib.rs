pub mod config;
pub mod probe;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod storage;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named trailing windows offered by the query surface
///
/// The store accepts any positive hour count; these are the presets the
/// dashboard and CLI expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFilter {
    OneHour,
    ThreeHours,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl TimeFilter {
    pub const ALL: [TimeFilter; 5] = [
        TimeFilter::OneHour,
        TimeFilter::ThreeHours,
        TimeFilter::OneDay,
        TimeFilter::SevenDays,
        TimeFilter::ThirtyDays,
    ];

    /// Window size in hours
    pub fn hours(&self) -> u32 {
        match self {
            TimeFilter::OneHour => 1,
            TimeFilter::ThreeHours => 3,
            TimeFilter::OneDay => 24,
            TimeFilter::SevenDays => 24 * 7,
            TimeFilter::ThirtyDays => 24 * 30,
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeFilter::OneHour => "1h",
            TimeFilter::ThreeHours => "3h",
            TimeFilter::OneDay => "1d",
            TimeFilter::SevenDays => "7d",
            TimeFilter::ThirtyDays => "30d",
        };
        write!(f, "{label}")
    }
}

impl FromStr for TimeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(TimeFilter::OneHour),
            "3h" => Ok(TimeFilter::ThreeHours),
            "1d" => Ok(TimeFilter::OneDay),
            "7d" => Ok(TimeFilter::SevenDays),
            "30d" => Ok(TimeFilter::ThirtyDays),
            other => Err(format!("unknown time filter: {other}")),
        }
    }
}
