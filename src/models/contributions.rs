use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ContributionDay {
    pub date: Option<NaiveDate>,
    pub count: u32,
}

impl ContributionDay {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self { date: Some(date), count }
    }

    pub fn padding() -> Self {
        Self { date: None, count: 0 }
    }

    pub fn is_padding(&self) -> bool {
        self.date.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContributionWeek {
    pub days: Vec<ContributionDay>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalendarSource {
    Live,
    Mock,
}

#[derive(Debug, Serialize, Clone)]
pub struct ContributionCalendar {
    pub username: String,
    pub year: i32,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub weeks: Vec<ContributionWeek>,
    pub total: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub source: CalendarSource,
}
