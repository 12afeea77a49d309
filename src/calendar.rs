use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn for_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

/// Human-readable placement of a week index on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekLabel {
    pub date: NaiveDate,
    pub week_in_month: u32,
    pub season: Season,
    /// "March, Week 1"
    pub short: String,
    /// "March 1-7, 2024"
    pub range: String,
}

/// Maps week indices onto dates starting at a fixed first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    start: NaiveDate,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(default_start_date())
    }
}

impl Calendar {
    pub fn new(start: NaiveDate) -> Self {
        Self { start }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn date_for_week(&self, week: u32) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(u64::from(week) * 7))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn week_in_month(date: NaiveDate) -> u32 {
        ((date.day() - 1) / 7 + 1).min(5)
    }

    pub fn label(&self, week: u32) -> WeekLabel {
        let date = self.date_for_week(week);
        let week_in_month = Self::week_in_month(date);
        WeekLabel {
            date,
            week_in_month,
            season: Season::for_month(date.month()),
            short: format!("{}, Week {}", date.format("%B"), week_in_month),
            range: range_label(date),
        }
    }
}

fn range_label(start: NaiveDate) -> String {
    let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
    if end.month() == start.month() && end.year() == start.year() {
        format!(
            "{} {}-{}, {}",
            start.format("%B"),
            start.day(),
            end.day(),
            start.year()
        )
    } else if end.year() == start.year() {
        format!(
            "{} - {}, {}",
            start.format("%b %-d"),
            end.format("%b %-d"),
            end.year()
        )
    } else {
        format!("{} - {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_week_labels() {
        let label = Calendar::default().label(0);
        assert_eq!(label.short, "March, Week 1");
        assert_eq!(label.range, "March 1-7, 2024");
        assert_eq!(label.season, Season::Spring);
    }

    #[test]
    fn range_across_months() {
        let label = Calendar::default().label(4);
        assert_eq!(label.date, NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
        assert_eq!(label.short, "March, Week 5");
        assert_eq!(label.range, "Mar 29 - Apr 4, 2024");
    }

    #[test]
    fn range_across_years() {
        let calendar = Calendar::new(NaiveDate::from_ymd_opt(2024, 12, 28).unwrap());
        assert_eq!(calendar.label(0).range, "Dec 28, 2024 - Jan 3, 2025");
        assert_eq!(calendar.label(0).season, Season::Winter);
    }

    #[test]
    fn seasons_by_month() {
        assert_eq!(Season::for_month(6), Season::Summer);
        assert_eq!(Season::for_month(11), Season::Autumn);
        assert_eq!(Season::for_month(2), Season::Winter);
    }
}
