use crate::models::contributions::{ContributionDay, ContributionWeek};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

pub type DayCounts = BTreeMap<NaiveDate, u32>;

pub fn range_for_year(year: i32, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    if year > today.year() {
        return None;
    }
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = if year == today.year() {
        today
    } else {
        NaiveDate::from_ymd_opt(year, 12, 31)?
    };
    Some((start, end))
}

pub fn to_day_counts(days: &[ContributionDay]) -> DayCounts {
    days.iter()
        .filter_map(|day| day.date.map(|date| (date, day.count)))
        .collect()
}

pub fn restrict(counts: &DayCounts, start: NaiveDate, end: NaiveDate) -> DayCounts {
    counts.range(start..=end).map(|(d, c)| (*d, *c)).collect()
}

pub fn build_weeks(counts: &DayCounts, start: NaiveDate, end: NaiveDate) -> Vec<ContributionWeek> {
    let mut weeks = Vec::new();
    let mut days = Vec::with_capacity(7);

    for _ in 0..start.weekday().num_days_from_sunday() {
        days.push(ContributionDay::padding());
    }

    for date in start.iter_days().take_while(|d| *d <= end) {
        let count = counts.get(&date).copied().unwrap_or(0);
        days.push(ContributionDay::new(date, count));
        if days.len() == 7 {
            weeks.push(ContributionWeek { days: std::mem::take(&mut days) });
        }
    }

    if !days.is_empty() {
        days.resize(7, ContributionDay::padding());
        weeks.push(ContributionWeek { days });
    }

    weeks
}

pub fn total(weeks: &[ContributionWeek]) -> u64 {
    weeks
        .iter()
        .flat_map(|w| w.days.iter())
        .filter(|d| !d.is_padding())
        .map(|d| u64::from(d.count))
        .sum()
}

// Run of active days ending at the anchor, which is the most recent date on or before
// `today` that has any entry. The first zero or missing day stops the scan.
pub fn current_streak(counts: &DayCounts, today: NaiveDate) -> u32 {
    let Some((&anchor, _)) = counts.range(..=today).next_back() else {
        return 0;
    };

    let mut streak = 0;
    let mut day = Some(anchor);
    while let Some(d) = day {
        match counts.get(&d) {
            Some(&count) if count > 0 => streak += 1,
            _ => break,
        }
        day = d.pred_opt();
    }
    streak
}

pub fn longest_streak(counts: &DayCounts, start: NaiveDate, end: NaiveDate) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    for date in start.iter_days().take_while(|d| *d <= end) {
        if counts.get(&date).copied().unwrap_or(0) > 0 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sequence(start: NaiveDate, counts: &[u32]) -> DayCounts {
        start.iter_days().zip(counts.iter().copied()).collect()
    }

    #[test]
    fn current_year_range_ends_today() {
        let today = date(2025, 6, 15);
        assert_eq!(range_for_year(2025, today), Some((date(2025, 1, 1), today)));
        assert_eq!(range_for_year(2024, today), Some((date(2024, 1, 1), date(2024, 12, 31))));
        assert_eq!(range_for_year(2026, today), None);
    }

    #[test]
    fn weeks_are_padded_to_sunday() {
        // 2025-01-01 is a Wednesday, 2025-01-10 a Friday
        let start = date(2025, 1, 1);
        let end = date(2025, 1, 10);
        let counts = sequence(start, &[1; 10]);
        let weeks = build_weeks(&counts, start, end);

        assert_eq!(weeks.len(), 2);
        assert!(weeks.iter().all(|w| w.days.len() == 7));
        assert!(weeks[0].days[..3].iter().all(ContributionDay::is_padding));
        assert_eq!(weeks[0].days[3].date, Some(start));
        assert_eq!(weeks[1].days[5].date, Some(end));
        assert!(weeks[1].days[6].is_padding());
        assert_eq!(total(&weeks), 10);
    }

    #[test]
    fn full_year_has_seven_slot_weeks_and_matching_total() {
        let start = date(2024, 1, 1);
        let end = date(2024, 12, 31);
        let counts: DayCounts = start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| (d, d.ordinal() % 4))
            .collect();
        let weeks = build_weeks(&counts, start, end);

        assert!(weeks.iter().all(|w| w.days.len() == 7));
        let dated = weeks.iter().flat_map(|w| &w.days).filter(|d| !d.is_padding()).count();
        assert_eq!(dated, 366);
        assert_eq!(total(&weeks), counts.values().map(|&c| u64::from(c)).sum::<u64>());
    }

    #[test]
    fn missing_dates_inside_range_are_zero_not_padding() {
        let start = date(2023, 1, 1); // Sunday
        let end = date(2023, 1, 7);
        let counts = DayCounts::from([(date(2023, 1, 3), 4)]);
        let weeks = build_weeks(&counts, start, end);

        assert_eq!(weeks.len(), 1);
        assert!(weeks[0].days.iter().all(|d| !d.is_padding()));
        assert_eq!(weeks[0].days[2].count, 4);
        assert_eq!(total(&weeks), 4);
    }

    #[test]
    fn longest_streak_finds_the_longest_run() {
        let start = date(2024, 3, 3);
        let counts = sequence(start, &[1, 1, 0, 1, 1, 1, 0]);
        assert_eq!(longest_streak(&counts, start, date(2024, 3, 9)), 3);
    }

    #[test]
    fn current_streak_ends_at_latest_day_with_data() {
        let start = date(2024, 3, 1);
        let counts = sequence(start, &[0, 1, 1, 1]);
        // data ends on the 4th, today is the 6th
        assert_eq!(current_streak(&counts, date(2024, 3, 6)), 3);
        assert_eq!(current_streak(&counts, date(2024, 3, 3)), 2);
    }

    #[test]
    fn current_streak_is_zero_when_latest_day_is_empty() {
        let start = date(2024, 3, 1);
        let counts = sequence(start, &[2, 2, 0]);
        assert_eq!(current_streak(&counts, date(2024, 3, 3)), 0);
        assert_eq!(current_streak(&DayCounts::new(), date(2024, 3, 3)), 0);
    }

    #[test]
    fn current_streak_stops_at_a_gap() {
        let counts = DayCounts::from([
            (date(2024, 3, 1), 1),
            (date(2024, 3, 3), 1),
            (date(2024, 3, 4), 1),
        ]);
        assert_eq!(current_streak(&counts, date(2024, 3, 4)), 2);
    }

    #[test]
    fn duplicate_dates_collapse_to_one_entry() {
        let d = date(2024, 5, 5);
        let days = vec![ContributionDay::new(d, 1), ContributionDay::new(d, 3), ContributionDay::padding()];
        let counts = to_day_counts(&days);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&d], 3);
    }
}
