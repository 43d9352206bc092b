use crate::models::contributions::{CalendarSource, ContributionCalendar, ContributionDay};
use crate::services::cache::{SessionCache, cache_key};
use crate::services::github::{FetchError, GitHubClient};
use crate::utils::calendar::{self, DayCounts};
use crate::utils::mock::MockCalendar;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;

pub const FIRST_CALENDAR_YEAR: i32 = 2008;

pub struct ContributionAnalyzer {
    client: Arc<GitHubClient>,
    cache: Arc<SessionCache>,
}

impl ContributionAnalyzer {
    pub fn new(client: Arc<GitHubClient>, cache: Arc<SessionCache>) -> Self {
        Self { client, cache }
    }

    pub async fn calendar(&self, username: &str, year: i32, today: NaiveDate) -> Result<ContributionCalendar, FetchError> {
        if year < FIRST_CALENDAR_YEAR {
            return Err(FetchError::InvalidRequest(format!(
                "no contribution data before {}",
                FIRST_CALENDAR_YEAR
            )));
        }
        let (start, end) = calendar::range_for_year(year, today)
            .ok_or_else(|| FetchError::InvalidRequest(format!("year {} is in the future", year)))?;

        if let Some(yesterday) = end.pred_opt().filter(|d| *d >= start && end == today) {
            self.cache.invalidate(&cache_key::contributions(username, year, yesterday));
        }

        let key = cache_key::contributions(username, year, end);
        let live = self.cache.get_or_fetch(&key, || self.fetch_live(username, start, end)).await;

        let (counts, source) = match live {
            Ok(days) => (calendar::to_day_counts(&days), CalendarSource::Live),
            Err(e) => {
                warn!("Contribution calendar for {} ({}) unavailable, using mock data: {}", username, year, e);
                (MockCalendar::generate(username, year, start, end), CalendarSource::Mock)
            }
        };

        Ok(analyze(username, year, start, end, &counts, today, source))
    }

    async fn fetch_live(&self, username: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<ContributionDay>, FetchError> {
        let days: Vec<ContributionDay> = self
            .client
            .contribution_calendar(username, start, end)
            .await?
            .into_iter()
            .filter(|d| d.date.is_some_and(|date| date >= start && date <= end))
            .collect();

        if days.is_empty() {
            return Err(FetchError::GraphQl("contribution calendar is empty".to_string()));
        }
        info!("Fetched {} contribution days for {}", days.len(), username);
        Ok(days)
    }
}

pub fn analyze(
    username: &str,
    year: i32,
    start: NaiveDate,
    end: NaiveDate,
    counts: &DayCounts,
    today: NaiveDate,
    source: CalendarSource,
) -> ContributionCalendar {
    let counts = calendar::restrict(counts, start, end);
    let weeks = calendar::build_weeks(&counts, start, end);

    ContributionCalendar {
        username: username.to_string(),
        year,
        range_start: start,
        range_end: end,
        total: calendar::total(&weeks),
        current_streak: calendar::current_streak(&counts, today),
        longest_streak: calendar::longest_streak(&counts, start, end),
        weeks,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn analyzer(server: &ServerGuard) -> ContributionAnalyzer {
        let client = Arc::new(GitHubClient::with_base_url(Some("t".to_string()), &server.url()).unwrap());
        ContributionAnalyzer::new(client, Arc::new(SessionCache::in_memory()))
    }

    const LIVE_BODY: &str = r#"{"data":{"user":{"contributionsCollection":{"contributionCalendar":{"weeks":[
        {"contributionDays":[
            {"date":"2024-06-02","contributionCount":1},
            {"date":"2024-06-03","contributionCount":1},
            {"date":"2024-06-04","contributionCount":0},
            {"date":"2024-06-05","contributionCount":1},
            {"date":"2024-06-06","contributionCount":1},
            {"date":"2024-06-07","contributionCount":1},
            {"date":"2024-06-08","contributionCount":0}
        ]}
    ]}}}}}"#;

    #[tokio::test]
    async fn live_calendar_is_analyzed_and_cached() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(LIVE_BODY)
            .expect(1)
            .create_async()
            .await;

        let analyzer = analyzer(&server);
        let today = date(2025, 3, 1);
        let cal = analyzer.calendar("octo", 2024, today).await.unwrap();

        assert_eq!(cal.source, CalendarSource::Live);
        assert_eq!(cal.range_start, date(2024, 1, 1));
        assert_eq!(cal.range_end, date(2024, 12, 31));
        assert_eq!(cal.total, 5);
        assert_eq!(cal.longest_streak, 3);
        // the latest day with data is 2024-06-08, which is empty
        assert_eq!(cal.current_streak, 0);
        assert!(cal.weeks.iter().all(|w| w.days.len() == 7));

        analyzer.calendar("octo", 2024, today).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failure_falls_back_to_tagged_mock_data() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"user":null},"errors":[{"message":"Could not resolve to a User"}]}"#)
            .expect(2)
            .create_async()
            .await;

        let analyzer = analyzer(&server);
        let today = date(2024, 8, 15);
        let first = analyzer.calendar("octo", 2024, today).await.unwrap();
        let second = analyzer.calendar("octo", 2024, today).await.unwrap();

        assert_eq!(first.source, CalendarSource::Mock);
        assert_eq!(first.range_end, today);
        assert_eq!(first.total, second.total);
        assert_eq!(first.weeks, second.weeks);
        // mock data is never cached, so the second call hit the API again
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn future_year_is_rejected() {
        let server = Server::new_async().await;
        let err = analyzer(&server).calendar("octo", 2031, date(2030, 1, 1)).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn years_before_github_are_rejected() {
        let server = Server::new_async().await;
        let analyzer = analyzer(&server);
        for year in [2007, 1900, -5, i32::MIN] {
            let err = analyzer.calendar("octo", year, date(2025, 3, 1)).await.unwrap_err();
            assert_eq!(err, FetchError::InvalidRequest("no contribution data before 2008".to_string()));
        }
    }

    fn calendar_body(days: &[(&str, u32)]) -> String {
        let days: Vec<serde_json::Value> = days
            .iter()
            .map(|(date, count)| serde_json::json!({"date": date, "contributionCount": count}))
            .collect();
        serde_json::json!({"data": {"user": {"contributionsCollection": {"contributionCalendar": {
            "weeks": [{"contributionDays": days}]
        }}}}})
        .to_string()
    }

    #[tokio::test]
    async fn current_year_is_refetched_when_the_day_changes() {
        let mut server = Server::new_async().await;
        let first_day = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(serde_json::json!({"variables": {"to": "2025-03-01T23:59:59Z"}})))
            .with_status(200)
            .with_body(calendar_body(&[("2025-03-01", 1)]))
            .expect(1)
            .create_async()
            .await;
        let second_day = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(serde_json::json!({"variables": {"to": "2025-03-02T23:59:59Z"}})))
            .with_status(200)
            .with_body(calendar_body(&[("2025-03-01", 1), ("2025-03-02", 4)]))
            .expect(1)
            .create_async()
            .await;

        let analyzer = analyzer(&server);
        for _ in 0..2 {
            let cal = analyzer.calendar("octo", 2025, date(2025, 3, 1)).await.unwrap();
            assert_eq!((cal.range_end, cal.total, cal.current_streak), (date(2025, 3, 1), 1, 1));
        }

        let cal = analyzer.calendar("octo", 2025, date(2025, 3, 2)).await.unwrap();
        assert_eq!(cal.source, CalendarSource::Live);
        assert_eq!(cal.range_end, date(2025, 3, 2));
        assert_eq!(cal.total, 5);
        assert_eq!(cal.current_streak, 2);

        first_day.assert_async().await;
        second_day.assert_async().await;
        assert_eq!(analyzer.cache.get::<Vec<ContributionDay>>("contributions:octo:2025:2025-03-01"), None);
    }

    #[test]
    fn analyze_counts_only_the_range() {
        let start = date(2024, 1, 1);
        let end = date(2024, 1, 3);
        let counts = DayCounts::from([
            (date(2023, 12, 31), 9),
            (date(2024, 1, 1), 2),
            (date(2024, 1, 2), 3),
            (date(2024, 1, 3), 1),
        ]);
        let cal = analyze("octo", 2024, start, end, &counts, end, CalendarSource::Live);
        assert_eq!(cal.total, 6);
        assert_eq!(cal.current_streak, 3);
        assert_eq!(cal.longest_streak, 3);
    }
}
