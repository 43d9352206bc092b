use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    pub html_url: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Repository {
    pub fn popularity(&self) -> u64 {
        self.stargazers_count + self.forks_count
    }

    pub fn placeholder(id: u64, owner: &str, name: &str, description: &str, html_url: String) -> Self {
        Self {
            id,
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            owner: Owner {
                login: owner.to_string(),
                avatar_url: None,
                kind: None,
            },
            html_url,
            description: Some(description.to_string()),
            homepage: None,
            language: None,
            topics: Vec::new(),
            stargazers_count: 0,
            forks_count: 0,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
            pushed_at: None,
            size: 0,
            archived: false,
            disabled: false,
            private: false,
            fork: false,
            avatar_url: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Owner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Organization {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Organization> for Repository {
    fn from(org: Organization) -> Self {
        let now = Utc::now();
        let description = org
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Organization: {}", org.login));
        let homepage = org.blog.filter(|b| !b.trim().is_empty());
        let updated_at = org.updated_at.unwrap_or(now);

        Self {
            id: org.id,
            name: org.login.clone(),
            full_name: org.login.clone(),
            owner: Owner {
                login: org.login.clone(),
                avatar_url: org.avatar_url.clone(),
                kind: Some("Organization".to_string()),
            },
            html_url: format!("https://github.com/{}", org.login),
            description: Some(description),
            homepage,
            language: None,
            topics: Vec::new(),
            stargazers_count: 0,
            forks_count: 0,
            created_at: org.created_at.unwrap_or(now),
            updated_at,
            pushed_at: Some(updated_at),
            size: 0,
            archived: false,
            disabled: false,
            private: false,
            fork: false,
            avatar_url: org.avatar_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Contributor {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Debug, Deserialize)]
pub struct Topics {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReadmeContent {
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LanguageShare {
    pub name: String,
    pub bytes: u64,
    pub percent: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct RepoDetails {
    pub full_name: String,
    pub readme: String,
    pub languages: BTreeMap<String, u64>,
    pub language_breakdown: Vec<LanguageShare>,
    pub contributors: Vec<Contributor>,
}

// GraphQL envelope

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CalendarData {
    pub user: Option<CalendarUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarUser {
    pub contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionsCollection {
    pub contribution_calendar: Option<RawCalendar>,
}

#[derive(Debug, Deserialize)]
pub struct RawCalendar {
    #[serde(default)]
    pub weeks: Vec<RawWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWeek {
    #[serde(default)]
    pub contribution_days: Vec<RawDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDay {
    pub date: chrono::NaiveDate,
    pub contribution_count: u32,
}
