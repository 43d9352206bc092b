use crate::models::contributions::ContributionDay;
use crate::models::github::{
    CalendarData, Contributor, GraphQlResponse, Organization, ReadmeContent, Repository, Topics,
};
use base64::{Engine as _, engine::general_purpose};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const V3_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const TOPICS_MEDIA_TYPE: &str = "application/vnd.github.mercy-preview+json";
const REPOS_PER_PAGE: u32 = 100;

const CONTRIBUTIONS_QUERY: &str = r#"
query($username: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $username) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
    }
  }
}
"#;

lazy_static! {
    static ref GITHUB_URL_REGEX: Regex = Regex::new(
        r"github\.com/([^/\s]+)/([^/\s?#]+)"
    ).unwrap();
    static ref FULL_NAME_REGEX: Regex = Regex::new(
        r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$"
    ).unwrap();
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("GitHub rejected the credentials (HTTP {0})")]
    Unauthorized(u16),
    #[error("GitHub resource not found")]
    NotFound,
    #[error("GitHub API rate limit exceeded")]
    RateLimited,
    #[error("GitHub API error: HTTP {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected GitHub response: {0}")]
    Malformed(String),
    #[error("GraphQL query failed: {0}")]
    GraphQl(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Auth,
    NotFound,
    RateLimited,
    Http,
    Network,
    Malformed,
    Query,
    Request,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Unauthorized(_) => FetchErrorKind::Auth,
            FetchError::NotFound => FetchErrorKind::NotFound,
            FetchError::RateLimited => FetchErrorKind::RateLimited,
            FetchError::Status(_) => FetchErrorKind::Http,
            FetchError::Network(_) => FetchErrorKind::Network,
            FetchError::Malformed(_) => FetchErrorKind::Malformed,
            FetchError::GraphQl(_) => FetchErrorKind::Query,
            FetchError::InvalidRequest(_) => FetchErrorKind::Request,
        }
    }

    // Classifies a non-2xx response. GitHub reports an exhausted quota as 403 (or 429)
    // with `x-ratelimit-remaining: 0`, or with a message mentioning the rate limit.
    pub fn from_status(status: u16, quota_exhausted: bool, body: &str) -> Self {
        let mentions_limit = body.to_lowercase().contains("rate limit");
        match status {
            401 => FetchError::Unauthorized(status),
            403 | 429 if quota_exhausted || mentions_limit => FetchError::RateLimited,
            429 => FetchError::RateLimited,
            403 => FetchError::Unauthorized(status),
            404 => FetchError::NotFound,
            _ => FetchError::Status(status),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: &str, name: &str) -> Result<Self, FetchError> {
        Self::parse(&format!("{}/{}", owner, name))
    }

    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let input = input.trim();
        let caps = FULL_NAME_REGEX
            .captures(input)
            .or_else(|| GITHUB_URL_REGEX.captures(input))
            .ok_or_else(|| FetchError::InvalidRequest(format!("not a repository: {}", input)))?;

        let owner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let name = caps
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .trim_end_matches(".git");

        if owner.is_empty() || name.is_empty() {
            return Err(FetchError::InvalidRequest(format!("not a repository: {}", input)));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    authenticated: bool,
}

impl GitHubClient {
    pub fn with_base_url(token: Option<String>, base_url: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("portfolio-backend"));
        headers.insert(ACCEPT, HeaderValue::from_static(V3_MEDIA_TYPE));

        let token = token.filter(|t| !t.trim().is_empty());
        let authenticated = token.is_some();
        if let Some(t) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", t.trim()))
                .map_err(|_| FetchError::InvalidRequest("GitHub token is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authenticated,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub async fn list_user_repos(&self, username: &str) -> Result<Vec<Repository>, FetchError> {
        let path = format!("/users/{}/repos?sort=updated&per_page={}", username, REPOS_PER_PAGE);
        self.get_json(&path, None).await
    }

    pub async fn repo_topics(&self, owner: &str, repo: &str) -> Result<Vec<String>, FetchError> {
        let path = format!("/repos/{}/{}/topics", owner, repo);
        let topics: Topics = self.get_json(&path, Some(TOPICS_MEDIA_TYPE)).await?;
        Ok(topics.names)
    }

    pub async fn user_orgs(&self, username: &str) -> Result<Vec<Organization>, FetchError> {
        self.get_json(&format!("/users/{}/orgs", username), None).await
    }

    pub async fn readme(&self, repo: &RepoRef) -> Result<String, FetchError> {
        let path = format!("/repos/{}/{}/readme", repo.owner, repo.name);
        let readme: ReadmeContent = self.get_json(&path, None).await?;
        decode_readme(readme)
    }

    pub async fn languages(&self, repo: &RepoRef) -> Result<BTreeMap<String, u64>, FetchError> {
        self.get_json(&format!("/repos/{}/{}/languages", repo.owner, repo.name), None).await
    }

    pub async fn contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>, FetchError> {
        // 204 No Content is what GitHub sends for an empty repository
        let path = format!("/repos/{}/{}/contributors", repo.owner, repo.name);
        let body = self.get_text(&path, None).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_body(&path, &body)
    }

    pub async fn contribution_calendar(
        &self,
        username: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ContributionDay>, FetchError> {
        let variables = json!({
            "username": username,
            "from": format!("{}T00:00:00Z", from),
            "to": format!("{}T23:59:59Z", to),
        });
        let data: CalendarData = self.post_graphql(CONTRIBUTIONS_QUERY, variables).await?;

        let calendar = data
            .user
            .ok_or_else(|| FetchError::GraphQl(format!("no such user: {}", username)))?
            .contributions_collection
            .contribution_calendar
            .ok_or_else(|| FetchError::GraphQl("response carried no contribution calendar".to_string()))?;

        Ok(calendar
            .weeks
            .into_iter()
            .flat_map(|week| week.contribution_days)
            .map(|day| ContributionDay::new(day.date, day.contribution_count))
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, accept: Option<&'static str>) -> Result<T, FetchError> {
        let body = self.get_text(path, accept).await?;
        parse_body(path, &body)
    }

    async fn get_text(&self, path: &str, accept: Option<&'static str>) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(media_type) = accept {
            request = request.header(ACCEPT, media_type);
        }

        let response = check_status(request.send().await?).await?;
        Ok(response.text().await?)
    }

    async fn post_graphql<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T, FetchError> {
        let url = format!("{}/graphql", self.base_url);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;

        let envelope: GraphQlResponse<T> = parse_body("/graphql", &body)?;
        if !envelope.errors.is_empty() {
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(FetchError::GraphQl(messages.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| FetchError::GraphQl("response carried no data".to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);
    let error_text = response.text().await.unwrap_or_default();
    error!("GitHub API error {}: {}", status, error_text);

    Err(FetchError::from_status(status.as_u16(), quota_exhausted, &error_text))
}

fn parse_body<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse response from {}: {}", path, e);
        error!("Response preview: {}", body.chars().take(500).collect::<String>());
        FetchError::Malformed(e.to_string())
    })
}

fn decode_readme(readme: ReadmeContent) -> Result<String, FetchError> {
    if readme.encoding != "base64" {
        return Ok(readme.content);
    }

    let cleaned = readme.content.replace('\n', "").replace('\r', "");
    let bytes = general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| FetchError::Malformed(format!("README is not valid base64: {}", e)))?;
    String::from_utf8(bytes).map_err(|_| FetchError::Malformed("README is not valid UTF-8".to_string()))
}
