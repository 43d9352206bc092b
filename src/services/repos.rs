use crate::models::github::{Contributor, LanguageShare, RepoDetails, Repository};
use crate::services::cache::{SessionCache, cache_key};
use crate::services::github::{FetchError, GitHubClient, RepoRef};
use futures::future::join_all;
use log::{info, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

pub const FEATURED_LIMIT: usize = 2;
pub const CONTRIBUTORS_SHOWN: usize = 5;

const FEATURED_MIN_FORKS: u64 = 1;
const FEATURED_MIN_STARS: u64 = 2;
const NO_README: &str = "No README found.";
const README_ERROR: &str = "Error loading README.";

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepoSort {
    Stars,
    Forks,
    Updated,
    Name,
    #[default]
    Popularity,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RepoQuery {
    pub search: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub sort: RepoSort,
}

pub struct RepoAggregator {
    client: Arc<GitHubClient>,
    cache: Arc<SessionCache>,
}

impl RepoAggregator {
    pub fn new(client: Arc<GitHubClient>, cache: Arc<SessionCache>) -> Self {
        Self { client, cache }
    }

    pub async fn list_repos(&self, username: &str) -> Result<Vec<Repository>, FetchError> {
        self.cache
            .get_or_fetch(&cache_key::repos(username), || self.fetch_repos(username))
            .await
    }

    pub async fn featured(&self, username: &str) -> Result<Vec<Repository>, FetchError> {
        let repos = self.list_repos(username).await?;
        Ok(select_featured(&repos, username))
    }

    pub async fn organizations(&self, username: &str) -> Result<Vec<Repository>, FetchError> {
        self.cache
            .get_or_fetch(&cache_key::orgs(username), || async {
                let orgs = self.client.user_orgs(username).await?;
                info!("Fetched {} organizations for {}", orgs.len(), username);
                Ok::<_, FetchError>(orgs.into_iter().map(Repository::from).collect::<Vec<_>>())
            })
            .await
    }

    pub async fn details(&self, repo: &RepoRef) -> RepoDetails {
        let full_name = repo.full_name();
        let readme_key = cache_key::readme(&full_name);
        let languages_key = cache_key::languages(&full_name);
        let contributors_key = cache_key::contributors(&full_name);

        let (readme, languages, contributors) = futures::join!(
            self.cache.get_or_fetch(&readme_key, || self.client.readme(repo)),
            self.cache.get_or_fetch(&languages_key, || self.client.languages(repo)),
            self.cache.get_or_fetch(&contributors_key, || self.client.contributors(repo)),
        );

        let readme = match readme {
            Ok(text) => text,
            Err(FetchError::NotFound) => NO_README.to_string(),
            Err(e) => {
                warn!("README for {} unavailable: {}", full_name, e);
                README_ERROR.to_string()
            }
        };
        let languages = languages.unwrap_or_else(|e| {
            warn!("Languages for {} unavailable: {}", full_name, e);
            BTreeMap::new()
        });
        let contributors = contributors.unwrap_or_else(|e| {
            warn!("Contributors for {} unavailable: {}", full_name, e);
            Vec::new()
        });

        RepoDetails {
            language_breakdown: language_breakdown(&languages),
            contributors: top_contributors(contributors),
            full_name,
            readme,
            languages,
        }
    }

    pub fn forget_details(&self, repo: &RepoRef) {
        let full_name = repo.full_name();
        self.cache.invalidate(&cache_key::readme(&full_name));
        self.cache.invalidate(&cache_key::languages(&full_name));
        self.cache.invalidate(&cache_key::contributors(&full_name));
    }

    async fn fetch_repos(&self, username: &str) -> Result<Vec<Repository>, FetchError> {
        let repos = dedupe_by_full_name(self.client.list_user_repos(username).await?);
        info!("Fetched {} repositories for {}", repos.len(), username);

        let topics = join_all(repos.iter().map(|repo| self.topics_or_empty(repo))).await;

        let mut enriched: Vec<Repository> = repos
            .into_iter()
            .zip(topics)
            .map(|(repo, topics)| Repository { topics, ..repo })
            .collect();
        sort_by_popularity(&mut enriched);
        Ok(enriched)
    }

    async fn topics_or_empty(&self, repo: &Repository) -> Vec<String> {
        match self.client.repo_topics(&repo.owner.login, &repo.name).await {
            Ok(topics) => topics,
            Err(e) => {
                warn!("Topics for {} unavailable: {}", repo.full_name, e);
                Vec::new()
            }
        }
    }
}

pub fn sort_by_popularity(repos: &mut [Repository]) {
    repos.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
}

pub fn dedupe_by_full_name(repos: Vec<Repository>) -> Vec<Repository> {
    let mut seen = HashSet::new();
    repos
        .into_iter()
        .filter(|r| seen.insert(r.full_name.clone()))
        .collect()
}

pub fn select_featured(repos: &[Repository], username: &str) -> Vec<Repository> {
    let mut qualifying: Vec<Repository> = repos
        .iter()
        .filter(|r| r.forks_count >= FEATURED_MIN_FORKS && r.stargazers_count >= FEATURED_MIN_STARS)
        .cloned()
        .collect();

    if qualifying.is_empty() {
        return fallback_featured(username);
    }

    sort_by_popularity(&mut qualifying);
    qualifying.truncate(FEATURED_LIMIT);
    qualifying
}

pub fn fallback_featured(username: &str) -> Vec<Repository> {
    vec![
        Repository::placeholder(
            0,
            username,
            "profile",
            "GitHub profile",
            format!("https://github.com/{}", username),
        ),
        Repository::placeholder(
            1,
            username,
            "repositories",
            "All public repositories",
            format!("https://github.com/{}?tab=repositories", username),
        ),
    ]
}

pub fn filter_repos(repos: &[Repository], query: &RepoQuery) -> Vec<Repository> {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let language = query.language.as_deref().filter(|l| !l.is_empty() && *l != "all");

    let mut filtered: Vec<Repository> = repos
        .iter()
        .filter(|repo| match &needle {
            Some(n) => {
                repo.name.to_lowercase().contains(n)
                    || repo.description.as_deref().is_some_and(|d| d.to_lowercase().contains(n))
                    || repo.topics.iter().any(|t| t.to_lowercase().contains(n))
            }
            None => true,
        })
        .filter(|repo| language.is_none_or(|l| repo.language.as_deref() == Some(l)))
        .cloned()
        .collect();

    match query.sort {
        RepoSort::Stars => filtered.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count)),
        RepoSort::Forks => filtered.sort_by(|a, b| b.forks_count.cmp(&a.forks_count)),
        RepoSort::Updated => filtered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        RepoSort::Name => filtered.sort_by_key(|r| r.name.to_lowercase()),
        RepoSort::Popularity => sort_by_popularity(&mut filtered),
    }
    filtered
}

pub fn available_languages(repos: &[Repository]) -> Vec<String> {
    let mut languages: Vec<String> = repos
        .iter()
        .filter_map(|r| r.language.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    languages.sort();
    languages
}

pub fn group_by_language(repos: &[Repository]) -> BTreeMap<String, Vec<Repository>> {
    let mut groups: BTreeMap<String, Vec<Repository>> = BTreeMap::new();
    for repo in repos {
        let language = repo.language.clone().unwrap_or_else(|| "Other".to_string());
        groups.entry(language).or_default().push(repo.clone());
    }
    groups
}

pub fn language_breakdown(languages: &BTreeMap<String, u64>) -> Vec<LanguageShare> {
    let total: u64 = languages.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<LanguageShare> = languages
        .iter()
        .map(|(name, &bytes)| LanguageShare {
            name: name.clone(),
            bytes,
            percent: (bytes as f64 * 1000.0 / total as f64).round() / 10.0,
        })
        .collect();
    shares.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    shares
}

fn top_contributors(mut contributors: Vec<Contributor>) -> Vec<Contributor> {
    contributors.sort_by(|a, b| b.contributions.cmp(&a.contributions));
    contributors.truncate(CONTRIBUTORS_SHOWN);
    contributors
}
