use crate::handlers::{AppState, credential};
use crate::models::fetch::FetchState;
use crate::services::blog::BlogError;
use crate::services::github::{FetchError, FetchErrorKind, RepoRef};
use crate::services::repos::{RepoQuery, available_languages, filter_repos, group_by_language};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{Datelike, Local};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ContributionsQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    pub repo: Option<String>,
}

fn respond<T, U: serde::Serialize>(what: &str, result: Result<T, FetchError>, present: impl FnOnce(T) -> U) -> HttpResponse {
    if let Err(e) = &result {
        match e.kind() {
            FetchErrorKind::RateLimited | FetchErrorKind::NotFound => warn!("Failed to load {}: {}", what, e),
            _ => error!("Failed to load {}: {}", what, e),
        }
    }
    HttpResponse::Ok().json(FetchState::from_result(result.map(present)))
}

pub async fn get_repos(query: web::Query<RepoQuery>, data: web::Data<AppState>) -> HttpResponse {
    let result = data.repos.list_repos(&data.username).await;
    respond("repositories", result, |repos| filter_repos(&repos, &query))
}

pub async fn get_repo_languages(data: web::Data<AppState>) -> HttpResponse {
    let result = data.repos.list_repos(&data.username).await;
    respond("repository languages", result, |repos| available_languages(&repos))
}

pub async fn get_repos_by_language(data: web::Data<AppState>) -> HttpResponse {
    let result = data.repos.list_repos(&data.username).await;
    respond("repository groups", result, |repos| group_by_language(&repos))
}

pub async fn get_featured(data: web::Data<AppState>) -> HttpResponse {
    let result = data.repos.featured(&data.username).await;
    respond("featured repositories", result, |repos| repos)
}

pub async fn get_organizations(data: web::Data<AppState>) -> HttpResponse {
    let result = data.repos.organizations(&data.username).await;
    respond("organizations", result, |orgs| orgs)
}

pub async fn get_repo_details(path: web::Path<(String, String)>, data: web::Data<AppState>) -> HttpResponse {
    let (owner, name) = path.into_inner();
    match RepoRef::new(&owner, &name) {
        Ok(repo) => HttpResponse::Ok().json(FetchState::ready(data.repos.details(&repo).await)),
        Err(e) => HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    }
}

pub async fn get_contributions(query: web::Query<ContributionsQuery>, data: web::Data<AppState>) -> HttpResponse {
    let today = Local::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());

    match data.contributions.calendar(&data.username, year, today).await {
        Err(e @ FetchError::InvalidRequest(_)) => HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
        result => respond("contributions", result, |calendar| calendar),
    }
}

pub async fn refresh(
    req: HttpRequest,
    query: web::Query<RefreshQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, BlogError> {
    data.blog.authorize(credential(&req))?;

    let Some(input) = query.repo.as_deref() else {
        data.cache.clear();
        info!("Session cache cleared");
        return Ok(HttpResponse::Ok().json(json!({ "message": "Cache cleared" })));
    };

    let repo = RepoRef::parse(input).map_err(|e| BlogError::InvalidInput(e.to_string()))?;
    data.repos.forget_details(&repo);
    info!("Cached details for {} cleared", repo.full_name());
    Ok(HttpResponse::Ok().json(json!({ "message": format!("Cache cleared for {}", repo.full_name()) })))
}
