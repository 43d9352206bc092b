pub mod blog;
pub mod github;

use crate::services::auth::bearer_token;
use crate::services::blog::BlogService;
use crate::services::cache::SessionCache;
use crate::services::contributions::ContributionAnalyzer;
use crate::services::repos::RepoAggregator;
use actix_web::error::InternalError;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;
use std::sync::Arc;

const JSON_LIMIT: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub username: String,
    pub blog: BlogService,
    pub repos: RepoAggregator,
    pub contributions: ContributionAnalyzer,
    pub cache: Arc<SessionCache>,
}

pub fn credential(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().limit(JSON_LIMIT).error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({ "error": err.to_string() }));
        InternalError::from_response(err, response).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(blog::health))
            .route("/posts", web::get().to(blog::list_posts))
            .route("/posts", web::post().to(blog::create_post))
            .route("/posts/{id}", web::get().to(blog::get_post))
            .route("/posts/{id}", web::put().to(blog::update_post))
            .route("/posts/{id}", web::delete().to(blog::delete_post))
            .route("/admin/login", web::post().to(blog::login))
            .route("/views", web::get().to(blog::get_views))
            .route("/views", web::post().to(blog::increment_views))
            .service(
                web::scope("/github")
                    .route("/repos", web::get().to(github::get_repos))
                    .route("/repos/languages", web::get().to(github::get_repo_languages))
                    .route("/repos/grouped", web::get().to(github::get_repos_by_language))
                    .route("/repos/{owner}/{repo}", web::get().to(github::get_repo_details))
                    .route("/featured", web::get().to(github::get_featured))
                    .route("/orgs", web::get().to(github::get_organizations))
                    .route("/contributions", web::get().to(github::get_contributions))
                    .route("/refresh", web::post().to(github::refresh)),
            ),
    );
}
