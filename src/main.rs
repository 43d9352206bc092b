use actix_web::{web, App, HttpServer, middleware};
use actix_cors::Cors;
use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use log::{info, warn};

mod config;
mod handlers;
mod models;
mod services;
mod utils;

use config::Config;
use handlers::AppState;
use services::auth::SharedSecret;
use services::blog::BlogService;
use services::cache::SessionCache;
use services::contributions::ContributionAnalyzer;
use services::database::Database;
use services::github::GitHubClient;
use services::repos::RepoAggregator;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    let github_client = Arc::new(
        GitHubClient::with_base_url(config.github_token.clone(), &config.github_api_url)
            .context("Failed to create GitHub client")?,
    );
    if !github_client.is_authenticated() {
        warn!("GITHUB_TOKEN not set; contribution calendars will use generated data");
    }

    let database = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;

    let cache = Arc::new(SessionCache::in_memory());
    let app_state = web::Data::new(AppState {
        username: config.github_username.clone(),
        blog: BlogService::new(database, Arc::new(SharedSecret::new(config.admin_token.clone()))),
        repos: RepoAggregator::new(github_client.clone(), cache.clone()),
        contributions: ContributionAnalyzer::new(github_client, cache.clone()),
        cache,
    });

    let bind_addr = config.bind_addr();
    info!("Starting server on {} for GitHub user {}", bind_addr, config.github_username);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(handlers::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
