use crate::models::blog::{BlogPost, PostInput, ViewCount};
use crate::services::auth::AdminGate;
use crate::services::database::{Database, DatabaseError, PostFields};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::Utc;
use log::{error, info};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Post not found")]
    NotFound,
    #[error("store failure: {0}")]
    Store(String),
}

impl From<DatabaseError> for BlogError {
    fn from(e: DatabaseError) -> Self {
        BlogError::Store(e.to_string())
    }
}

impl ResponseError for BlogError {
    fn status_code(&self) -> StatusCode {
        match self {
            BlogError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BlogError::Unauthorized | BlogError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            BlogError::NotFound => StatusCode::NOT_FOUND,
            BlogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            BlogError::Store(detail) => {
                error!("Blog store error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;

struct ValidPost {
    title: String,
    content: String,
    images: Vec<String>,
    videos: Vec<String>,
    tags: Vec<String>,
}

impl ValidPost {
    fn fields(&self) -> PostFields<'_> {
        PostFields {
            title: &self.title,
            content: &self.content,
            images: &self.images,
            videos: &self.videos,
            tags: &self.tags,
        }
    }
}

fn validate(input: PostInput) -> Result<ValidPost> {
    let title = input.title.unwrap_or_default().trim().to_string();
    let content = input.content.unwrap_or_default().trim().to_string();

    match (title.is_empty(), content.is_empty()) {
        (true, true) => return Err(BlogError::InvalidInput("Title and content are required".to_string())),
        (true, false) => return Err(BlogError::InvalidInput("Title is required".to_string())),
        (false, true) => return Err(BlogError::InvalidInput("Content is required".to_string())),
        (false, false) => {}
    }

    let mut seen = HashSet::new();
    let tags = input
        .tags
        .unwrap_or_default()
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect();

    Ok(ValidPost {
        title,
        content,
        images: input.images.unwrap_or_default(),
        videos: input.videos.unwrap_or_default(),
        tags,
    })
}

pub struct BlogService {
    db: Database,
    gate: Arc<dyn AdminGate>,
}

impl BlogService {
    pub fn new(db: Database, gate: Arc<dyn AdminGate>) -> Self {
        Self { db, gate }
    }

    pub fn authorize(&self, credential: Option<&str>) -> Result<()> {
        match credential {
            Some(secret) if self.gate.has_admin_capability(secret) => Ok(()),
            _ => Err(BlogError::Unauthorized),
        }
    }

    pub fn login(&self, secret: &str) -> Result<()> {
        if self.gate.has_admin_capability(secret) {
            info!("Admin login succeeded");
            Ok(())
        } else {
            info!("Admin login rejected");
            Err(BlogError::InvalidCredentials)
        }
    }

    pub async fn list(&self) -> Result<Vec<BlogPost>> {
        Ok(self.db.list_posts().await?)
    }

    pub async fn get(&self, id: &str) -> Result<BlogPost> {
        self.db.get_post(id).await?.ok_or(BlogError::NotFound)
    }

    pub async fn create(&self, credential: Option<&str>, input: PostInput) -> Result<BlogPost> {
        self.authorize(credential)?;
        let post = validate(input)?;

        let id = Uuid::new_v4().to_string();
        self.db.insert_post(&id, Utc::now(), &post.fields()).await?;
        info!("Created post {}", id);

        self.get(&id).await
    }

    pub async fn update(&self, credential: Option<&str>, id: &str, input: PostInput) -> Result<BlogPost> {
        self.authorize(credential)?;
        let post = validate(input)?;

        if !self.db.update_post(id, &post.fields()).await? {
            return Err(BlogError::NotFound);
        }
        info!("Updated post {}", id);

        self.get(id).await
    }

    pub async fn delete(&self, credential: Option<&str>, id: &str) -> Result<()> {
        self.authorize(credential)?;

        if !self.db.delete_post(id).await? {
            return Err(BlogError::NotFound);
        }
        info!("Deleted post {}", id);
        Ok(())
    }

    pub async fn view_count(&self) -> Result<ViewCount> {
        let count = self.db.view_count().await?;
        Ok(ViewCount { count: count.max(0) as u64 })
    }

    pub async fn increment_views(&self) -> Result<ViewCount> {
        let count = self.db.increment_view_count().await?;
        Ok(ViewCount { count: count.max(0) as u64 })
    }

    #[cfg(test)]
    pub fn database(&self) -> &Database {
        &self.db
    }
}
