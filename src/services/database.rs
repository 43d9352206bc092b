use crate::models::blog::BlogPost;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(sqlx::Error),
    #[error("database query error: {0}")]
    Query(#[from] sqlx::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        DatabaseError::InvalidData(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: String,
    title: String,
    content: String,
    date: String,
    images: String,
    videos: String,
    tags: String,
}

impl TryFrom<PostRow> for BlogPost {
    type Error = DatabaseError;

    fn try_from(row: PostRow) -> Result<Self> {
        let date = DateTime::parse_from_rfc3339(&row.date)
            .map_err(|e| DatabaseError::InvalidData(format!("post {} has a bad date: {}", row.id, e)))?
            .with_timezone(&Utc);

        Ok(BlogPost {
            id: row.id,
            title: row.title,
            content: row.content,
            date,
            images: serde_json::from_str(&row.images)?,
            videos: serde_json::from_str(&row.videos)?,
            tags: serde_json::from_str(&row.tags)?,
        })
    }
}

pub struct PostFields<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub images: &'a [String],
    pub videos: &'a [String],
    pub tags: &'a [String],
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(DatabaseError::Connection)?
            .create_if_missing(true);

        // each connection to an in-memory database gets its own copy
        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(DatabaseError::Connection)?;

        let db = Self { pool };
        db.initialize_tables().await?;

        info!("Database initialized at {}", database_url);
        Ok(db)
    }

    async fn initialize_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                date TEXT NOT NULL,
                images TEXT NOT NULL DEFAULT '[]',
                videos TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL DEFAULT '[]'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_date ON posts(date)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS site_views (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let seeded = sqlx::query("INSERT INTO site_views (id, count) VALUES (1, 0) ON CONFLICT(id) DO NOTHING")
            .execute(&self.pool)
            .await?;
        if seeded.rows_affected() > 0 {
            info!("Initialized site view counter");
        }

        Ok(())
    }

    pub async fn insert_post(&self, id: &str, date: DateTime<Utc>, fields: &PostFields<'_>) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, title, content, date, images, videos, tags) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(fields.title)
        .bind(fields.content)
        .bind(date.to_rfc3339_opts(SecondsFormat::Millis, true))
        .bind(serde_json::to_string(fields.images)?)
        .bind(serde_json::to_string(fields.videos)?)
        .bind(serde_json::to_string(fields.tags)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_posts(&self) -> Result<Vec<BlogPost>> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT id, title, content, date, images, videos, tags FROM posts ORDER BY date DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BlogPost::try_from).collect()
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, title, content, date, images, videos, tags FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BlogPost::try_from).transpose()
    }

    pub async fn update_post(&self, id: &str, fields: &PostFields<'_>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, images = ?, videos = ?, tags = ? WHERE id = ?",
        )
        .bind(fields.title)
        .bind(fields.content)
        .bind(serde_json::to_string(fields.images)?)
        .bind(serde_json::to_string(fields.videos)?)
        .bind(serde_json::to_string(fields.tags)?)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_post(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[cfg(test)]
    pub async fn count_posts(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn view_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT count FROM site_views WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(count.unwrap_or(0))
    }

    pub async fn increment_view_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO site_views (id, count) VALUES (1, 1)
            ON CONFLICT(id) DO UPDATE SET count = count + 1
            RETURNING count
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    #[cfg(test)]
    pub async fn drop_view_counter(&self) -> Result<()> {
        sqlx::query("DELETE FROM site_views").execute(&self.pool).await?;
        Ok(())
    }
}
