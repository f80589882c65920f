use super::{cosine_similarity, RecipeRepository};
use crate::error::{ColunchError, Result};
use crate::model::Recipe;
use async_trait::async_trait;
use log::{debug, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

const CREATE_RECIPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS recipes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    summary TEXT NOT NULL,
    content TEXT NOT NULL,
    embedding TEXT NOT NULL
)
"#;

#[derive(FromRow)]
struct RecipeRow {
    id: String,
    name: String,
    summary: String,
    content: String,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: row.id,
            name: row.name,
            summary: row.summary,
            content: row.content,
        }
    }
}

#[derive(FromRow)]
struct EmbeddedRow {
    #[sqlx(flatten)]
    recipe: RecipeRow,
    embedding: String,
}

/// Single-table relational store. Similarity search scans every stored
/// embedding.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect and create the table if needed
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to an in-memory database sees its own database, so
        // keep exactly one alive for the lifetime of the pool.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_RECIPES_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl RecipeRepository for SqliteRepository {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn store(&self, recipe: &Recipe, vector: &[f32]) -> Result<()> {
        let embedding = serde_json::to_string(vector)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO recipes (id, name, summary, content, embedding)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.name)
        .bind(&recipe.summary)
        .bind(&recipe.content)
        .bind(embedding)
        .execute(&self.pool)
        .await?;

        debug!("Stored recipe {}", recipe.id);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Recipe> {
        let row: Option<RecipeRow> =
            sqlx::query_as("SELECT id, name, summary, content FROM recipes WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Recipe::from)
            .ok_or_else(|| ColunchError::NotFound(id.to_string()))
    }

    async fn search(&self, vector: &[f32], top_n: usize) -> Result<Vec<Recipe>> {
        let rows: Vec<EmbeddedRow> =
            sqlx::query_as("SELECT id, name, summary, content, embedding FROM recipes")
                .fetch_all(&self.pool)
                .await?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let embedding: Vec<f32> = serde_json::from_str(&row.embedding)?;
            match cosine_similarity(vector, &embedding) {
                Some(score) => scored.push((score, Recipe::from(row.recipe))),
                None => warn!("Skipping recipe {} with incompatible embedding", row.recipe.id),
            }
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        scored.truncate(top_n);

        Ok(scored.into_iter().map(|(_, recipe)| recipe).collect())
    }
}
