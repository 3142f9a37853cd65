//! # Category Repository
//!
//! Categories only scope promotions; the catalog itself is flat.

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use sweets_core::Category;

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    is_active: bool,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn insert(&self, category: &Category) -> DbResult<Category> {
        debug!(slug = %category.slug, "Inserting category");

        sqlx::query("INSERT INTO categories (id, name, slug, is_active) VALUES (?1, ?2, ?3, ?4)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.is_active)
            .execute(&self.pool)
            .await?;

        Ok(category.clone())
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, is_active FROM categories WHERE slug = ?1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, is_active FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }
}
