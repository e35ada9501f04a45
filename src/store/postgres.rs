use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::{
    error::AppResult,
    models::{ContentType, EntryMeta, ListKind, UserProfile},
};

use super::ProfileStore;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Postgres-backed profile store
///
/// One row per (user, content type, list, title); the per-user document is
/// folded from rows on read.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileStore for PgProfileStore {
    async fn load_profile(&self, user_id: &str) -> AppResult<UserProfile> {
        let rows = sqlx::query(
            r#"
            SELECT content_type, list_kind, normalized_title,
                   poster_url, release_year, rating, viewed_at
            FROM swipe_entries
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut profile = UserProfile::default();

        for row in rows {
            let content_type: String = row.try_get("content_type")?;
            let list_kind: String = row.try_get("list_kind")?;
            let title: String = row.try_get("normalized_title")?;

            let content_type = match content_type.as_str() {
                "series" => ContentType::Series,
                _ => ContentType::Movie,
            };
            let Some(list) = ListKind::parse(&list_kind) else {
                tracing::warn!(list_kind = %list_kind, "Skipping row with unknown list kind");
                continue;
            };

            let meta = EntryMeta {
                poster_url: row.try_get("poster_url")?,
                year: row.try_get("release_year")?,
                rating: row.try_get("rating")?,
                viewed_at: row.try_get("viewed_at")?,
            };

            let lists = profile.lists_mut(content_type);
            match list {
                ListKind::Seen => {
                    lists.seen.insert(title, meta);
                }
                ListKind::ToWatch => {
                    lists.to_watch.insert(title, meta);
                }
                ListKind::Rejected => {
                    lists.rejected.insert(title);
                }
            }
        }

        Ok(profile)
    }

    async fn add_entry(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
        title: &str,
        meta: &EntryMeta,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO swipe_entries
                (user_id, content_type, list_kind, normalized_title,
                 poster_url, release_year, rating, viewed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, content_type, list_kind, normalized_title)
            DO UPDATE SET poster_url = EXCLUDED.poster_url,
                          release_year = EXCLUDED.release_year,
                          rating = EXCLUDED.rating,
                          viewed_at = EXCLUDED.viewed_at
            "#,
        )
        .bind(user_id)
        .bind(content_type.to_string())
        .bind(list.as_str())
        .bind(title)
        .bind(&meta.poster_url)
        .bind(meta.year)
        .bind(meta.rating)
        .bind(meta.viewed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_entry(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
        title: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM swipe_entries
            WHERE user_id = $1 AND content_type = $2
              AND list_kind = $3 AND normalized_title = $4
            "#,
        )
        .bind(user_id)
        .bind(content_type.to_string())
        .bind(list.as_str())
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_list(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM swipe_entries
            WHERE user_id = $1 AND content_type = $2 AND list_kind = $3
            "#,
        )
        .bind(user_id)
        .bind(content_type.to_string())
        .bind(list.as_str())
        .execute(&self.pool)
        .await?;

        tracing::info!(
            user_id = %user_id,
            list = list.as_str(),
            removed = result.rows_affected(),
            "List cleared"
        );

        Ok(())
    }
}
