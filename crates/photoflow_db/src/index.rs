//! Local media/album mirror tables: upserted by the indexer adapter, read
//! page-wise by the action resolver.

use chrono::Utc;
use photoflow_protocol::{AccountId, AlbumIndexRow, MediaIndexRow};
use sqlx::SqlitePool;

use crate::pool::DbError;

/// One page of a resolver query over the local media index.
pub struct MediaPage {
    pub items: Vec<MediaIndexRow>,
    pub next_cursor: Option<String>,
}

pub struct MediaIndexRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MediaIndexRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, row: &MediaIndexRow) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO media_index (
                account_id, media_key, dedup_key, thumb, res_width, res_height,
                timestamp, timezone_offset, creation_timestamp, is_archived,
                is_favorite, duration, description, album_ids, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (account_id, media_key) DO UPDATE SET
                dedup_key = excluded.dedup_key,
                thumb = excluded.thumb,
                res_width = excluded.res_width,
                res_height = excluded.res_height,
                timestamp = excluded.timestamp,
                timezone_offset = excluded.timezone_offset,
                creation_timestamp = excluded.creation_timestamp,
                is_archived = excluded.is_archived,
                is_favorite = excluded.is_favorite,
                duration = excluded.duration,
                description = excluded.description,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&row.account_id)
        .bind(&row.media_key)
        .bind(&row.dedup_key)
        .bind(&row.thumb)
        .bind(row.res_width)
        .bind(row.res_height)
        .bind(row.timestamp)
        .bind(row.timezone_offset)
        .bind(row.creation_timestamp)
        .bind(row.is_archived)
        .bind(row.is_favorite)
        .bind(row.duration)
        .bind(&row.description)
        .bind(sqlx::types::Json(&row.album_ids))
        .bind(row.updated_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Clears `album_ids` on every row for the account. The indexer calls
    /// this before repopulating membership from the paginated album calls;
    /// there is a window, bounded by the sync's own duration, during which a
    /// row's `album_ids` reads empty. Preserved intentionally (DESIGN.md
    /// Open Question 2) — not a bug.
    pub async fn clear_album_memberships(&self, account_id: &AccountId) -> Result<(), DbError> {
        sqlx::query("UPDATE media_index SET album_ids = '[]', updated_at = ? WHERE account_id = ?")
            .bind(Utc::now())
            .bind(account_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn append_album_membership(
        &self,
        account_id: &AccountId,
        media_key: &str,
        album_id: &str,
    ) -> Result<(), DbError> {
        let row = sqlx::query_as::<_, MediaIndexRow>(
            "SELECT * FROM media_index WHERE account_id = ? AND media_key = ?",
        )
        .bind(account_id)
        .bind(media_key)
        .fetch_optional(self.pool)
        .await?;

        let Some(mut row) = row else {
            return Ok(());
        };
        if !row.album_ids.iter().any(|id| id == album_id) {
            row.album_ids.push(album_id.to_string());
            row.updated_at = Utc::now();
            self.upsert(&row).await?;
        }
        Ok(())
    }

    /// Page through the index for an account in `media_key` order. `cursor`
    /// is the last-seen `media_key` from the previous page, or `None` for
    /// the first page. Mirrors the resolver's query contract (§4.3): callers
    /// clamp `page_size` to 500 themselves.
    pub async fn query_page(
        &self,
        account_id: &AccountId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<MediaPage, DbError> {
        let rows = if let Some(cursor) = cursor {
            sqlx::query_as::<_, MediaIndexRow>(
                "SELECT * FROM media_index WHERE account_id = ? AND media_key > ? \
                 ORDER BY media_key ASC LIMIT ?",
            )
            .bind(account_id)
            .bind(cursor)
            .bind(page_size as i64)
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query_as::<_, MediaIndexRow>(
                "SELECT * FROM media_index WHERE account_id = ? ORDER BY media_key ASC LIMIT ?",
            )
            .bind(account_id)
            .bind(page_size as i64)
            .fetch_all(self.pool)
            .await?
        };

        let next_cursor = rows.last().map(|row| row.media_key.clone());
        Ok(MediaPage {
            items: rows,
            next_cursor,
        })
    }

    pub async fn get_many(
        &self,
        account_id: &AccountId,
        media_keys: &[String],
    ) -> Result<Vec<MediaIndexRow>, DbError> {
        if media_keys.is_empty() {
            return Ok(Vec::new());
        }
        // SQLite has no array bind; build a `(?, ?, ...)` placeholder list.
        let placeholders = std::iter::repeat("?")
            .take(media_keys.len())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT * FROM media_index WHERE account_id = ? AND media_key IN ({placeholders})"
        );
        let mut query = sqlx::query_as::<_, MediaIndexRow>(&sql).bind(account_id);
        for key in media_keys {
            query = query.bind(key);
        }
        let rows = query.fetch_all(self.pool).await?;
        Ok(rows)
    }
}

pub struct AlbumIndexRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AlbumIndexRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, row: &AlbumIndexRow) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO album_index (
                account_id, media_key, owner_actor_id, title, item_count,
                is_shared, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (account_id, media_key) DO UPDATE SET
                owner_actor_id = excluded.owner_actor_id,
                title = excluded.title,
                item_count = excluded.item_count,
                is_shared = excluded.is_shared,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&row.account_id)
        .bind(&row.media_key)
        .bind(&row.owner_actor_id)
        .bind(&row.title)
        .bind(row.item_count)
        .bind(row.is_shared)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn list(&self, account_id: &AccountId) -> Result<Vec<AlbumIndexRow>, DbError> {
        let rows = sqlx::query_as::<_, AlbumIndexRow>(
            "SELECT * FROM album_index WHERE account_id = ? ORDER BY created_at ASC",
        )
        .bind(account_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
