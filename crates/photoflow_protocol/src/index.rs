//! Local mirror tables the indexer adapter populates and the action resolver
//! and RPC reply parsers read. External to the job-lifecycle core proper, but
//! part of the Durable Store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::AccountId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MediaIndexRow {
    pub account_id: AccountId,
    pub media_key: String,
    pub dedup_key: Option<String>,
    pub thumb: Option<String>,
    pub res_width: Option<i64>,
    pub res_height: Option<i64>,
    pub timestamp: Option<i64>,
    pub timezone_offset: Option<i64>,
    pub creation_timestamp: Option<i64>,
    pub is_archived: bool,
    pub is_favorite: bool,
    pub duration: Option<i64>,
    pub description: Option<String>,
    /// Cleared wholesale and repopulated by the indexer's album-membership
    /// sync; briefly empty mid-sync by design (see DESIGN.md Open Question 2).
    #[sqlx(json)]
    pub album_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AlbumIndexRow {
    pub account_id: AccountId,
    pub media_key: String,
    pub owner_actor_id: Option<String>,
    pub title: Option<String>,
    pub item_count: Option<i64>,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
