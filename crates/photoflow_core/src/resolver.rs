//! Turns a preview request's explicit selection or implicit query into a
//! concrete, deduplicated list of media keys, plus a small sample for UI
//! preview. Grounded on `action_service.py`'s `_resolve_target_keys` /
//! `_sample_rows`.

use photoflow_db::MediaIndexRepo;
use photoflow_protocol::{AccountId, MediaIndexRow};
use sqlx::SqlitePool;

use crate::error::CoreError;

const PAGE_SIZE: u32 = 500;
const MAX_COLLECT: usize = 5_000;
const SAMPLE_LIMIT: usize = 12;
const TRUNCATION_WARNING: &str = "Result was truncated to 5000 items for safety";

pub struct ResolvedTargets {
    pub media_keys: Vec<String>,
    pub warnings: Vec<String>,
    pub sample_rows: Vec<MediaIndexRow>,
}

pub struct ActionResolver<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ActionResolver<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// `selected_media_keys`, when present, always wins over a query walk.
    pub async fn resolve(
        &self,
        account_id: &AccountId,
        selected_media_keys: Option<&[String]>,
    ) -> Result<ResolvedTargets, CoreError> {
        let (media_keys, warnings) = match selected_media_keys {
            Some(selected) if !selected.is_empty() => (dedup_preserve_order(selected), Vec::new()),
            _ => self.walk_index(account_id).await?,
        };

        let sample_rows = self.sample_rows(account_id, &media_keys).await?;
        Ok(ResolvedTargets {
            media_keys,
            warnings,
            sample_rows,
        })
    }

    async fn walk_index(&self, account_id: &AccountId) -> Result<(Vec<String>, Vec<String>), CoreError> {
        let repo = MediaIndexRepo::new(self.pool);
        let mut collected = Vec::new();
        let mut warnings = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = repo.query_page(account_id, cursor.as_deref(), PAGE_SIZE).await?;
            if page.items.is_empty() {
                break;
            }
            for item in &page.items {
                collected.push(item.media_key.clone());
                if collected.len() >= MAX_COLLECT {
                    warnings.push(TRUNCATION_WARNING.to_string());
                    break;
                }
            }
            if collected.len() >= MAX_COLLECT {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok((dedup_preserve_order(&collected), warnings))
    }

    async fn sample_rows(
        &self,
        account_id: &AccountId,
        media_keys: &[String],
    ) -> Result<Vec<MediaIndexRow>, CoreError> {
        if media_keys.is_empty() {
            return Ok(Vec::new());
        }
        let take = (SAMPLE_LIMIT * 8).max(1).min(media_keys.len());
        let repo = MediaIndexRepo::new(self.pool);
        let mut rows = repo.get_many(account_id, &media_keys[..take]).await?;
        rows.truncate(SAMPLE_LIMIT);
        Ok(rows)
    }
}

fn dedup_preserve_order(keys: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keys.iter()
        .filter(|key| !key.is_empty())
        .filter(|key| seen.insert((*key).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let keys = vec!["b".to_string(), "a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(dedup_preserve_order(&keys), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn explicit_selection_skips_the_index_walk() {
        let pool = photoflow_db::create_pool(photoflow_db::DbConfig::memory())
            .await
            .unwrap();
        let resolver = ActionResolver::new(&pool);
        let account_id = AccountId::new();
        let selected = vec!["m1".to_string(), "m1".to_string(), "m2".to_string()];

        let resolved = resolver
            .resolve(&account_id, Some(&selected))
            .await
            .unwrap();

        assert_eq!(resolved.media_keys, vec!["m1", "m2"]);
        assert!(resolved.warnings.is_empty());
    }
}
