//! Indexer adapter: paginates the remote library, favorites, trash, and
//! albums into the local mirror tables, then enriches rows with a batched
//! media-info call. Bounded by `max_items`.

use async_trait::async_trait;
use chrono::Utc;
use photoflow_protocol::{AlbumIndexRow, MediaIndexRow};
use photoflow_rpc::{RpcClient, RpcClientConfig};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::catalog;
use crate::{Adapter, AdapterError, AdapterOutcome, Credentials, ProgressSink};

const DEFAULT_MAX_ITEMS: usize = 3_000;
const MEDIA_INFO_CHUNK: usize = 120;

pub struct IndexerAdapter {
    pool: SqlitePool,
    rpc_config: RpcClientConfig,
}

impl IndexerAdapter {
    pub fn new(pool: SqlitePool, rpc_config: RpcClientConfig) -> Self {
        Self { pool, rpc_config }
    }

    async fn paginate_library(
        &self,
        client: &RpcClient,
        account_id: &photoflow_protocol::AccountId,
        session: &mut photoflow_protocol::SessionState,
        max_items: usize,
    ) -> Result<usize, AdapterError> {
        let op = catalog::find("get_items_by_uploaded_date").expect("registered");
        let media_repo = photoflow_db::MediaIndexRepo::new(&self.pool);
        let mut page_id: Value = Value::Null;
        let mut collected = 0usize;

        loop {
            let request = (op.build_request)(&json!({"pageId": page_id}));
            let result = client
                .execute_rpc(session.clone(), op.rpcid, &request, op.source_path_hint)
                .await?;
            *session = result.session;
            let page = catalog::parse_response_for(op.rpcid, &result.data);

            let Some(items) = page.get("items").and_then(Value::as_array) else {
                break;
            };
            for item in items {
                let Some(media_key) = item.get("mediaKey").and_then(Value::as_str) else {
                    continue;
                };
                let row = MediaIndexRow {
                    account_id: account_id.clone(),
                    media_key: media_key.to_string(),
                    dedup_key: item.get("dedupKey").and_then(Value::as_str).map(str::to_string),
                    thumb: item.get("thumb").and_then(Value::as_str).map(str::to_string),
                    res_width: item.get("resWidth").and_then(Value::as_i64),
                    res_height: item.get("resHeight").and_then(Value::as_i64),
                    timestamp: item.get("timestamp").and_then(Value::as_i64),
                    timezone_offset: item.get("timezoneOffset").and_then(Value::as_i64),
                    creation_timestamp: item.get("creationTimestamp").and_then(Value::as_i64),
                    is_archived: item.get("isArchived").and_then(Value::as_bool).unwrap_or(false),
                    is_favorite: item.get("isFavorite").and_then(Value::as_bool).unwrap_or(false),
                    duration: item.get("duration").and_then(Value::as_i64),
                    description: item
                        .get("descriptionShort")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    album_ids: Vec::new(),
                    updated_at: Utc::now(),
                };
                media_repo.upsert(&row).await?;
                collected += 1;
                if collected >= max_items {
                    return Ok(collected);
                }
            }

            page_id = page.get("nextPageId").cloned().unwrap_or(Value::Null);
            if page_id.is_null() {
                break;
            }
        }
        Ok(collected)
    }

    async fn sync_albums(
        &self,
        client: &RpcClient,
        account_id: &photoflow_protocol::AccountId,
        session: &mut photoflow_protocol::SessionState,
    ) -> Result<usize, AdapterError> {
        let media_repo = photoflow_db::MediaIndexRepo::new(&self.pool);
        let album_repo = photoflow_db::AlbumIndexRepo::new(&self.pool);

        // Clears membership before repopulating; see MediaIndexRepo::clear_album_memberships.
        media_repo.clear_album_memberships(account_id).await?;

        let list_op = catalog::find("get_albums").expect("registered");
        let items_op = catalog::find("get_album_page").expect("registered");

        let mut page_id: Value = Value::Null;
        let mut synced = 0usize;
        loop {
            let request = (list_op.build_request)(&json!({"pageId": page_id}));
            let result = client
                .execute_rpc(session.clone(), list_op.rpcid, &request, list_op.source_path_hint)
                .await?;
            *session = result.session;
            let page = catalog::parse_response_for(list_op.rpcid, &result.data);

            let Some(albums) = page.get("items").and_then(Value::as_array) else {
                break;
            };
            for album in albums {
                let Some(album_key) = album.get("mediaKey").and_then(Value::as_str) else {
                    continue;
                };
                album_repo
                    .upsert(&AlbumIndexRow {
                        account_id: account_id.clone(),
                        media_key: album_key.to_string(),
                        owner_actor_id: album
                            .get("ownerActorId")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        title: album.get("title").and_then(Value::as_str).map(str::to_string),
                        item_count: album.get("itemCount").and_then(Value::as_i64),
                        is_shared: album.get("isShared").and_then(Value::as_bool).unwrap_or(false),
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    })
                    .await?;

                let mut item_page_id: Value = Value::Null;
                loop {
                    let request = (items_op.build_request)(&json!({
                        "albumMediaKey": album_key,
                        "pageId": item_page_id,
                    }));
                    let result = client
                        .execute_rpc(
                            session.clone(),
                            items_op.rpcid,
                            &request,
                            items_op.source_path_hint,
                        )
                        .await?;
                    *session = result.session;
                    let item_page = catalog::parse_response_for(items_op.rpcid, &result.data);
                    let Some(members) = item_page.get("items").and_then(Value::as_array) else {
                        break;
                    };
                    for member in members {
                        if let Some(media_key) = member.get("mediaKey").and_then(Value::as_str) {
                            media_repo
                                .append_album_membership(account_id, media_key, album_key)
                                .await?;
                            synced += 1;
                        }
                    }
                    item_page_id = item_page.get("nextPageId").cloned().unwrap_or(Value::Null);
                    if item_page_id.is_null() {
                        break;
                    }
                }
            }

            page_id = page.get("nextPageId").cloned().unwrap_or(Value::Null);
            if page_id.is_null() {
                break;
            }
        }
        Ok(synced)
    }

    async fn enrich_batch_info(
        &self,
        client: &RpcClient,
        account_id: &photoflow_protocol::AccountId,
        session: &mut photoflow_protocol::SessionState,
    ) -> Result<usize, AdapterError> {
        let media_repo = photoflow_db::MediaIndexRepo::new(&self.pool);
        let page = media_repo.query_page(account_id, None, 500).await?;
        let keys: Vec<String> = page.items.into_iter().map(|r| r.media_key).collect();

        let op = catalog::find("get_batch_media_info").expect("registered");
        let mut enriched = 0usize;
        for chunk in keys.chunks(MEDIA_INFO_CHUNK) {
            let request = (op.build_request)(&json!({"mediaKeyArray": chunk}));
            let result = client
                .execute_rpc(session.clone(), op.rpcid, &request, op.source_path_hint)
                .await?;
            *session = result.session;
            let decoded = catalog::parse_response_for(op.rpcid, &result.data);
            if let Some(items) = decoded.as_array() {
                enriched += items.len();
            }
        }
        Ok(enriched)
    }
}

#[async_trait]
impl Adapter for IndexerAdapter {
    async fn run(
        &self,
        _operation: &str,
        params: &Value,
        credentials: &Credentials,
        dry_run: bool,
        progress: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError> {
        let account_id_str = params
            .get("account_id")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::MissingParam("account_id".to_string()))?;
        let account_id = photoflow_protocol::AccountId::from_string(account_id_str);
        let max_items = params
            .get("max_items")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_ITEMS);

        progress.report(0.0, "start").await?;

        if dry_run {
            progress.report(1.0, "complete (dry run)").await?;
            return Ok(AdapterOutcome::from_result(json!({
                "dry_run": true,
                "max_items": max_items,
            })));
        }

        let cookie_jar = credentials
            .cookie_jar
            .clone()
            .ok_or_else(|| AdapterError::MissingCredential("cookie_jar".to_string()))?;
        let client = RpcClient::new(cookie_jar, self.rpc_config.clone())?;
        let mut session = match &credentials.session_state {
            Some(session) => session.clone(),
            None => client.bootstrap_session("/").await?,
        };

        progress.report(0.1, "paginating library").await?;
        let items_synced = self
            .paginate_library(&client, &account_id, &mut session, max_items)
            .await?;

        progress.report(0.5, "syncing albums").await?;
        let albums_synced = self.sync_albums(&client, &account_id, &mut session).await?;

        progress.report(0.8, "enriching with batch media info").await?;
        let enriched = self.enrich_batch_info(&client, &account_id, &mut session).await?;

        progress.report(1.0, "complete").await?;
        Ok(AdapterOutcome {
            result: json!({
                "items_synced": items_synced,
                "album_memberships_synced": albums_synced,
                "items_enriched": enriched,
            }),
            session: Some(session),
        })
    }
}
