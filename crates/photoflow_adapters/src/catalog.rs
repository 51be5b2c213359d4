//! The static native-RPC operation catalog: short name → rpcid, request
//! builder, source-path hint, and destructive flag. This is the registry
//! `native-rpc.*` operations are resolved against; `advanced.rpc_execute`
//! bypasses it entirely.

use serde_json::{json, Value};

/// One entry in the native-RPC operation catalog.
pub struct OperationDef {
    /// Short name, without the `native-rpc.` prefix.
    pub name: &'static str,
    pub rpcid: &'static str,
    pub description: &'static str,
    pub destructive: bool,
    pub source_path_hint: &'static str,
    pub build_request: fn(&Value) -> Value,
}

fn arr(params: &Value, key: &str) -> Vec<Value> {
    params
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn str_arr(params: &Value, key: &str) -> Vec<String> {
    arr(params, key)
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn opt(params: &Value, key: &str) -> Value {
    params.get(key).cloned().unwrap_or(Value::Null)
}

fn get_bool(params: &Value, key: &str, default: bool) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn get_i64(params: &Value, key: &str, default: i64) -> i64 {
    params.get(key).and_then(Value::as_i64).unwrap_or(default)
}

pub const OPERATIONS: &[OperationDef] = &[
    OperationDef {
        name: "get_items_by_taken_date",
        rpcid: "lcxiM",
        description: "List media by taken date timeline.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            let source = match p.get("source").and_then(Value::as_str) {
                Some("library") => 1,
                Some("archive") => 2,
                _ => 3,
            };
            json!([
                opt(p, "pageId"),
                opt(p, "timestamp"),
                get_i64(p, "pageSize", 500),
                Value::Null,
                1,
                source
            ])
        },
    },
    OperationDef {
        name: "get_items_by_uploaded_date",
        rpcid: "EzkLib",
        description: "List media by upload date.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!(["", [[4, "ra", 0, 0]], opt(p, "pageId")]),
    },
    OperationDef {
        name: "search",
        rpcid: "EzkLib",
        description: "Search media library.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            json!([
                p.get("searchQuery").and_then(Value::as_str).unwrap_or(""),
                Value::Null,
                opt(p, "pageId")
            ])
        },
    },
    OperationDef {
        name: "get_remote_matches_by_hash",
        rpcid: "swbisb",
        description: "Find remote items by hash list.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!([str_arr(p, "hashArray"), Value::Null, 3, 0]),
    },
    OperationDef {
        name: "get_favorite_items",
        rpcid: "EzkLib",
        description: "List favorite items.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!(["Favorites", [[5, "8", 0, 9]], opt(p, "pageId")]),
    },
    OperationDef {
        name: "get_trash_items",
        rpcid: "zy0IHe",
        description: "List trash items.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!([opt(p, "pageId")]),
    },
    OperationDef {
        name: "get_locked_folder_items",
        rpcid: "nMFwOc",
        description: "List locked folder items.",
        destructive: false,
        source_path_hint: "/u/0/photos/lockedfolder",
        build_request: |p| json!([opt(p, "pageId")]),
    },
    OperationDef {
        name: "move_items_to_trash",
        rpcid: "XwAOJf",
        description: "Move items to trash by dedup keys.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| json!([Value::Null, 1, str_arr(p, "dedupKeyArray"), 3]),
    },
    OperationDef {
        name: "restore_from_trash",
        rpcid: "XwAOJf",
        description: "Restore trashed items by dedup keys.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!([Value::Null, 3, str_arr(p, "dedupKeyArray"), 2]),
    },
    OperationDef {
        name: "get_shared_links",
        rpcid: "F2A0H",
        description: "List shared links.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!([opt(p, "pageId"), Value::Null, 2, Value::Null, 3]),
    },
    OperationDef {
        name: "get_albums",
        rpcid: "Z5xsfc",
        description: "List albums.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            json!([
                opt(p, "pageId"),
                Value::Null,
                Value::Null,
                Value::Null,
                1,
                Value::Null,
                Value::Null,
                get_i64(p, "pageSize", 100),
                [2],
                5
            ])
        },
    },
    OperationDef {
        name: "get_album_page",
        rpcid: "snAcKc",
        description: "List album or shared-link page.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            json!([
                opt(p, "albumMediaKey"),
                opt(p, "pageId"),
                Value::Null,
                opt(p, "authKey")
            ])
        },
    },
    OperationDef {
        name: "remove_items_from_album",
        rpcid: "ycV3Nd",
        description: "Remove items from album by item-album keys.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| json!([arr(p, "itemAlbumMediaKeyArray")]),
    },
    OperationDef {
        name: "create_album",
        rpcid: "OXvT9d",
        description: "Create a new album.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            json!([
                p.get("albumName").and_then(Value::as_str).unwrap_or("New Album"),
                Value::Null,
                2
            ])
        },
    },
    OperationDef {
        name: "add_items_to_album",
        rpcid: "E1Cajb",
        description: "Add items to an album or create one by name.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            let media_keys = str_arr(p, "mediaKeyArray");
            match p.get("albumName").and_then(Value::as_str) {
                Some(name) => json!([media_keys, Value::Null, name]),
                None => json!([media_keys, opt(p, "albumMediaKey")]),
            }
        },
    },
    OperationDef {
        name: "add_items_to_shared_album",
        rpcid: "laUYf",
        description: "Add items to shared album.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            let media_keys = str_arr(p, "mediaKeyArray");
            match p.get("albumName").and_then(Value::as_str) {
                Some(name) => json!([media_keys, Value::Null, name]),
                None => {
                    let wrapped: Vec<Value> =
                        media_keys.iter().map(|id| json!([[id]])).collect();
                    json!([
                        opt(p, "albumMediaKey"),
                        [2, Value::Null, wrapped, Value::Null, Value::Null, Value::Null, [1]]
                    ])
                }
            }
        },
    },
    OperationDef {
        name: "set_album_item_order",
        rpcid: "QD9nKf",
        description: "Reorder items in album.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| {
            let items = str_arr(p, "albumItemKeys");
            let wrapped: Vec<Value> = items.iter().map(|id| json!([[id]])).collect();
            match p.get("insertAfter") {
                Some(after) if !after.is_null() => json!([
                    opt(p, "albumMediaKey"),
                    Value::Null,
                    3,
                    Value::Null,
                    wrapped,
                    [[after]]
                ]),
                _ => json!([opt(p, "albumMediaKey"), Value::Null, 1, Value::Null, wrapped]),
            }
        },
    },
    OperationDef {
        name: "set_favorite",
        rpcid: "Ftfh0",
        description: "Set favorite/unfavorite by dedup keys.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| {
            let pairs: Vec<Value> = str_arr(p, "dedupKeyArray")
                .into_iter()
                .map(|key| json!([Value::Null, key]))
                .collect();
            let action = if get_bool(p, "action", true) { 1 } else { 2 };
            json!([pairs, [action]])
        },
    },
    OperationDef {
        name: "set_archive",
        rpcid: "w7TP3c",
        description: "Set archive/unarchive by dedup keys.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| {
            let action = if get_bool(p, "action", true) { 1 } else { 2 };
            let rows: Vec<Value> = str_arr(p, "dedupKeyArray")
                .into_iter()
                .map(|key| json!([Value::Null, [action], [Value::Null, key]]))
                .collect();
            json!([rows, Value::Null, 1])
        },
    },
    OperationDef {
        name: "move_to_locked_folder",
        rpcid: "StLnCe",
        description: "Move items to locked folder.",
        destructive: true,
        source_path_hint: "/u/0/photos/lockedfolder",
        build_request: |p| json!([str_arr(p, "dedupKeyArray"), Vec::<Value>::new()]),
    },
    OperationDef {
        name: "remove_from_locked_folder",
        rpcid: "Pp2Xxe",
        description: "Move items out of locked folder.",
        destructive: true,
        source_path_hint: "/u/0/photos/lockedfolder",
        build_request: |p| json!([str_arr(p, "dedupKeyArray")]),
    },
    OperationDef {
        name: "get_storage_quota",
        rpcid: "EzwWhf",
        description: "Get account storage quota.",
        destructive: false,
        source_path_hint: "/",
        build_request: |_p| json!([]),
    },
    OperationDef {
        name: "get_download_url",
        rpcid: "pLFTfd",
        description: "Get download URLs for media keys.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!([str_arr(p, "mediaKeyArray"), Value::Null, opt(p, "authKey")]),
    },
    OperationDef {
        name: "get_download_token",
        rpcid: "yCLA7",
        description: "Request download token for bulk zip.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            let wrapped: Vec<Value> = str_arr(p, "mediaKeyArray")
                .into_iter()
                .map(|id| json!([id]))
                .collect();
            json!([wrapped])
        },
    },
    OperationDef {
        name: "check_download_token",
        rpcid: "dnv2s",
        description: "Poll download token status.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!([[opt(p, "dlToken")]]),
    },
    OperationDef {
        name: "remove_items_from_shared_album",
        rpcid: "LjmOue",
        description: "Remove items from shared album.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| {
            json!([
                [opt(p, "albumMediaKey")],
                [str_arr(p, "mediaKeyArray")],
                [[
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    [Value::Null, [], []],
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    Value::Null,
                    []
                ]]
            ])
        },
    },
    OperationDef {
        name: "save_shared_media_to_library",
        rpcid: "V8RKJ",
        description: "Save shared-album media to own library.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!([str_arr(p, "mediaKeyArray"), Value::Null, opt(p, "albumMediaKey")]),
    },
    OperationDef {
        name: "save_partner_shared_media_to_library",
        rpcid: "Es7fke",
        description: "Save partner-shared media to own library.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            let wrapped: Vec<Value> = str_arr(p, "mediaKeyArray")
                .into_iter()
                .map(|id| json!([id]))
                .collect();
            json!([wrapped])
        },
    },
    OperationDef {
        name: "get_partner_shared_media",
        rpcid: "e9T5je",
        description: "Get partner shared media page.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            json!([
                opt(p, "pageId"),
                Value::Null,
                [
                    Value::Null,
                    [[[2, 1]]],
                    [opt(p, "partnerActorId")],
                    [Value::Null, opt(p, "gaiaId")],
                    1
                ]
            ])
        },
    },
    OperationDef {
        name: "set_item_geo_data",
        rpcid: "EtUHOe",
        description: "Set geolocation on items.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| {
            let pairs: Vec<Value> = str_arr(p, "dedupKeyArray")
                .into_iter()
                .map(|key| json!([Value::Null, key]))
                .collect();
            json!([
                pairs,
                [
                    2,
                    p.get("center").cloned().unwrap_or(json!([0, 0])),
                    [
                        p.get("visible1").cloned().unwrap_or(json!([0, 0])),
                        p.get("visible2").cloned().unwrap_or(json!([0, 0]))
                    ],
                    [Value::Null, Value::Null, get_i64(p, "scale", 10)],
                    p.get("gMapsPlaceId").and_then(Value::as_str).unwrap_or("")
                ]
            ])
        },
    },
    OperationDef {
        name: "delete_item_geo_data",
        rpcid: "EtUHOe",
        description: "Delete geolocation from items.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| {
            let pairs: Vec<Value> = str_arr(p, "dedupKeyArray")
                .into_iter()
                .map(|key| json!([Value::Null, key]))
                .collect();
            json!([pairs, [1]])
        },
    },
    OperationDef {
        name: "set_items_timestamp",
        rpcid: "DaSgWe",
        description: "Bulk set timestamp for items.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| {
            let rows: Vec<Value> = arr(p, "items")
                .into_iter()
                .map(|item| {
                    json!([
                        item.get("dedupKey").cloned().unwrap_or(Value::Null),
                        item.get("timestampSec").cloned().unwrap_or(Value::Null),
                        item.get("timezoneSec").cloned().unwrap_or(Value::Null),
                    ])
                })
                .collect();
            json!([rows])
        },
    },
    OperationDef {
        name: "set_item_description",
        rpcid: "AQNOFd",
        description: "Set item description.",
        destructive: true,
        source_path_hint: "/",
        build_request: |p| {
            json!([
                Value::Null,
                p.get("description").and_then(Value::as_str).unwrap_or(""),
                opt(p, "dedupKey")
            ])
        },
    },
    OperationDef {
        name: "get_item_info",
        rpcid: "VrseUb",
        description: "Get item basic info.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            json!([
                opt(p, "mediaKey"),
                Value::Null,
                opt(p, "authKey"),
                Value::Null,
                opt(p, "albumMediaKey")
            ])
        },
    },
    OperationDef {
        name: "get_item_info_ext",
        rpcid: "fDcn4b",
        description: "Get item extended info.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| json!([opt(p, "mediaKey"), 1, opt(p, "authKey"), Value::Null, 1]),
    },
    OperationDef {
        name: "get_batch_media_info",
        rpcid: "EWgK9e",
        description: "Get batch media info for media keys.",
        destructive: false,
        source_path_hint: "/",
        build_request: |p| {
            let wrapped: Vec<Value> = str_arr(p, "mediaKeyArray")
                .into_iter()
                .map(|id| json!([id]))
                .collect();
            let mut tail: Vec<Value> = vec![Value::Null; 24];
            tail.push(json!([]));
            tail.extend(vec![Value::Null; 10]);
            tail.push(json!([]));
            json!([[[wrapped], [tail]]])
        },
    },
];

/// Reshape a raw reply payload for `rpcid` through the parser registry.
pub fn parse_response_for(rpcid: &str, payload: &Value) -> Value {
    photoflow_rpc::parse_response(rpcid, payload)
}

/// Look up a catalog entry by its short name (without the `native-rpc.`
/// prefix).
pub fn find(name: &str) -> Option<&'static OperationDef> {
    let short = name.strip_prefix("native-rpc.").unwrap_or(name);
    OPERATIONS.iter().find(|op| op.name == short)
}

/// One row of `GET /operations/catalog`, merging static providers with the
/// native-RPC registry.
pub fn catalog_entries() -> Vec<Value> {
    let mut entries: Vec<Value> = vec![
        json!({
            "provider": "bulk-upload",
            "operation": "bulk-upload.upload",
            "description": "Upload media from file/folder target.",
            "destructive": false,
        }),
        json!({
            "provider": "bulk-upload",
            "operation": "bulk-upload.move_to_trash",
            "description": "Move remote media to trash by SHA1 hashes.",
            "destructive": true,
        }),
        json!({
            "provider": "bulk-upload",
            "operation": "bulk-upload.add_to_album",
            "description": "Add media keys into an album.",
            "destructive": false,
        }),
        json!({
            "provider": "bulk-upload",
            "operation": "bulk-upload.get_media_key_by_hash",
            "description": "Lookup a media key by SHA1 hash.",
            "destructive": false,
        }),
        json!({
            "provider": "bulk-upload",
            "operation": "bulk-upload.update_cache",
            "description": "Sync/update local bulk-upload cache database.",
            "destructive": false,
        }),
        json!({
            "provider": "file-disguise",
            "operation": "file-disguise.hide",
            "description": "Hide files into image/video containers.",
            "destructive": false,
        }),
        json!({
            "provider": "file-disguise",
            "operation": "file-disguise.extract",
            "description": "Extract hidden payloads from media containers.",
            "destructive": false,
        }),
        json!({
            "provider": "advanced",
            "operation": "advanced.rpc_execute",
            "description": "Advanced: execute arbitrary native RPC manually.",
            "destructive": false,
        }),
    ];

    for op in OPERATIONS {
        entries.push(json!({
            "provider": "native-rpc",
            "operation": format!("native-rpc.{}", op.name),
            "description": op.description,
            "destructive": op.destructive,
            "rpcid": op.rpcid,
            "sourcePathHint": op.source_path_hint,
        }));
    }

    entries.sort_by(|a, b| {
        let key = |v: &Value| {
            (
                v["provider"].as_str().unwrap_or("").to_string(),
                v["operation"].as_str().unwrap_or("").to_string(),
            )
        };
        key(a).cmp(&key(b))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_strips_provider_prefix() {
        let op = find("native-rpc.get_storage_quota").unwrap();
        assert_eq!(op.rpcid, "EzwWhf");
    }

    #[test]
    fn move_items_to_trash_is_destructive() {
        let op = find("move_items_to_trash").unwrap();
        assert!(op.destructive);
    }

    #[test]
    fn catalog_entries_are_sorted_by_provider_then_operation() {
        let entries = catalog_entries();
        let mut sorted = entries.clone();
        sorted.sort_by(|a, b| {
            let key = |v: &Value| {
                (
                    v["provider"].as_str().unwrap_or("").to_string(),
                    v["operation"].as_str().unwrap_or("").to_string(),
                )
            };
            key(a).cmp(&key(b))
        });
        assert_eq!(entries, sorted);
    }
}
