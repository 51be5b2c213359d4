//! Per-rpcid decoders that reshape a raw [`Node`] reply into a documented
//! object shape. Unknown rpcids pass the raw payload through unchanged, and
//! any decoder that cannot make sense of its input falls back to the raw
//! payload rather than erroring — the wire format is undocumented upstream
//! and drifts, so this stays an optimistic decoder, not a validating one.

use serde_json::{json, Value};

use crate::node::Node;

fn actor(data: &Node) -> Value {
    json!({
        "actorId": Value::from(data.at(0)),
        "gaiaId": Value::from(data.at(1)),
        "name": Value::from(data.at(11).at(0)),
        "gender": Value::from(data.at(11).at(2)),
        "profilePhotoUrl": Value::from(data.at(12).at(0)),
    })
}

fn library_item(item: &Node) -> Value {
    let tail = item.last();
    let nested_geo = tail.dict(129168200).at(1).at(4).at(0).at(1).at(0);
    json!({
        "mediaKey": Value::from(item.at(0)),
        "timestamp": Value::from(item.at(2)),
        "timezoneOffset": Value::from(item.at(4)),
        "creationTimestamp": Value::from(item.at(5)),
        "dedupKey": Value::from(item.at(3)),
        "thumb": Value::from(item.at(1).at(0)),
        "resWidth": Value::from(item.at(1).at(1)),
        "resHeight": Value::from(item.at(1).at(2)),
        "isPartialUpload": item.at(12).at(0).as_i64() == Some(20),
        "isArchived": item.at(13).as_bool().unwrap_or(false),
        "isFavorite": Value::from(tail.dict(163238866).at(0)),
        "duration": Value::from(tail.dict(76647426).at(0)),
        "descriptionShort": Value::from(tail.dict(396644657).at(0)),
        "isLivePhoto": tail.dict(146008172).is_present(),
        "livePhotoDuration": Value::from(tail.dict(146008172).at(1)),
        "geoLocation": {
            let coordinates = Value::from(tail.dict(129168200).at(1).at(0));
            json!({ "coordinates": coordinates, "name": Value::from(nested_geo.at(0)) })
        },
    })
}

fn locked_folder_item(item: &Node) -> Value {
    let tail = item.last();
    json!({
        "mediaKey": Value::from(item.at(0)),
        "timestamp": Value::from(item.at(2)),
        "creationTimestamp": Value::from(item.at(5)),
        "dedupKey": Value::from(item.at(3)),
        "duration": Value::from(tail.dict(76647426).at(0)),
    })
}

fn album(item: &Node) -> Value {
    let tail = item.last();
    let meta = tail.dict(72930366);
    json!({
        "mediaKey": Value::from(item.at(0)),
        "ownerActorId": Value::from(item.at(6).at(0)),
        "title": Value::from(meta.at(1)),
        "thumb": Value::from(item.at(1).at(0)),
        "itemCount": Value::from(meta.at(3)),
        "creationTimestamp": Value::from(meta.at(2).at(4)),
        "modifiedTimestamp": Value::from(meta.at(2).at(9)),
        "timestampRange": [Value::from(meta.at(2).at(5)), Value::from(meta.at(2).at(6))],
        "isShared": meta.at(4).as_bool().unwrap_or(false),
    })
}

fn album_item(item: &Node) -> Value {
    let tail = item.last();
    json!({
        "mediaKey": Value::from(item.at(0)),
        "thumb": Value::from(item.at(1).at(0)),
        "resWidth": Value::from(item.at(1).at(1)),
        "resHeight": Value::from(item.at(1).at(2)),
        "timestamp": Value::from(item.at(2)),
        "timezoneOffset": Value::from(item.at(4)),
        "creationTimestamp": Value::from(item.at(5)),
        "dedupKey": Value::from(item.at(3)),
        "isLivePhoto": tail.dict(146008172).is_present(),
        "livePhotoDuration": Value::from(tail.dict(146008172).at(1)),
        "duration": Value::from(tail.dict(76647426).at(0)),
    })
}

fn trash_item(item: &Node) -> Value {
    let tail = item.last();
    json!({
        "mediaKey": Value::from(item.at(0)),
        "thumb": Value::from(item.at(1).at(0)),
        "resWidth": Value::from(item.at(1).at(1)),
        "resHeight": Value::from(item.at(1).at(2)),
        "timestamp": Value::from(item.at(2)),
        "timezoneOffset": Value::from(item.at(4)),
        "creationTimestamp": Value::from(item.at(5)),
        "dedupKey": Value::from(item.at(3)),
        "duration": Value::from(tail.dict(76647426).at(0)),
    })
}

fn bulk_media_info_item(item: &Node) -> Value {
    let info = item.at(1);
    let tail = info.last();
    let takes_up_space = tail.at(0).as_i64();
    let orig_quality = tail.at(2).as_i64();
    json!({
        "mediaKey": Value::from(item.at(0)),
        "descriptionFull": Value::from(info.at(2)),
        "fileName": Value::from(info.at(3)),
        "timestamp": Value::from(info.at(6)),
        "timezoneOffset": Value::from(info.at(7)),
        "creationTimestamp": Value::from(info.at(8)),
        "size": Value::from(info.at(9)),
        "takesUpSpace": takes_up_space.map(|v| v == 1),
        "spaceTaken": Value::from(tail.at(1)),
        "isOriginalQuality": orig_quality.map(|v| v == 2),
    })
}

fn library_timeline_page(data: &Node) -> Value {
    json!({
        "items": data.at(0).map(library_item),
        "nextPageId": Value::from(data.at(1)),
        "lastItemTimestamp": data.at(2).as_i64().unwrap_or(0),
    })
}

fn library_generic_page(data: &Node) -> Value {
    json!({
        "items": data.at(0).map(library_item),
        "nextPageId": Value::from(data.at(1)),
    })
}

fn locked_folder_page(data: &Node) -> Value {
    json!({
        "nextPageId": Value::from(data.at(0)),
        "items": data.at(1).map(locked_folder_item),
    })
}

fn links_page(data: &Node) -> Value {
    json!({
        "items": data.at(0).map(|item: &Node| json!({
            "mediaKey": Value::from(item.at(6)),
            "linkId": Value::from(item.at(17)),
            "itemCount": Value::from(item.at(3)),
        })),
        "nextPageId": Value::from(data.at(1)),
    })
}

fn albums_page(data: &Node) -> Value {
    json!({
        "items": data.at(0).map(album),
        "nextPageId": Value::from(data.at(1)),
    })
}

fn album_items_page(data: &Node) -> Value {
    let meta = data.at(3);
    json!({
        "items": data.at(1).map(album_item),
        "nextPageId": Value::from(data.at(2)),
        "mediaKey": Value::from(meta.at(0)),
        "title": Value::from(meta.at(1)),
        "owner": actor(meta.at(5)),
        "itemCount": Value::from(meta.at(21)),
        "authKey": Value::from(meta.at(19)),
        "members": meta.at(9).map(actor),
    })
}

fn partner_shared_items_page(data: &Node) -> Value {
    json!({
        "nextPageId": Value::from(data.at(0)),
        "items": data.at(1).map(album_item),
        "members": data.at(2).map(actor),
        "partnerActorId": Value::from(data.at(4)),
        "gaiaId": Value::from(data.at(5)),
    })
}

fn trash_page(data: &Node) -> Value {
    json!({
        "items": data.at(0).map(trash_item),
        "nextPageId": Value::from(data.at(1)),
    })
}

fn item_info(data: &Node) -> Value {
    let media = data.at(0);
    let meta = media.at(15);
    json!({
        "mediaKey": Value::from(media.at(0)),
        "dedupKey": Value::from(media.at(3)),
        "timestamp": Value::from(media.at(2)),
        "timezoneOffset": Value::from(media.at(4)),
        "creationTimestamp": Value::from(media.at(5)),
        "downloadUrl": Value::from(data.at(1)),
        "downloadOriginalUrl": Value::from(data.at(7)),
        "isArchived": Value::from(media.at(13)),
        "isFavorite": Value::from(meta.dict(163238866).at(0)),
        "duration": Value::from(meta.dict(76647426).at(0)),
        "descriptionFull": Value::from(data.at(10)),
        "thumb": Value::from(data.at(12)),
    })
}

fn item_info_ext(data: &Node) -> Value {
    let item0 = data.at(0);
    let owner_node = item0.at(27).at(4).at(0);
    let owner = if owner_node.is_present() {
        actor(owner_node)
    } else {
        actor(item0.at(28))
    };
    json!({
        "mediaKey": Value::from(item0.at(0)),
        "dedupKey": Value::from(item0.at(11)),
        "descriptionFull": Value::from(item0.at(1)),
        "fileName": Value::from(item0.at(2)),
        "timestamp": Value::from(item0.at(3)),
        "timezoneOffset": Value::from(item0.at(4)),
        "size": Value::from(item0.at(5)),
        "resWidth": Value::from(item0.at(6)),
        "resHeight": Value::from(item0.at(7)),
        "albums": item0.at(19).map(album),
        "owner": owner,
        "other": Value::from(item0.at(31)),
    })
}

fn bulk_media_info(data: &Node) -> Value {
    Value::Array(data.map(bulk_media_info_item))
}

fn download_token_check(data: &Node) -> Value {
    let node = data.at(0).at(0).at(0).at(2).at(0);
    json!({
        "fileName": Value::from(node.at(0)),
        "downloadUrl": Value::from(node.at(1)),
        "downloadSize": Value::from(node.at(2)),
        "unzippedSize": Value::from(node.at(3)),
    })
}

fn storage_quota(data: &Node) -> Value {
    let q = data.at(6);
    json!({
        "totalUsed": Value::from(q.at(0)),
        "totalAvailable": Value::from(q.at(1)),
        "usedByGPhotos": Value::from(q.at(3)),
    })
}

fn remote_matches(data: &Node) -> Value {
    let rows = data.at(0);
    Value::Array(rows.map(|row: &Node| {
        let item = row.at(1);
        json!({
            "hash": Value::from(row.at(0)),
            "mediaKey": Value::from(item.at(0)),
            "thumb": Value::from(item.at(1).at(0)),
            "resWidth": Value::from(item.at(1).at(1)),
            "resHeight": Value::from(item.at(1).at(2)),
            "timestamp": Value::from(item.at(2)),
            "dedupKey": Value::from(item.at(3)),
            "timezoneOffset": Value::from(item.at(4)),
            "creationTimestamp": Value::from(item.at(5)),
        })
    }))
}

/// Decode a raw reply payload for `rpcid`. Unknown rpcids, and any decoder
/// that doesn't apply to the actual shape received, return the raw payload
/// as-is.
pub fn parse_response(rpcid: &str, payload: &Value) -> Value {
    if payload.is_null() {
        return Value::Null;
    }
    let node = Node::parse(payload);
    let decoded = match rpcid {
        "lcxiM" => Some(library_timeline_page(&node)),
        "EzkLib" => Some(library_generic_page(&node)),
        "nMFwOc" => Some(locked_folder_page(&node)),
        "F2A0H" => Some(links_page(&node)),
        "Z5xsfc" => Some(albums_page(&node)),
        "snAcKc" => Some(album_items_page(&node)),
        "e9T5je" => Some(partner_shared_items_page(&node)),
        "zy0IHe" => Some(trash_page(&node)),
        "VrseUb" => Some(item_info(&node)),
        "fDcn4b" => Some(item_info_ext(&node)),
        "EWgK9e" => Some(bulk_media_info(&node)),
        "dnv2s" => Some(download_token_check(&node)),
        "EzwWhf" => Some(storage_quota(&node)),
        "swbisb" => Some(remote_matches(&node)),
        _ => None,
    };
    decoded.unwrap_or_else(|| payload.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_rpcid_passes_payload_through() {
        let payload = json!([1, 2, 3]);
        assert_eq!(parse_response("unknownId", &payload), payload);
    }

    #[test]
    fn storage_quota_matches_documented_shape() {
        let payload = json!([null, null, null, null, null, null, [10, 100, null, 3]]);
        let result = parse_response("EzwWhf", &payload);
        assert_eq!(
            result,
            json!({"totalUsed": 10.0, "totalAvailable": 100.0, "usedByGPhotos": 3.0})
        );
    }
}
