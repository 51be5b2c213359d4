//! The destructive-operation safety gate: a single predicate consulted at
//! job creation, at preview commit, and again at execution start.

use crate::catalog;

const FALLBACK_HINTS: &[&str] = &[
    "move_to_trash",
    "move_items_to_trash",
    "set_items_timestamp",
    "set_timestamp",
    "set_archive",
    "set_favorite",
    "remove_items",
    "delete_item_geo_data",
    "move_to_locked_folder",
    "remove_from_locked_folder",
];

/// Whether `operation` (namespaced `provider.name`, or a bare short name) is
/// destructive. Consults the catalog's `destructive` flag first, then falls
/// back to a substring heuristic over the short name for operations the
/// catalog doesn't cover directly (e.g. `bulk-upload.move_to_trash`).
pub fn is_destructive(operation: &str) -> bool {
    let normalized = operation.trim();

    if let Some(op) = catalog::find(normalized) {
        if op.destructive {
            return true;
        }
    }

    let short = normalized.split_once('.').map(|(_, rest)| rest).unwrap_or(normalized);
    let short_lower = short.to_lowercase();
    FALLBACK_HINTS.iter().any(|hint| short_lower.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_destructive_operation_is_flagged() {
        assert!(is_destructive("native-rpc.move_items_to_trash"));
    }

    #[test]
    fn non_destructive_catalog_operation_is_clear() {
        assert!(!is_destructive("native-rpc.get_storage_quota"));
    }

    #[test]
    fn fallback_heuristic_catches_non_catalog_operations() {
        assert!(is_destructive("bulk-upload.move_to_trash"));
        assert!(is_destructive("bulk-upload.set_items_timestamp"));
    }

    #[test]
    fn unrelated_operation_is_not_destructive() {
        assert!(!is_destructive("bulk-upload.upload"));
    }
}
