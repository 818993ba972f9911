// src/crawler/properties.rs
//! Property enrichment: the full value behind every property of a page.

use super::CrawlContext;
use crate::api::cache::EntityCache;
use crate::api::pagination;
use crate::constants::{INTERNAL_LINK_MARKER, INTERNAL_LINK_MARKER_ENCODED, OP_RETRIEVE_PAGE_PROPERTY};
use crate::error::NodeFailure;
use crate::types::{EntityKind, ResourceId};
use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Whether a property id points at an internal page link the API cannot resolve.
pub fn is_internal_link(property_id: &str) -> bool {
    let lowered = property_id.to_ascii_lowercase();
    lowered.contains(INTERNAL_LINK_MARKER) || lowered.contains(INTERNAL_LINK_MARKER_ENCODED)
}

/// Fetches every property that carries an id, all at once.
///
/// Never fails: each property resolves to its detail, an `unsupported`
/// stub or an `error` stub.
pub(super) async fn enrich(
    ctx: Arc<CrawlContext>,
    document_id: ResourceId,
    properties: Map<String, Value>,
) -> IndexMap<String, Value> {
    let lookups = properties.iter().filter_map(|(name, property)| {
        let property_id = property.get("id").and_then(Value::as_str)?.to_string();
        let ctx = Arc::clone(&ctx);
        let document_id = document_id.clone();
        let name = name.clone();
        Some(async move {
            let detail = property_detail(&ctx, &document_id, &property_id).await;
            (name, detail)
        })
    });

    let details: IndexMap<String, Value> = join_all(lookups).await.into_iter().collect();
    log::debug!(
        "Resolved {} property detail(s) for {}",
        details.len(),
        document_id
    );
    details
}

async fn property_detail(ctx: &CrawlContext, document_id: &ResourceId, property_id: &str) -> Value {
    if is_internal_link(property_id) {
        log::debug!(
            "Skipping property {} of {}: internal link identifier",
            property_id,
            document_id
        );
        return json!({
            "type": "unsupported",
            "property_id": property_id,
            "reason": "internal link identifiers cannot be retrieved",
        });
    }

    let key = EntityCache::property_key(document_id.as_str(), property_id);
    if !ctx.options.skip_cache {
        if let Some(hit) = ctx.cache.get(EntityKind::PropertyDetail, &key) {
            return hit;
        }
    }

    match fetch_property(ctx, document_id, property_id).await {
        Ok(detail) => {
            ctx.cache.put(EntityKind::PropertyDetail, key, detail.clone());
            detail
        }
        Err(e) => {
            log::warn!(
                "Failed to retrieve property {} of {}: {}",
                property_id,
                document_id,
                e
            );
            json!({
                "type": "error",
                "property_id": property_id,
                "message": e.to_string(),
            })
        }
    }
}

/// Retrieves a property item, completing paginated item lists.
async fn fetch_property(
    ctx: &CrawlContext,
    document_id: &ResourceId,
    property_id: &str,
) -> Result<Value, NodeFailure> {
    let operation = ctx.operation(OP_RETRIEVE_PAGE_PROPERTY)?;
    let params = |cursor: Option<String>| {
        let mut params = json!({
            "page_id": document_id.as_str(),
            "property_id": property_id,
        });
        if let Some(cursor) = cursor {
            params["start_cursor"] = Value::String(cursor);
        }
        params
    };

    let first = ctx.call(&operation, params(None)).await?;
    let is_list = first.get("object").and_then(Value::as_str) == Some("list");
    if !is_list || pagination::next_cursor(&first).is_none() {
        return Ok(first);
    }

    let mut merged = first.clone();
    let results = pagination::continue_from(first, |cursor| {
        let call_params = params(cursor);
        let operation = operation.clone();
        async move { ctx.call(&operation, call_params).await }
    })
    .await;
    merged["results"] = Value::Array(results);
    merged["has_more"] = Value::Bool(false);
    merged["next_cursor"] = Value::Null;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_link_markers_are_detected() {
        assert!(is_internal_link("notion://www.notion.so/abc"));
        assert!(is_internal_link("prefix-notion%3A%2F%2Fpage"));
        assert!(is_internal_link("NOTION%3a%2f%2fpage"));
        assert!(!is_internal_link("title"));
        assert!(!is_internal_link("%3AUPp"));
    }
}
