// src/crawler/annotations.rs
//! Comment retrieval for a page.

use super::CrawlContext;
use crate::constants::OP_RETRIEVE_COMMENTS;
use crate::types::{EntityKind, ResourceId};
use serde_json::{json, Value};
use std::sync::Arc;

/// Fetches the comments attached to `id`, caching each one by its own id.
///
/// Any failure yields an empty list; comments never fail a page.
pub(super) async fn retrieve(ctx: Arc<CrawlContext>, id: ResourceId) -> Vec<Value> {
    let operation = match ctx.operation(OP_RETRIEVE_COMMENTS) {
        Ok(operation) => operation,
        Err(e) => {
            log::warn!("Skipping comments for {}: {}", id, e);
            return Vec::new();
        }
    };

    let payload = match ctx.call(&operation, json!({ "block_id": id.as_str() })).await {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Failed to retrieve comments for {}: {}", id, e);
            return Vec::new();
        }
    };

    let comments = match payload {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(results)) => results,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    for comment in &comments {
        if let Some(comment_id) = comment.get("id").and_then(Value::as_str) {
            ctx.cache.put(EntityKind::Annotation, comment_id, comment.clone());
        }
    }
    log::debug!("Found {} comment(s) on {}", comments.len(), id);
    comments
}
