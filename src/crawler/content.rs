// src/crawler/content.rs
//! Content expansion: a node's child blocks, recursively.

use super::CrawlContext;
use crate::api::pagination;
use crate::constants::{
    MAX_DEPTH_NOTE, OP_GET_BLOCK_CHILDREN, OP_RETRIEVE_DATABASE, OP_RETRIEVE_PAGE,
};
use crate::model::{Outcome, ResourceNode};
use crate::types::{EntityKind, ResourceId};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Lists every child of `parent_id` and expands them, `batch_size` at a time.
///
/// `depth` is the depth of the children being listed, counted from the
/// root page. The returned children keep the order of the listing.
pub(super) fn expand_children(
    ctx: Arc<CrawlContext>,
    parent_id: ResourceId,
    depth: u32,
) -> BoxFuture<'static, Outcome<Vec<ResourceNode>>> {
    async move {
        let operation = ctx.operation(OP_GET_BLOCK_CHILDREN)?;

        let listing = pagination::fetch_all_pages(|cursor| {
            let ctx = Arc::clone(&ctx);
            let operation = operation.clone();
            let mut params = json!({ "block_id": parent_id.as_str() });
            if let Some(cursor) = cursor {
                params["start_cursor"] = Value::String(cursor);
            }
            async move { ctx.call(&operation, params).await }
        })
        .await
        .map_err(|e| {
            log::warn!("Failed to list children of {}: {}", parent_id, e);
            e
        })?;

        log::debug!(
            "Fetched {} child block(s) for {} at depth {}",
            listing.len(),
            parent_id,
            depth
        );

        let batch_size = ctx.options.batch_size.max(1);
        let mut children = Vec::with_capacity(listing.len());
        for (batch_index, batch) in listing.chunks(batch_size).enumerate() {
            let offset = batch_index * batch_size;
            let expanded = join_all(batch.iter().enumerate().map(|(i, raw)| {
                expand_child(
                    Arc::clone(&ctx),
                    &parent_id,
                    offset + i,
                    raw.clone(),
                    depth,
                )
            }))
            .await;
            children.extend(expanded);
        }

        Ok(children)
    }
    .boxed()
}

/// Expands one listed block. Never fails: problems land on the child itself.
async fn expand_child(
    ctx: Arc<CrawlContext>,
    parent_id: &ResourceId,
    position: usize,
    raw: Value,
    depth: u32,
) -> ResourceNode {
    let id = child_id(&raw, parent_id, position);
    ctx.cache.put(EntityKind::Block, id.as_str(), raw.clone());

    let mut node = ResourceNode::new(id, EntityKind::Block, raw);
    let options = &ctx.options;
    let block_type = node.block_type().map(str::to_string);

    match block_type.as_deref() {
        Some("child_database") => {
            if options.include_collections {
                node.linked_collection = Some(fetch_collection(&ctx, &node.id).await);
            }
        }
        Some("child_page") => {
            // Sub-pages only contribute identifying info, never their content.
            if depth < options.max_depth.saturating_sub(1) {
                node.page_info = Some(fetch_page_info(&ctx, &node.id).await);
            }
        }
        _ if node.has_children() => {
            if depth < options.max_depth {
                node.children =
                    Some(expand_children(Arc::clone(&ctx), node.id.clone(), depth + 1).await);
            } else {
                node.note = Some(MAX_DEPTH_NOTE.to_string());
            }
        }
        _ => {}
    }

    node
}

/// The block's own id, or a position-derived one so the node is never dropped.
fn child_id(raw: &Value, parent_id: &ResourceId, position: usize) -> ResourceId {
    raw.get("id")
        .and_then(Value::as_str)
        .and_then(|id| ResourceId::parse(id).ok())
        .unwrap_or_else(|| {
            log::warn!(
                "Child {} of {} has no id; using a positional id",
                position,
                parent_id
            );
            ResourceId::parse(&format!("{}#{}", parent_id, position))
                .unwrap_or_else(|_| parent_id.clone())
        })
}

async fn fetch_collection(ctx: &CrawlContext, id: &ResourceId) -> Outcome<Value> {
    ctx.fetch_cached(
        EntityKind::Collection,
        id.as_str(),
        OP_RETRIEVE_DATABASE,
        json!({ "database_id": id.as_str() }),
    )
    .await
    .map_err(|e| {
        log::warn!("Failed to resolve database {}: {}", id, e);
        e
    })
}

async fn fetch_page_info(ctx: &CrawlContext, id: &ResourceId) -> Outcome<Value> {
    ctx.fetch_cached(
        EntityKind::Document,
        id.as_str(),
        OP_RETRIEVE_PAGE,
        json!({ "page_id": id.as_str() }),
    )
    .await
    .map(|page| lightweight_page_info(&page))
    .map_err(|e| {
        log::warn!("Failed to retrieve sub-page {}: {}", id, e);
        e
    })
}

/// Reduces a full page payload to what identifies it.
fn lightweight_page_info(page: &Value) -> Value {
    let mut info = Map::new();
    for key in ["id", "icon", "cover", "url", "created_time", "last_edited_time"] {
        if let Some(value) = page.get(key) {
            info.insert(key.to_string(), value.clone());
        }
    }
    info.insert("title".to_string(), Value::String(page_title(page)));
    Value::Object(info)
}

/// Plain text of the page's title property, empty if it has none.
fn page_title(page: &Value) -> String {
    let Some(properties) = page.get("properties").and_then(Value::as_object) else {
        return String::new();
    };
    properties
        .values()
        .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
        .and_then(|prop| prop.get("title"))
        .and_then(Value::as_array)
        .map(|fragments| {
            fragments
                .iter()
                .filter_map(|f| f.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}
