// src/crawler/mod.rs
//! Recursive expansion of a page into one merged tree.
//!
//! A crawl resolves the root page, then expands its content, its property
//! values and its comments concurrently. Content expansion recurses into
//! nested blocks batch by batch. Every failure below the root is recorded
//! on the node where it happened; the crawl itself only fails when the
//! page-retrieval operation does not exist at all.

mod annotations;
mod content;
mod properties;

use crate::api::cache::EntityCache;
use crate::api::{OperationDescriptor, OperationExecutor, OperationResolver};
use crate::config::CrawlOptions;
use crate::constants::OP_RETRIEVE_PAGE;
use crate::error::{CrawlError, NodeFailure, OperationError};
use crate::model::{Outcome, ResourceNode};
use crate::types::{EntityKind, ResourceId};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub use properties::is_internal_link;

/// Materializes page subtrees through an executor, a resolver and a cache.
#[derive(Clone)]
pub struct Crawler {
    executor: Arc<dyn OperationExecutor>,
    resolver: Arc<dyn OperationResolver>,
    cache: Arc<EntityCache>,
}

impl Crawler {
    /// Creates a crawler backed by the process-wide entity cache.
    pub fn new(executor: Arc<dyn OperationExecutor>, resolver: Arc<dyn OperationResolver>) -> Self {
        Self {
            executor,
            resolver,
            cache: EntityCache::shared(),
        }
    }

    /// Uses `cache` instead of the process-wide one.
    pub fn with_cache(mut self, cache: Arc<EntityCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    /// Crawls the page `root_id` and everything beneath it that `options` allow.
    ///
    /// Remote failures, timeouts and unsupported identifiers are recorded
    /// on the affected nodes. Only a missing page-retrieval operation (or
    /// invalid options) is returned as an error.
    pub async fn crawl(
        &self,
        root_id: &ResourceId,
        options: &CrawlOptions,
    ) -> Result<ResourceNode, CrawlError> {
        options.validate()?;

        if options.max_depth == 0 {
            return Ok(ResourceNode::depth_exhausted(
                root_id.clone(),
                EntityKind::Document,
            ));
        }

        if self.resolver.resolve(OP_RETRIEVE_PAGE).is_none() {
            return Err(CrawlError::OperationNotFound(OP_RETRIEVE_PAGE.to_string()));
        }

        log::info!(
            "Starting crawl for {} (depth: {}, batch: {}, parallel: {}, skip_cache: {})",
            root_id,
            options.max_depth,
            options.batch_size,
            options.max_parallel_requests,
            options.skip_cache
        );

        let ctx = Arc::new(CrawlContext {
            executor: Arc::clone(&self.executor),
            resolver: Arc::clone(&self.resolver),
            cache: Arc::clone(&self.cache),
            permits: Semaphore::new(options.max_parallel_requests),
            options: options.clone(),
        });

        let node = expand_document(ctx, root_id.clone(), 0).await;

        if node.partial_results {
            log::warn!("Crawl for {} timed out; returning partial results", root_id);
        } else {
            log::info!("Crawl complete for {}", root_id);
        }
        Ok(node)
    }
}

/// State shared by every branch of one crawl.
pub(crate) struct CrawlContext {
    executor: Arc<dyn OperationExecutor>,
    resolver: Arc<dyn OperationResolver>,
    cache: Arc<EntityCache>,
    permits: Semaphore,
    options: CrawlOptions,
}

impl CrawlContext {
    /// Looks up a secondary operation; a miss degrades the branch that needed it.
    pub(crate) fn operation(&self, name: &str) -> Result<OperationDescriptor, NodeFailure> {
        self.resolver
            .resolve(name)
            .ok_or_else(|| NodeFailure::OperationNotFound(name.to_string()))
    }

    /// Performs one remote call, holding a request permit only for its duration.
    pub(crate) async fn call(
        &self,
        operation: &OperationDescriptor,
        params: Value,
    ) -> Result<Value, OperationError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| OperationError::transport("request limiter closed"))?;
        log::debug!("{} {}", operation.name, params);
        self.executor
            .execute(operation, &params)
            .await?
            .into_result()
    }

    /// Serves `key` from the cache unless skipped, otherwise fetches and caches it.
    pub(crate) async fn fetch_cached(
        &self,
        kind: EntityKind,
        key: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, NodeFailure> {
        if !self.options.skip_cache {
            if let Some(hit) = self.cache.get(kind, key) {
                return Ok(hit);
            }
        }
        let descriptor = self.operation(operation)?;
        let payload = self.call(&descriptor, params).await?;
        self.cache.put(kind, key, payload.clone());
        Ok(payload)
    }
}

/// Result of one of the concurrent expansions of a page.
enum Expansion {
    Content(Outcome<Vec<ResourceNode>>),
    Properties(IndexMap<String, Value>),
    Annotations(Vec<Value>),
}

/// Resolves a page and expands it, racing the expansions against the deadline.
async fn expand_document(ctx: Arc<CrawlContext>, id: ResourceId, depth: u32) -> ResourceNode {
    if depth >= ctx.options.max_depth {
        return ResourceNode::depth_exhausted(id, EntityKind::Document);
    }

    let raw = match ctx
        .fetch_cached(
            EntityKind::Document,
            id.as_str(),
            OP_RETRIEVE_PAGE,
            json!({ "page_id": id.as_str() }),
        )
        .await
    {
        Ok(raw) => raw,
        Err(failure) => {
            log::warn!("Failed to retrieve page {}: {}", id, failure);
            return ResourceNode::retrieval_failure(id, EntityKind::Document, failure);
        }
    };

    let own_properties = raw
        .get("properties")
        .and_then(Value::as_object)
        .filter(|props| !props.is_empty())
        .cloned();
    let mut node = ResourceNode::new(id.clone(), EntityKind::Document, raw);

    let mut pending = FuturesUnordered::new();

    let content_task = tokio::spawn(content::expand_children(
        Arc::clone(&ctx),
        id.clone(),
        depth + 1,
    ));
    pending.push(
        async move {
            Expansion::Content(
                content_task
                    .await
                    .unwrap_or_else(|e| Err(NodeFailure::TaskAborted(e.to_string()))),
            )
        }
        .boxed(),
    );

    if let Some(props) = own_properties.filter(|_| ctx.options.include_properties) {
        let task = tokio::spawn(properties::enrich(Arc::clone(&ctx), id.clone(), props));
        pending.push(
            async move { Expansion::Properties(task.await.unwrap_or_else(abandoned)) }
                .boxed(),
        );
    }

    if ctx.options.include_annotations {
        let task = tokio::spawn(annotations::retrieve(Arc::clone(&ctx), id.clone()));
        pending.push(
            async move { Expansion::Annotations(task.await.unwrap_or_else(abandoned)) }
                .boxed(),
        );
    }

    let timer = tokio::time::sleep(ctx.options.timeout());
    tokio::pin!(timer);

    while !pending.is_empty() {
        tokio::select! {
            Some(expansion) = pending.next() => apply(&mut node, expansion),
            _ = &mut timer => {
                log::warn!(
                    "Expansion of {} exceeded {} ms; {} task(s) abandoned",
                    id,
                    ctx.options.timeout_ms,
                    pending.len()
                );
                node.error = Some(NodeFailure::TimedOut);
                node.partial_results = true;
                break;
            }
        }
    }

    node
}

fn apply(node: &mut ResourceNode, expansion: Expansion) {
    match expansion {
        Expansion::Content(children) => node.children = Some(children),
        Expansion::Properties(details) => node.property_details = Some(details),
        Expansion::Annotations(found) => {
            if !found.is_empty() {
                node.annotations = Some(found);
            }
        }
    }
}

/// A fault-isolated task that panicked contributes nothing.
fn abandoned<T: Default>(err: tokio::task::JoinError) -> T {
    log::warn!("Expansion task failed: {}", err);
    T::default()
}
