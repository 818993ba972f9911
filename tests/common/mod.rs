// tests/common/mod.rs
//! Scripted stand-in for the Notion API shared by the integration tests.

#![allow(dead_code)]

use notion_crawl::{
    constants::{
        OP_GET_BLOCK_CHILDREN, OP_RETRIEVE_COMMENTS, OP_RETRIEVE_DATABASE, OP_RETRIEVE_PAGE,
        OP_RETRIEVE_PAGE_PROPERTY,
    },
    Crawler, CrawlOptions, EntityCache, OperationDescriptor, OperationError, OperationExecutor,
    OperationResponse, OperationTable,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory workspace answering the five crawl operations.
#[derive(Default)]
pub struct MockNotion {
    pages: HashMap<String, Value>,
    children: HashMap<String, Vec<Vec<Value>>>,
    databases: HashMap<String, Value>,
    comments: HashMap<String, Vec<Value>>,
    properties: HashMap<String, Vec<Value>>,
    failing: HashSet<String>,
    failing_targets: HashSet<(String, String)>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, Value)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockNotion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: Value) -> Self {
        let id = page["id"].as_str().unwrap_or_default().to_string();
        self.pages.insert(id, page);
        self
    }

    /// Children of `parent`, returned as a single listing page.
    pub fn with_children(self, parent: &str, blocks: Vec<Value>) -> Self {
        self.with_paged_children(parent, vec![blocks])
    }

    /// Children of `parent`, split over several cursor pages.
    pub fn with_paged_children(mut self, parent: &str, pages: Vec<Vec<Value>>) -> Self {
        self.children.insert(parent.to_string(), pages);
        self
    }

    pub fn with_database(mut self, database: Value) -> Self {
        let id = database["id"].as_str().unwrap_or_default().to_string();
        self.databases.insert(id, database);
        self
    }

    pub fn with_comments(mut self, parent: &str, comments: Vec<Value>) -> Self {
        self.comments.insert(parent.to_string(), comments);
        self
    }

    /// A property item; more than one element makes it a paginated list.
    pub fn with_property(mut self, page_id: &str, property_id: &str, pages: Vec<Value>) -> Self {
        self.properties
            .insert(format!("{}:{}", page_id, property_id), pages);
        self
    }

    /// Every call to `operation` answers with a 500.
    pub fn failing(mut self, operation: &str) -> Self {
        self.failing.insert(operation.to_string());
        self
    }

    /// Calls to `operation` that target `id` answer with a 500.
    pub fn failing_for(mut self, operation: &str, id: &str) -> Self {
        self.failing_targets
            .insert((operation.to_string(), id.to_string()));
        self
    }

    /// Every call to `operation` takes at least `delay`.
    pub fn delayed(mut self, operation: &str, delay: Duration) -> Self {
        self.delays.insert(operation.to_string(), delay);
        self
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(name, _)| name == operation)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, operation: &str, params: &Value) -> OperationResponse {
        let target = ["page_id", "block_id", "database_id"]
            .iter()
            .find_map(|key| params[*key].as_str())
            .unwrap_or_default()
            .to_string();
        if self.failing.contains(operation)
            || self
                .failing_targets
                .contains(&(operation.to_string(), target))
        {
            return OperationResponse {
                status: 500,
                payload: json!({"object": "error", "code": "internal_server_error", "message": "boom"}),
            };
        }
        let param = |name: &str| params[name].as_str().unwrap_or_default().to_string();
        let found = match operation {
            OP_RETRIEVE_PAGE => self.pages.get(&param("page_id")).cloned(),
            OP_RETRIEVE_DATABASE => self.databases.get(&param("database_id")).cloned(),
            OP_GET_BLOCK_CHILDREN => {
                let pages = self.children.get(&param("block_id")).cloned().unwrap_or_default();
                Some(listing_page(pages, params))
            }
            OP_RETRIEVE_COMMENTS => Some(json!({
                "object": "list",
                "results": self.comments.get(&param("block_id")).cloned().unwrap_or_default(),
                "has_more": false,
                "next_cursor": null,
            })),
            OP_RETRIEVE_PAGE_PROPERTY => self
                .properties
                .get(&format!("{}:{}", param("page_id"), param("property_id")))
                .map(|pages| {
                    if pages.len() == 1 {
                        pages[0].clone()
                    } else {
                        listing_page(
                            pages.iter().map(|p| vec![p.clone()]).collect(),
                            params,
                        )
                    }
                }),
            _ => None,
        };
        match found {
            Some(payload) => OperationResponse::ok(payload),
            None => OperationResponse {
                status: 404,
                payload: json!({"object": "error", "code": "object_not_found", "message": "Could not find object"}),
            },
        }
    }
}

/// One cursor page of a listing; cursors are `cursor-<index>`.
fn listing_page(pages: Vec<Vec<Value>>, params: &Value) -> Value {
    let index = params["start_cursor"]
        .as_str()
        .and_then(|c| c.strip_prefix("cursor-"))
        .and_then(|i| i.parse::<usize>().ok())
        .unwrap_or(0);
    let results = pages.get(index).cloned().unwrap_or_default();
    let has_more = index + 1 < pages.len();
    let next_cursor = if has_more {
        Value::String(format!("cursor-{}", index + 1))
    } else {
        Value::Null
    };
    json!({
        "object": "list",
        "results": results,
        "has_more": has_more,
        "next_cursor": next_cursor,
    })
}

#[async_trait::async_trait]
impl OperationExecutor for MockNotion {
    async fn execute(
        &self,
        operation: &OperationDescriptor,
        params: &Value,
    ) -> Result<OperationResponse, OperationError> {
        self.calls
            .lock()
            .push((operation.name.clone(), params.clone()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(&operation.name)
            .copied()
            .unwrap_or(Duration::from_millis(1));
        tokio::time::sleep(delay).await;

        let response = self.respond(&operation.name, params);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(response)
    }
}

/// A crawler over `mock` with the full operation table and a private cache.
pub fn crawler(mock: &Arc<MockNotion>) -> Crawler {
    crawler_with(mock, OperationTable::notion())
}

pub fn crawler_with(mock: &Arc<MockNotion>, table: OperationTable) -> Crawler {
    let executor: Arc<dyn OperationExecutor> = mock.clone();
    Crawler::new(executor, Arc::new(table)).with_cache(Arc::new(EntityCache::new()))
}

pub fn options() -> CrawlOptions {
    CrawlOptions::default()
}

pub fn page(id: &str, title: &str) -> Value {
    json!({
        "object": "page",
        "id": id,
        "url": format!("https://www.notion.so/{}", id),
        "icon": null,
        "cover": null,
        "created_time": "2024-01-01T00:00:00.000Z",
        "last_edited_time": "2024-01-02T00:00:00.000Z",
        "properties": {
            "Name": {
                "id": "title",
                "type": "title",
                "title": [{"type": "text", "plain_text": title}]
            }
        }
    })
}

pub fn page_with_properties(id: &str, properties: Value) -> Value {
    let mut page = page(id, "untitled");
    page["properties"] = properties;
    page
}

pub fn block(id: &str, block_type: &str, has_children: bool) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": block_type,
        "has_children": has_children,
        block_type: {}
    })
}

pub fn ids(children: &Value) -> Vec<String> {
    children
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|c| c["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
