// src/model/node.rs
use crate::constants::MAX_DEPTH_NOTE;
use crate::error::NodeFailure;
use crate::types::{EntityKind, ResourceId};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// What happened when the crawler tried to fill in one field of a node.
pub type Outcome<T> = Result<T, NodeFailure>;

/// One entity in the crawl result, with whatever was fetched beneath it.
///
/// Every optional field is filled independently, so a node can be partly
/// populated: a failed or abandoned branch leaves its field empty (or holds
/// the failure) without affecting its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    pub id: ResourceId,
    pub kind: EntityKind,
    /// The payload exactly as the remote side returned it (`Null` for stubs).
    pub raw: Value,
    pub children: Option<Outcome<Vec<ResourceNode>>>,
    pub linked_collection: Option<Outcome<Value>>,
    pub page_info: Option<Outcome<Value>>,
    pub property_details: Option<IndexMap<String, Value>>,
    pub annotations: Option<Vec<Value>>,
    pub note: Option<String>,
    pub error: Option<NodeFailure>,
    pub retrieval_failed: bool,
    pub partial_results: bool,
}

impl ResourceNode {
    pub fn new(id: ResourceId, kind: EntityKind, raw: Value) -> Self {
        Self {
            id,
            kind,
            raw,
            children: None,
            linked_collection: None,
            page_info: None,
            property_details: None,
            annotations: None,
            note: None,
            error: None,
            retrieval_failed: false,
            partial_results: false,
        }
    }

    /// A node the crawler did not descend into because the depth budget ran out.
    pub fn depth_exhausted(id: ResourceId, kind: EntityKind) -> Self {
        let mut node = Self::new(id, kind, Value::Null);
        node.note = Some(MAX_DEPTH_NOTE.to_string());
        node
    }

    /// A node whose own payload could not be retrieved.
    pub fn retrieval_failure(id: ResourceId, kind: EntityKind, failure: NodeFailure) -> Self {
        let mut node = Self::new(id, kind, Value::Null);
        node.error = Some(failure);
        node.retrieval_failed = true;
        node
    }

    /// Whether the remote side reports nested content under this node.
    pub fn has_children(&self) -> bool {
        self.raw
            .get("has_children")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The block type (`paragraph`, `child_database`, ...), if any.
    pub fn block_type(&self) -> Option<&str> {
        self.raw.get("type").and_then(Value::as_str)
    }

    /// Renders the node as its raw payload with the crawl's fields overlaid.
    pub fn to_json(&self) -> Value {
        let mut out = match &self.raw {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        out.insert("id".to_string(), Value::String(self.id.to_string()));

        match &self.children {
            Some(Ok(children)) => {
                out.insert(
                    "children".to_string(),
                    Value::Array(children.iter().map(ResourceNode::to_json).collect()),
                );
            }
            Some(Err(e)) => {
                out.insert("children_error".to_string(), Value::String(e.to_string()));
            }
            None => {}
        }
        insert_outcome(&mut out, "linked_collection", "database_error", &self.linked_collection);
        insert_outcome(&mut out, "page_info", "page_info_error", &self.page_info);

        if let Some(details) = &self.property_details {
            let map: Map<String, Value> = details
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            out.insert("property_details".to_string(), Value::Object(map));
        }
        if let Some(annotations) = self.annotations.as_ref().filter(|a| !a.is_empty()) {
            out.insert("annotations".to_string(), Value::Array(annotations.clone()));
        }
        if let Some(note) = &self.note {
            out.insert("note".to_string(), Value::String(note.clone()));
        }
        if let Some(error) = &self.error {
            out.insert("error".to_string(), Value::String(error.to_string()));
        }
        if self.retrieval_failed {
            out.insert("retrieval_failed".to_string(), Value::Bool(true));
        }
        if self.partial_results {
            out.insert("partial_results".to_string(), Value::Bool(true));
        }

        Value::Object(out)
    }
}

fn insert_outcome(
    out: &mut Map<String, Value>,
    key: &str,
    error_key: &str,
    outcome: &Option<Outcome<Value>>,
) {
    match outcome {
        Some(Ok(value)) => {
            out.insert(key.to_string(), value.clone());
        }
        Some(Err(e)) => {
            out.insert(error_key.to_string(), Value::String(e.to_string()));
        }
        None => {}
    }
}

impl Serialize for ResourceNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}
