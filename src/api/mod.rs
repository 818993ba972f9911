// src/api/mod.rs
//! Notion API interaction: the ability to perform one named remote operation.
//!
//! The crawler never speaks HTTP itself. It looks operations up by logical
//! name through an [`OperationResolver`] and runs them through an
//! [`OperationExecutor`]; both are object-safe so tests can script them.

pub mod cache;
pub mod client;
pub mod pagination;

use crate::constants::{
    OP_GET_BLOCK_CHILDREN, OP_RETRIEVE_COMMENTS, OP_RETRIEVE_DATABASE, OP_RETRIEVE_PAGE,
    OP_RETRIEVE_PAGE_PROPERTY,
};
use crate::error::OperationError;
use serde_json::Value;
use std::collections::HashMap;

/// HTTP verb of a remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Everything needed to issue one kind of remote call.
///
/// `path` is a template: `{name}` segments are filled from the call's
/// parameters, and the remaining parameters travel as query string or body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
}

impl OperationDescriptor {
    pub fn new(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
        }
    }
}

/// Status and body of a completed remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    pub status: u16,
    pub payload: Value,
}

impl OperationResponse {
    pub fn ok(payload: Value) -> Self {
        Self {
            status: 200,
            payload,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a non-2xx response into the same error a failed call produces.
    pub fn into_result(self) -> Result<Value, OperationError> {
        if self.is_success() {
            Ok(self.payload)
        } else {
            Err(OperationError::new(self.status, self.payload))
        }
    }
}

/// The ability to perform a single remote call.
///
/// Business logic depends on this trait, never on HTTP details.
#[async_trait::async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn execute(
        &self,
        operation: &OperationDescriptor,
        params: &Value,
    ) -> Result<OperationResponse, OperationError>;
}

/// The ability to find an operation by its logical name.
pub trait OperationResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<OperationDescriptor>;
}

/// A fixed name → descriptor table.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    operations: HashMap<String, OperationDescriptor>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five Notion operations a full-page crawl needs.
    pub fn notion() -> Self {
        Self::new()
            .with(OperationDescriptor::new(
                OP_RETRIEVE_PAGE,
                HttpMethod::Get,
                "pages/{page_id}",
            ))
            .with(OperationDescriptor::new(
                OP_GET_BLOCK_CHILDREN,
                HttpMethod::Get,
                "blocks/{block_id}/children",
            ))
            .with(OperationDescriptor::new(
                OP_RETRIEVE_DATABASE,
                HttpMethod::Get,
                "databases/{database_id}",
            ))
            .with(OperationDescriptor::new(
                OP_RETRIEVE_COMMENTS,
                HttpMethod::Get,
                "comments",
            ))
            .with(OperationDescriptor::new(
                OP_RETRIEVE_PAGE_PROPERTY,
                HttpMethod::Get,
                "pages/{page_id}/properties/{property_id}",
            ))
    }

    pub fn with(mut self, descriptor: OperationDescriptor) -> Self {
        self.operations.insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.operations.remove(name);
        self
    }
}

impl OperationResolver for OperationTable {
    fn resolve(&self, name: &str) -> Option<OperationDescriptor> {
        self.operations.get(name).cloned()
    }
}
