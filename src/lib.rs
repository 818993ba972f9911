// src/lib.rs
//! notion-crawl library: materializes a Notion page and everything beneath it
//! into one JSON snapshot.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Aggregate operation**: `retrieve_page_full`, `error_envelope`
//! - **Crawler**: `Crawler`, `ResourceNode`, `Outcome`
//! - **Remote calls**: `OperationExecutor`, `OperationResolver`, `OperationTable`, `NotionHttpClient`
//! - **Cache**: `EntityCache`
//! - **Configuration**: `CrawlOptions`, `CrawlRequest`, `CommandLineInput`
//! - **Error handling**: `AppError`, `CrawlError`, `NodeFailure`, `OperationError`, `ValidationError`

mod aggregate;
mod api;
mod config;
pub mod constants;
mod crawler;
mod error;
mod error_recovery;
mod model;
mod types;

// --- Aggregate Operation ---
pub use crate::aggregate::{error_envelope, retrieve_page_full};

// --- Crawler ---
pub use crate::crawler::{is_internal_link, Crawler};
pub use crate::model::{Outcome, ResourceNode};

// --- Remote Calls ---
pub use crate::api::{
    cache::EntityCache,
    client::{fill_path_template, NotionHttpClient},
    pagination::{continue_from, fetch_all_pages, next_cursor},
    HttpMethod, OperationDescriptor, OperationExecutor, OperationResolver, OperationResponse,
    OperationTable,
};

// --- Configuration ---
pub use crate::config::{api_key_from_env, CommandLineInput, CrawlOptions, CrawlRequest};

// --- Error Handling ---
pub use crate::error::{AppError, CrawlError, NodeFailure, NotionErrorCode, OperationError};
pub use crate::error_recovery::retry_with_backoff;
pub use crate::types::ValidationError;

// --- Domain Types ---
pub use crate::types::{ApiKey, EntityKind, ResourceId};
