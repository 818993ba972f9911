// src/config.rs
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PARALLEL_REQUESTS, DEFAULT_TIMEOUT_MS,
};
use crate::error::{AppError, CrawlError};
use crate::types::{ApiKey, ResourceId, ValidationError};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// ID of the Notion page to crawl
    pub root_id: String,

    /// How many levels below the page to descend (0 = root only)
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: u32,

    /// Do not resolve linked databases
    #[arg(long, default_value_t = false)]
    pub no_collections: bool,

    /// Do not retrieve comments
    #[arg(long, default_value_t = false)]
    pub no_annotations: bool,

    /// Do not retrieve full property values
    #[arg(long = "no-properties", default_value_t = false)]
    pub no_properties: bool,

    /// Maximum remote calls in flight at once
    #[arg(long, default_value_t = DEFAULT_MAX_PARALLEL_REQUESTS)]
    pub max_parallel_requests: usize,

    /// Ignore cached entities and fetch everything fresh
    #[arg(long, default_value_t = false)]
    pub skip_cache: bool,

    /// Sibling blocks expanded concurrently per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Give up waiting on the page after this many milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Print compact JSON instead of pretty-printed JSON
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CommandLineInput {
    /// The parameters of the aggregate operation, as a caller would send them.
    pub fn to_params(&self) -> Value {
        json!({
            "rootId": self.root_id,
            "maxDepth": self.max_depth,
            "includeCollections": !self.no_collections,
            "includeAnnotations": !self.no_annotations,
            "includeProperties": !self.no_properties,
            "maxParallelRequests": self.max_parallel_requests,
            "skipCache": self.skip_cache,
            "batchSize": self.batch_size,
            "timeoutMs": self.timeout_ms,
        })
    }
}

/// Reads the Notion API key from `NOTION_API_KEY`.
pub fn api_key_from_env() -> Result<ApiKey, AppError> {
    let key = std::env::var("NOTION_API_KEY").map_err(|_| {
        AppError::MissingConfiguration("NOTION_API_KEY environment variable not set".to_string())
    })?;
    Ok(ApiKey::new(key)?)
}

/// Knobs for one crawl. Immutable once the crawl starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    pub max_depth: u32,
    pub include_collections: bool,
    pub include_annotations: bool,
    pub include_properties: bool,
    pub max_parallel_requests: usize,
    pub skip_cache: bool,
    pub batch_size: usize,
    pub timeout_ms: u64,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            include_collections: true,
            include_annotations: true,
            include_properties: true,
            max_parallel_requests: DEFAULT_MAX_PARALLEL_REQUESTS,
            skip_cache: false,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl CrawlOptions {
    /// Checks the lower bounds the crawler relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_parallel_requests < 1 {
            return Err(ValidationError::BelowMinimum {
                field: "maxParallelRequests",
                value: self.max_parallel_requests as u64,
                min: 1,
            });
        }
        if self.batch_size < 1 {
            return Err(ValidationError::BelowMinimum {
                field: "batchSize",
                value: self.batch_size as u64,
                min: 1,
            });
        }
        Ok(())
    }

    /// The deadline for the root page's expansions. Zero expires at once.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The subset of options echoed back in `_meta.options`.
    pub fn echo(&self) -> Value {
        json!({
            "maxDepth": self.max_depth,
            "includeCollections": self.include_collections,
            "includeComments": self.include_annotations,
            "includeProperties": self.include_properties,
        })
    }
}

/// A validated request for the aggregate operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub root_id: ResourceId,
    pub options: CrawlOptions,
}

/// Wire shape of the aggregate operation's parameters; every field optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCrawlParams {
    #[serde(alias = "page_id", alias = "pageId")]
    root_id: Option<String>,
    max_depth: Option<u32>,
    #[serde(alias = "includeDatabases")]
    include_collections: Option<bool>,
    #[serde(alias = "includeComments")]
    include_annotations: Option<bool>,
    include_properties: Option<bool>,
    max_parallel_requests: Option<usize>,
    skip_cache: Option<bool>,
    batch_size: Option<usize>,
    timeout_ms: Option<u64>,
}

impl CrawlRequest {
    /// Parses and validates the aggregate operation's JSON parameters.
    pub fn from_params(params: &Value) -> Result<Self, CrawlError> {
        let raw: RawCrawlParams = serde_json::from_value(params.clone())
            .map_err(|e| CrawlError::InvalidParameters(e.to_string()))?;

        let root_id = raw
            .root_id
            .ok_or_else(|| CrawlError::InvalidParameters("rootId is required".to_string()))?;
        let root_id = ResourceId::parse(&root_id)?;

        let defaults = CrawlOptions::default();
        let options = CrawlOptions {
            max_depth: raw.max_depth.unwrap_or(defaults.max_depth),
            include_collections: raw
                .include_collections
                .unwrap_or(defaults.include_collections),
            include_annotations: raw
                .include_annotations
                .unwrap_or(defaults.include_annotations),
            include_properties: raw.include_properties.unwrap_or(defaults.include_properties),
            max_parallel_requests: raw
                .max_parallel_requests
                .unwrap_or(defaults.max_parallel_requests),
            skip_cache: raw.skip_cache.unwrap_or(defaults.skip_cache),
            batch_size: raw.batch_size.unwrap_or(defaults.batch_size),
            timeout_ms: raw.timeout_ms.unwrap_or(defaults.timeout_ms),
        };
        options.validate()?;

        Ok(Self { root_id, options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let options = CrawlOptions::default();
        assert_eq!(options.max_depth, 5);
        assert!(options.include_collections);
        assert!(options.include_annotations);
        assert!(options.include_properties);
        assert_eq!(options.max_parallel_requests, 15);
        assert!(!options.skip_cache);
        assert_eq!(options.batch_size, 10);
        assert_eq!(options.timeout_ms, 60_000);
    }

    #[test]
    fn only_root_id_is_required() {
        let request = CrawlRequest::from_params(&json!({"rootId": "abc"})).unwrap();
        assert_eq!(request.root_id.as_str(), "abc");
        assert_eq!(request.options, CrawlOptions::default());
    }

    #[test]
    fn legacy_aliases_are_accepted() {
        let request = CrawlRequest::from_params(&json!({
            "page_id": "abc",
            "includeDatabases": false,
            "includeComments": false,
        }))
        .unwrap();
        assert!(!request.options.include_collections);
        assert!(!request.options.include_annotations);
    }

    #[test]
    fn missing_or_blank_root_id_is_rejected() {
        let err = CrawlRequest::from_params(&json!({"maxDepth": 2})).unwrap_err();
        assert_eq!(err.code(), "invalid_parameters");

        let err = CrawlRequest::from_params(&json!({"rootId": "  "})).unwrap_err();
        assert_eq!(err.code(), "invalid_parameters");
    }

    #[test]
    fn zero_batch_size_and_parallelism_are_rejected() {
        let err = CrawlRequest::from_params(&json!({"rootId": "a", "batchSize": 0})).unwrap_err();
        assert!(err.to_string().contains("batchSize"));

        let err = CrawlRequest::from_params(&json!({"rootId": "a", "maxParallelRequests": 0}))
            .unwrap_err();
        assert!(err.to_string().contains("maxParallelRequests"));
    }

    #[test]
    fn negative_and_mistyped_values_are_rejected() {
        assert!(CrawlRequest::from_params(&json!({"rootId": "a", "maxDepth": -1})).is_err());
        assert!(CrawlRequest::from_params(&json!({"rootId": "a", "skipCache": "yes"})).is_err());
    }

    #[test]
    fn zero_timeout_is_an_immediate_deadline() {
        let options = CrawlOptions {
            timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(options.timeout(), Duration::ZERO);
        assert_eq!(
            CrawlOptions::default().timeout(),
            Duration::from_millis(60_000)
        );
    }

    #[test]
    fn echo_uses_comment_naming() {
        let echoed = CrawlOptions::default().echo();
        assert_eq!(
            echoed,
            json!({
                "maxDepth": 5,
                "includeCollections": true,
                "includeComments": true,
                "includeProperties": true,
            })
        );
    }

    #[test]
    fn command_line_flags_map_onto_parameters() {
        let cli = CommandLineInput::parse_from([
            "notion-crawl",
            "page-1",
            "--max-depth",
            "2",
            "--no-collections",
            "--skip-cache",
            "--batch-size",
            "3",
        ]);
        let request = CrawlRequest::from_params(&cli.to_params()).unwrap();
        assert_eq!(request.root_id.as_str(), "page-1");
        assert_eq!(request.options.max_depth, 2);
        assert!(!request.options.include_collections);
        assert!(request.options.include_annotations);
        assert!(request.options.skip_cache);
        assert_eq!(request.options.batch_size, 3);
    }
}
