// src/constants.rs
//! Domain constants that define the operational boundaries of a crawl.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you how a crawl
//! behaves when the caller does not say otherwise.

// ---------------------------------------------------------------------------
// Crawl defaults
// ---------------------------------------------------------------------------

/// How many levels below the root page the crawler descends by default.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Upper bound on remote calls in flight at once for a single crawl.
pub const DEFAULT_MAX_PARALLEL_REQUESTS: usize = 15;

/// How many sibling blocks are expanded concurrently before the next batch starts.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// How long the root page's expansion may run before partial results are returned.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Logical operation names
// ---------------------------------------------------------------------------

/// Retrieves a single page (the document node).
pub const OP_RETRIEVE_PAGE: &str = "retrieve-a-page";

/// Lists the child blocks of a page or block, one cursor page at a time.
pub const OP_GET_BLOCK_CHILDREN: &str = "get-block-children";

/// Retrieves a database (linked collection) definition.
pub const OP_RETRIEVE_DATABASE: &str = "retrieve-a-database";

/// Lists the comments attached to a page or block.
pub const OP_RETRIEVE_COMMENTS: &str = "retrieve-a-comment";

/// Retrieves the full value of one page property.
pub const OP_RETRIEVE_PAGE_PROPERTY: &str = "retrieve-a-page-property";

// ---------------------------------------------------------------------------
// Node annotations
// ---------------------------------------------------------------------------

/// Note attached to nodes the crawler refused to descend into.
pub const MAX_DEPTH_NOTE: &str = "max depth reached";

/// Error text for a root whose expansion outlived `timeoutMs`.
pub const TIMED_OUT_MESSAGE: &str = "Operation timed out";

/// Internal page-link scheme the property endpoint cannot resolve.
pub const INTERNAL_LINK_MARKER: &str = "notion://";

/// Percent-encoded form of [`INTERNAL_LINK_MARKER`].
pub const INTERNAL_LINK_MARKER_ENCODED: &str = "notion%3a%2f%2f";

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips while chasing cursors.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Attempts made for a call that keeps failing with a retryable status.
pub const HTTP_MAX_ATTEMPTS: u32 = 3;

/// First backoff delay between retries, in milliseconds.
pub const HTTP_RETRY_INITIAL_DELAY_MS: u64 = 250;

/// Backoff ceiling between retries, in milliseconds.
pub const HTTP_RETRY_MAX_DELAY_MS: u64 = 4_000;
