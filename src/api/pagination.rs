// src/api/pagination.rs
//! Cursor-chasing pagination for listing operations.
//!
//! The cursor for page N+1 is only known once page N has arrived, so pages
//! are always fetched one after another.

use crate::error::OperationError;
use serde_json::Value;
use std::future::Future;

/// Fetches every page of a listing and concatenates their `results`.
///
/// `fetch_page` receives `None` for the first page and the previous page's
/// `next_cursor` afterwards. An error on the first page is returned; an
/// error on any later page ends the listing with what was gathered so far.
pub async fn fetch_all_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Value>, OperationError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Value, OperationError>>,
{
    let first = fetch_page(None).await?;
    Ok(continue_from(first, fetch_page).await)
}

/// Completes a listing whose first page has already been fetched.
pub async fn continue_from<F, Fut>(first_page: Value, mut fetch_page: F) -> Vec<Value>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Value, OperationError>>,
{
    let mut items = Vec::new();
    let mut cursor = absorb_page(first_page, &mut items);
    let mut pages_fetched = 1u32;

    while let Some(next) = cursor {
        match fetch_page(Some(next.clone())).await {
            Ok(page) => {
                pages_fetched += 1;
                cursor = absorb_page(page, &mut items);
            }
            Err(e) => {
                log::warn!(
                    "Pagination stopped after {} page(s) at cursor {}: {}",
                    pages_fetched,
                    next,
                    e
                );
                break;
            }
        }
    }

    log::debug!(
        "Merged {} item(s) from {} page(s)",
        items.len(),
        pages_fetched
    );
    items
}

/// Moves a page's results into `items` and returns the cursor to follow, if any.
fn absorb_page(page: Value, items: &mut Vec<Value>) -> Option<String> {
    let cursor = next_cursor(&page);
    if let Value::Object(mut map) = page {
        if let Some(Value::Array(results)) = map.remove("results") {
            items.extend(results);
        }
    }
    cursor
}

/// The cursor for the following page, or `None` when the listing is complete.
///
/// A non-empty `next_cursor` is followed even when `has_more` is absent.
pub fn next_cursor(page: &Value) -> Option<String> {
    page.get("next_cursor")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
