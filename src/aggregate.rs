// src/aggregate.rs
//! The aggregate "retrieve a page in full" operation.
//!
//! Parses the caller's JSON parameters, runs the crawl and wraps the tree
//! with timing metadata. Whatever happens, the caller gets a JSON body:
//! either the tree or an error envelope.

use crate::config::CrawlRequest;
use crate::crawler::Crawler;
use crate::error::CrawlError;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::time::Instant;

/// Runs the aggregate operation for `params` and returns its JSON body.
pub async fn retrieve_page_full(crawler: &Crawler, params: &Value) -> Value {
    match run(crawler, params).await {
        Ok(body) => body,
        Err(e) => {
            log::error!("Full page retrieval failed: {}", e);
            error_envelope(&e)
        }
    }
}

async fn run(crawler: &Crawler, params: &Value) -> Result<Value, CrawlError> {
    let request = CrawlRequest::from_params(params)?;
    let started = Instant::now();

    // The crawl runs on its own task so a panic deep in a branch still
    // produces an envelope instead of tearing down the caller.
    let task_crawler = crawler.clone();
    let task_request = request.clone();
    let node = tokio::spawn(async move {
        task_crawler
            .crawl(&task_request.root_id, &task_request.options)
            .await
    })
    .await
    .map_err(|e| CrawlError::Internal(format!("crawl task failed: {}", e)))??;

    let mut body = node.to_json();
    if let Value::Object(map) = &mut body {
        map.insert(
            "_meta".to_string(),
            json!({
                "processingTimeMs": started.elapsed().as_millis() as u64,
                "retrievedAt": now_rfc3339(),
                "options": request.options.echo(),
            }),
        );
    }
    Ok(body)
}

/// The structured body returned for an unrecoverable top-level failure.
pub fn error_envelope(error: &CrawlError) -> Value {
    let mut envelope = json!({
        "status": "error",
        "message": error.to_string(),
        "code": error.code(),
        "timestamp": now_rfc3339(),
    });
    if let CrawlError::OperationNotFound(operation) = error {
        envelope["details"] = json!({ "operation": operation });
    }
    envelope
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn envelope_carries_code_and_details() {
        let envelope = error_envelope(&CrawlError::OperationNotFound(
            "retrieve-a-page".to_string(),
        ));
        assert_eq!(envelope["status"], "error");
        assert_eq!(envelope["code"], "operation_not_found");
        assert_eq!(envelope["details"], json!({"operation": "retrieve-a-page"}));
        assert!(envelope["message"]
            .as_str()
            .unwrap()
            .contains("retrieve-a-page"));
        assert!(chrono::DateTime::parse_from_rfc3339(envelope["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn parameter_errors_have_no_details() {
        let envelope = error_envelope(&CrawlError::InvalidParameters("rootId is required".into()));
        assert_eq!(envelope["code"], "invalid_parameters");
        assert!(envelope.get("details").is_none());
    }
}
