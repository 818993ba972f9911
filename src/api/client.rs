// src/api/client.rs
//! HTTP executor for Notion API operations.
//!
//! A thin wrapper around reqwest: it fills the descriptor's path template,
//! authenticates, retries transient failures and hands back the status and
//! JSON body. Parsing and business logic live elsewhere.

use super::{HttpMethod, OperationDescriptor, OperationExecutor, OperationResponse};
use crate::constants::{
    HTTP_MAX_ATTEMPTS, HTTP_RETRY_INITIAL_DELAY_MS, HTTP_RETRY_MAX_DELAY_MS, NOTION_API_PAGE_SIZE,
};
use crate::error::{AppError, OperationError};
use crate::error_recovery::retry_with_backoff;
use crate::types::ApiKey;
use reqwest::{header, Client};
use serde_json::{Map, Value};
use std::time::Duration;

const NOTION_VERSION: &str = "2022-06-28";
const API_BASE_URL: &str = "https://api.notion.com/v1";

/// Executes operation descriptors against the Notion REST API.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Points the client at another server (a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Sends one request and reads the body, without retrying.
    async fn send_once(
        &self,
        method: HttpMethod,
        url: &str,
        rest: &Map<String, Value>,
    ) -> Result<OperationResponse, OperationError> {
        let request = match method {
            HttpMethod::Get => {
                let query: Vec<(String, String)> = rest
                    .iter()
                    .map(|(k, v)| (k.clone(), query_value(v)))
                    .collect();
                log::debug!("GET {}", url);
                self.client.get(url).query(&query)
            }
            HttpMethod::Post => {
                log::debug!("POST {}", url);
                self.client.post(url).json(rest)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| OperationError::transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| OperationError::transport(e.to_string()))?;
        let payload = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        let response = OperationResponse { status, payload };
        if response.is_success() {
            Ok(response)
        } else {
            Err(OperationError::new(response.status, response.payload))
        }
    }
}

#[async_trait::async_trait]
impl OperationExecutor for NotionHttpClient {
    async fn execute(
        &self,
        operation: &OperationDescriptor,
        params: &Value,
    ) -> Result<OperationResponse, OperationError> {
        let (path, mut rest) = fill_path_template(&operation.path, params)?;
        if operation.method == HttpMethod::Get
            && path.ends_with("children")
            && !rest.contains_key("page_size")
        {
            rest.insert("page_size".to_string(), Value::from(NOTION_API_PAGE_SIZE));
        }
        let url = format!("{}/{}", self.base_url, path);

        retry_with_backoff(
            || self.send_once(operation.method, &url, &rest),
            OperationError::is_retryable,
            HTTP_MAX_ATTEMPTS,
            Duration::from_millis(HTTP_RETRY_INITIAL_DELAY_MS),
            Duration::from_millis(HTTP_RETRY_MAX_DELAY_MS),
        )
        .await
    }
}

/// Substitutes `{name}` segments of `template` from `params`.
///
/// Returns the concrete path and the parameters that were not consumed by
/// the template. A placeholder without a matching parameter is a 400-class
/// error, raised before anything is sent.
pub fn fill_path_template(
    template: &str,
    params: &Value,
) -> Result<(String, Map<String, Value>), OperationError> {
    let mut rest = match params {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(OperationError::new(
                400,
                serde_json::json!({ "message": format!("parameters must be an object, got {}", other) }),
            ))
        }
    };

    let mut path = String::with_capacity(template.len());
    let mut remainder = template;
    while let Some(open) = remainder.find('{') {
        let Some(close) = remainder[open..].find('}') else {
            break;
        };
        let name = &remainder[open + 1..open + close];
        let value = rest.remove(name).ok_or_else(|| {
            OperationError::new(
                400,
                serde_json::json!({ "message": format!("missing path parameter '{}'", name) }),
            )
        })?;
        path.push_str(&remainder[..open]);
        path.push_str(&query_value(&value));
        remainder = &remainder[open + close + 1..];
    }
    path.push_str(remainder);

    Ok((path, rest))
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
