use super::ValidationError;
use std::fmt;

/// API key for Notion API authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a new API key with validation
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();

        if key.trim().is_empty() {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key cannot be empty".to_string(),
            });
        }

        if !key.starts_with("secret_") && !key.starts_with("ntn_") {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key must start with 'secret_' or 'ntn_'".to_string(),
            });
        }

        if key.len() < 20 {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key is too short".to_string(),
            });
        }

        Ok(Self(key))
    }

    /// Get the API key as a string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact API key in display
        let prefix: String = self.0.chars().take(10).collect();
        write!(f, "{}...", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_requires_known_prefix() {
        assert!(ApiKey::new("secret_abcdefghijklmnopqrstuvwxyz").is_ok());
        assert!(ApiKey::new("ntn_abcdefghijklmnopqrstuvwxyz").is_ok());
        assert!(ApiKey::new("pk_abcdefghijklmnopqrstuvwxyz").is_err());
        assert!(ApiKey::new("secret_short").is_err());
        assert!(ApiKey::new("").is_err());
    }

    #[test]
    fn api_key_display_is_redacted() {
        let key = ApiKey::new("secret_abcdefghijklmnopqrstuvwxyz").unwrap();
        assert_eq!(key.to_string(), "secret_abc...");
    }
}
