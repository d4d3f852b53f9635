//! Typed claims carried by an image token.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ClaimsError;

/// The claims an image token must carry.
///
/// Produced from a verified JWT payload by [`Claims::from_payload`]; any other
/// payload members (`exp`, `iat`, custom fields) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Card title, always present
    pub title: String,

    /// Optional card description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Claims {
    /// Create claims with a title and no description.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate a decoded payload and extract the claims.
    ///
    /// `title` must be a non-empty string. `description` must be a string when
    /// present; JSON `null` is rejected rather than treated as absent.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, ClaimsError> {
        let title = match payload.get("title") {
            None => return Err(ClaimsError::MissingTitle),
            Some(Value::String(title)) if title.is_empty() => return Err(ClaimsError::EmptyTitle),
            Some(Value::String(title)) => title.clone(),
            Some(_) => return Err(ClaimsError::InvalidTitle),
        };

        let description = match payload.get("description") {
            None => None,
            Some(Value::String(description)) => Some(description.clone()),
            Some(_) => return Err(ClaimsError::InvalidDescription),
        };

        Ok(Self { title, description })
    }

    /// The description, if present and non-empty.
    ///
    /// An empty description contributes nothing to the cache key or the
    /// render URL.
    pub fn effective_description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}
