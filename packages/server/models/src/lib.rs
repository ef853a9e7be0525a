#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API response types for the care map server.
//!
//! Every query endpoint wraps its tool result in an [`ApiResponse`] so the
//! map frontend can render any of them the same way. Failures use
//! [`ApiError`].

use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Number of facilities in the loaded snapshot.
    pub facilities: usize,
}

/// A successful query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Name of the tool that produced `data`.
    pub tool: String,
    /// Wall-clock time spent in the engine.
    pub elapsed_ms: u64,
    /// The tool result.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wraps a tool result.
    pub fn new(tool: impl Into<String>, elapsed_ms: u64, data: T) -> Self {
        Self {
            success: true,
            tool: tool.into(),
            elapsed_ms,
            data,
        }
    }
}

/// A failed query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Always `false`.
    pub success: bool,
    /// Name of the tool that failed.
    pub tool: String,
    /// Human-readable error message.
    pub error: String,
    /// Known names close to an unresolved location.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ApiError {
    /// A failure without suggestions.
    pub fn new(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            tool: tool.into(),
            error: error.into(),
            suggestions: Vec::new(),
        }
    }

    /// Attaches suggestions for an unresolved location.
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_use_camel_case() {
        let json = serde_json::to_value(ApiResponse::new("calculate_distance", 3, 1.5))
            .expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["elapsedMs"], 3);
        assert_eq!(json["tool"], "calculate_distance");
    }

    #[test]
    fn empty_suggestions_are_omitted() {
        let json = serde_json::to_value(ApiError::new("count_facilities", "boom")).expect("serialize");
        assert!(json.get("suggestions").is_none());

        let json = serde_json::to_value(
            ApiError::new("calculate_distance", "unknown").with_suggestions(vec!["Accra".to_string()]),
        )
        .expect("serialize");
        assert_eq!(json["suggestions"][0], "Accra");
        assert_eq!(json["success"], false);
    }
}
