use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A user query that is non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidQuery);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a Query,
}

/// One hit as the external search service sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawResult {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub similarity_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResponse {
    pub results: Vec<RawResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Reply payload for a `search` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchReply {
    Results { results: Vec<SearchResult> },
    Error { error: String },
}

impl From<Result<Vec<SearchResult>, AppError>> for SearchReply {
    fn from(result: Result<Vec<SearchResult>, AppError>) -> Self {
        match result {
            Ok(results) => Self::Results { results },
            Err(e) => Self::Error {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_trimmed() {
        let query = Query::parse("  refund policy \n").unwrap();
        assert_eq!(query.as_str(), "refund policy");
    }

    #[test]
    fn whitespace_query_is_rejected() {
        assert!(matches!(Query::parse(" \t "), Err(AppError::InvalidQuery)));
        assert!(matches!(Query::parse(""), Err(AppError::InvalidQuery)));
    }

    #[test]
    fn raw_result_tolerates_missing_title_and_extra_fields() {
        let raw: RawSearchResponse = serde_json::from_str(
            r#"{"results":[{"url":"https://a.example","content":"x","similarity_score":0.5,"rank":1}]}"#,
        )
        .unwrap();
        assert_eq!(raw.results.len(), 1);
        assert!(raw.results[0].title.is_none());
        assert_eq!(raw.results[0].similarity_score, Some(0.5));
    }

    #[test]
    fn reply_wire_shapes() {
        let ok = SearchReply::Results {
            results: vec![SearchResult {
                url: "https://a.example".to_string(),
                title: "a.example".to_string(),
                snippet: "x".to_string(),
                score: None,
            }],
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"results":[{"url":"https://a.example","title":"a.example","snippet":"x"}]})
        );

        let err: SearchReply = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(
            err,
            SearchReply::Error {
                error: "boom".to_string()
            }
        );
    }
}
