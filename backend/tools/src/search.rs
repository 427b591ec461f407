//! `search_web` — web search via SerpAPI.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use parley_core::Tool;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RESULTS: usize = 5;

/// Returned as the tool result when the search cannot run. The model still
/// gets a valid (if unhelpful) observation to answer from.
const UNAVAILABLE: &str = "Web search is unavailable right now.";

pub struct SearchWebTool {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl SearchWebTool {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: "https://serpapi.com".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn search(&self, api_key: &str, query: &str) -> Result<Vec<SearchHit>> {
        let url = format!(
            "{}/search.json?engine=google&q={}&api_key={}",
            self.base_url,
            urlencoding::encode(query),
            api_key
        );
        let response = self
            .client
            .get(&url)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            bail!("SerpAPI returned {status}");
        }
        let parsed: SerpResponse = response.json().await?;
        Ok(condense(parsed.organic_results))
    }
}

/// One condensed search result handed back to the model.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

#[derive(Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<SerpResult>,
}

#[derive(Deserialize)]
struct SerpResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

fn condense(results: Vec<SerpResult>) -> Vec<SearchHit> {
    results
        .into_iter()
        .filter_map(|r| {
            Some(SearchHit {
                link: r.link?,
                title: r.title.unwrap_or_default(),
                snippet: r.snippet.unwrap_or_default(),
            })
        })
        .take(MAX_RESULTS)
        .collect()
}

#[async_trait]
impl Tool for SearchWebTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Use when the answer depends \
         on recent events or facts you are unsure about."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String> {
        let Some(query) = args.get("query").and_then(|q| q.as_str()) else {
            bail!("search_web arguments must carry a \"query\" string");
        };

        let Some(api_key) = self.api_key.as_deref() else {
            warn!("search_web requested but no SerpAPI key is configured");
            return Ok(UNAVAILABLE.to_string());
        };

        match self.search(api_key, query).await {
            Ok(hits) => {
                debug!(query = %query, hits = hits.len(), "search_web completed");
                Ok(serde_json::to_string(&hits)?)
            }
            Err(err) => {
                warn!(query = %query, error = %err, "search_web request failed");
                Ok(UNAVAILABLE.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_query_is_an_argument_error() {
        let tool = SearchWebTool::new(Client::new(), Some("key".to_string()));
        let err = tool
            .execute(serde_json::json!({"q": "typo"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("query"));
    }

    #[tokio::test]
    async fn missing_credential_degrades_to_placeholder() {
        let tool = SearchWebTool::new(Client::new(), None);
        let result = tool
            .execute(serde_json::json!({"query": "anything"}))
            .await
            .unwrap();
        assert_eq!(result, UNAVAILABLE);
    }

    #[test]
    fn condense_keeps_order_and_drops_linkless_results() {
        let raw = r#"{
            "organic_results": [
                {"title": "First", "snippet": "one", "link": "https://a.example"},
                {"title": "No link", "snippet": "dropped"},
                {"title": "Second", "link": "https://b.example"}
            ]
        }"#;
        let parsed: SerpResponse = serde_json::from_str(raw).unwrap();
        let hits = condense(parsed.organic_results);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "First");
        assert_eq!(hits[1].link, "https://b.example");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn spec_declares_required_query() {
        let tool = SearchWebTool::new(Client::new(), None);
        let spec = tool.spec();
        assert_eq!(spec.function.name, "search_web");
        assert_eq!(spec.function.parameters["required"][0], "query");
    }
}
