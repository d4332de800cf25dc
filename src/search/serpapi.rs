//! Google search through SerpApi.
//!
//! Only the `answer_box` of the response is used: it is Google's direct
//! answer (a time, a conversion, a weather card, …).  Organic results are
//! ignored.

use async_trait::async_trait;

use crate::config::SearchConfig;
use crate::search::{Locale, SearchError, SearchProvider, SearchResult};

/// SerpApi client.
pub struct SerpApiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiProvider {
    /// Returns `None` when no API key is configured.
    pub fn from_config(config: &SearchConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref().filter(|k| !k.is_empty())?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Some(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    async fn search(
        &self,
        query: &str,
        locale: &Locale,
    ) -> Result<Option<SearchResult>, SearchError> {
        let response = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("hl", locale.language.as_str()),
                ("gl", locale.country.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.without_url().to_string()))?;

        answer_from_response(&json)
    }
}

/// Extract the answer box from a SerpApi response.
fn answer_from_response(json: &serde_json::Value) -> Result<Option<SearchResult>, SearchError> {
    if let Some(error) = json.get("error").and_then(|e| e.as_str()) {
        return Err(SearchError::Provider(error.to_string()));
    }

    Ok(json
        .get("answer_box")
        .and_then(render_answer_box)
        .map(SearchResult::new))
}

/// Prefer the short textual fields; fall back to the whole box as JSON.
fn render_answer_box(answer_box: &serde_json::Value) -> Option<String> {
    for field in ["answer", "result", "snippet"] {
        if let Some(text) = answer_box.get(field).and_then(|v| v.as_str()) {
            if !text.trim().is_empty() {
                return Some(text.trim().to_string());
            }
        }
    }

    match answer_box {
        serde_json::Value::Null => None,
        serde_json::Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_config_requires_api_key() {
        let mut config = SearchConfig::default();
        assert!(SerpApiProvider::from_config(&config).is_none());

        config.api_key = Some(String::new());
        assert!(SerpApiProvider::from_config(&config).is_none());

        config.api_key = Some("serp-key".into());
        config.base_url = "https://serpapi.com/".into();
        let provider = SerpApiProvider::from_config(&config).expect("provider");
        assert_eq!(provider.base_url, "https://serpapi.com");
    }

    #[test]
    fn answer_field_is_preferred() {
        let response = json!({
            "answer_box": { "type": "time", "answer": "14:32", "snippet": "Tokyo time" },
            "organic_results": [{ "title": "ignored" }]
        });
        let result = answer_from_response(&response).unwrap();
        assert_eq!(result, Some(SearchResult::new("14:32")));
    }

    #[test]
    fn snippet_used_when_no_answer_field() {
        let response = json!({ "answer_box": { "snippet": "Paris is the capital of France." } });
        let result = answer_from_response(&response).unwrap().unwrap();
        assert_eq!(result.text, "Paris is the capital of France.");
    }

    #[test]
    fn structured_box_falls_back_to_json() {
        let response = json!({ "answer_box": { "temperature": "12", "unit": "Celsius" } });
        let result = answer_from_response(&response).unwrap().unwrap();
        assert!(result.text.contains("\"temperature\":\"12\""));
    }

    #[test]
    fn missing_answer_box_is_none() {
        let response = json!({ "organic_results": [] });
        assert_eq!(answer_from_response(&response).unwrap(), None);

        let empty = json!({ "answer_box": {} });
        assert_eq!(answer_from_response(&empty).unwrap(), None);
    }

    #[test]
    fn provider_error_is_reported() {
        let response = json!({ "error": "Invalid API key." });
        assert!(matches!(
            answer_from_response(&response),
            Err(SearchError::Provider(msg)) if msg == "Invalid API key."
        ));
    }
}
