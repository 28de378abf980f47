use anyhow::Result;
use serde_json::json;

use crate::config::RefinerConfig;

const REFINE_PROMPT: &str = "You are an assistant that improves the accuracy of place searches. \
The user provides a search query; extract structured location information (city, state, country) \
from it when present. If the query is vague or misspelled, infer the most likely intended \
location. Reply with the refined query only.\n\
\n\
Examples:\n\
coffee in paris -> coffee in Paris, France\n\
pizza nyc -> pizza New York, NY, USA\n\
londn eye -> London Eye, London, UK";

/// One-shot query rewriting against a chat-completion endpoint. Used by the
/// place search to turn vague or misspelled queries into geographically
/// qualified ones before geocoding.
pub struct QueryRefiner {
    client: reqwest::Client,
    config: RefinerConfig,
}

impl QueryRefiner {
    pub fn new(client: reqwest::Client, config: RefinerConfig) -> QueryRefiner {
        QueryRefiner { client, config }
    }

    pub async fn refine(&self, query: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": REFINE_PROMPT},
                {"role": "user", "content": query},
            ],
        });
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload: serde_json::Value = response.json().await?;
        match extract_refined_query(&payload) {
            Some(refined) => {
                debug!("query refined: {:?} -> {:?}", query, refined);
                Ok(refined)
            }
            None => bail!("refiner response carried no usable choice"),
        }
    }
}

fn extract_refined_query(payload: &serde_json::Value) -> Option<String> {
    let content = payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()?;
    let refined = content.trim();
    if refined.is_empty() {
        None
    } else {
        Some(refined.to_string())
    }
}
