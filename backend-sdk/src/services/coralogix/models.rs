//! Coralogix DataPrime query API data models

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub metadata: QueryMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    pub tier: String,
    pub syntax: String,
    pub start_date: String,
    pub end_date: String,
    pub limit: usize,
}

/// One line of the NDJSON response stream
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseLine {
    #[serde(default)]
    pub query_id: Option<Value>,
    #[serde(default)]
    pub result: Option<QueryResult>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub results: Vec<ResultRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    #[serde(default)]
    pub metadata: Vec<KeyValue>,
    #[serde(default)]
    pub labels: Vec<KeyValue>,
    #[serde(default)]
    pub user_data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl ResultRow {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|kv| kv.key == key)
            .and_then(|kv| kv.value.as_str())
    }

    /// Log text from the user data: `message`, then `log`, then the whole payload
    pub fn message(&self) -> String {
        let Some(raw) = self.user_data.as_deref() else {
            return String::new();
        };
        let Ok(data) = serde_json::from_str::<Value>(raw) else {
            return raw.to_string();
        };
        ["message", "log"]
            .iter()
            .filter_map(|key| data.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Null | Value::String(_) => None,
                other => Some(other.to_string()),
            })
            .unwrap_or_else(|| match data {
                Value::String(s) => s,
                other => other.to_string(),
            })
    }
}

/// Split an NDJSON body into rows, failing on an error line.
pub fn parse_ndjson(body: &str) -> Result<Vec<ResultRow>, String> {
    let mut rows = Vec::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed: ResponseLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable Coralogix response line");
                continue;
            }
        };
        if let Some(error) = parsed.error {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(message);
        }
        if let Some(result) = parsed.result {
            rows.extend(result.results);
        }
    }
    Ok(rows)
}
