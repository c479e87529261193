//! Elasticsearch search API data models

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Body of a `_search` request
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub size: usize,
    pub sort: Vec<Value>,
    pub query: Value,
}

impl SearchRequest {
    /// Most recent documents whose `field` equals `value` inside the time range
    pub fn recent_for_term(field: &str, value: &str, gte: &str, lte: &str, size: usize) -> Self {
        let mut term = Map::new();
        term.insert(field.to_string(), json!({ "value": value }));

        Self {
            size,
            sort: vec![json!({ "@timestamp": { "order": "desc" } })],
            query: json!({
                "bool": {
                    "filter": [
                        { "term": term },
                        {
                            "range": {
                                "@timestamp": {
                                    "gte": gte,
                                    "lte": lte,
                                    "format": "strict_date_optional_time"
                                }
                            }
                        }
                    ]
                }
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub timed_out: bool,
    pub hits: Hits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,

    #[serde(rename = "_source", default)]
    pub source: Value,
}

impl Hit {
    pub fn timestamp(&self) -> Option<&str> {
        self.source.get("@timestamp").and_then(Value::as_str)
    }

    /// Log text: `message`, then `log`, then the whole document
    pub fn message(&self) -> String {
        ["message", "log"]
            .iter()
            .filter_map(|key| self.source.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Null | Value::String(_) => None,
                other => Some(other.to_string()),
            })
            .unwrap_or_else(|| self.source.to_string())
    }
}
