//! Slack Web API data models and Block Kit layout

use serde::{Deserialize, Serialize};

use shared_types::Notification;

use crate::util::truncate_string;

const HEADER_LIMIT: usize = 150;
const TEXT_LIMIT: usize = 3000;
const FIELD_LIMIT: usize = 2000;
const FIELDS_PER_SECTION: usize = 10;

/// Text object used inside blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String, emoji: bool },
    Mrkdwn { text: String },
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText {
            text: text.into(),
            emoji: true,
        }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Text::PlainText { text, .. } | Text::Mrkdwn { text } => text,
        }
    }
}

/// Block Kit layout block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: Text,
    },
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Text>,
    },
    Context {
        elements: Vec<Text>,
    },
    Divider,
}

/// Lay out a notification as Block Kit blocks
pub fn blocks_for(notification: &Notification) -> Vec<Block> {
    let mut blocks = vec![Block::Header {
        text: Text::plain(truncate_string(&notification.header, HEADER_LIMIT)),
    }];

    if let Some(summary) = &notification.summary {
        blocks.push(Block::Section {
            text: Some(Text::mrkdwn(truncate_string(summary, TEXT_LIMIT))),
            fields: Vec::new(),
        });
    }

    for chunk in notification.fields.chunks(FIELDS_PER_SECTION) {
        let fields = chunk
            .iter()
            .map(|field| Text::mrkdwn(truncate_string(&format!("*{}:*\n{}", field.label, field.value), FIELD_LIMIT)))
            .collect();
        blocks.push(Block::Section { text: None, fields });
    }

    for section in &notification.sections {
        let mut text = format!("*{}*", section.title);
        for line in &section.lines {
            text.push_str("\n• ");
            text.push_str(line);
        }
        blocks.push(Block::Section {
            text: Some(Text::mrkdwn(truncate_string(&text, TEXT_LIMIT))),
            fields: Vec::new(),
        });
    }

    let mut context: Vec<Text> = Vec::new();
    if let Some(link) = &notification.deep_link {
        context.push(Text::mrkdwn(format!("<{}|{}>", link.url, link.label)));
    }
    context.extend(notification.footer.iter().map(|line| Text::mrkdwn(line.clone())));
    if !context.is_empty() {
        blocks.push(Block::Divider);
        blocks.push(Block::Context { elements: context });
    }

    blocks
}

/// `chat.postMessage` body
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest {
    pub channel: String,
    pub text: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteUploadFile {
    pub id: String,
    pub title: String,
}

/// `files.completeUploadExternal` body
#[derive(Debug, Clone, Serialize)]
pub struct CompleteUploadRequest {
    pub files: Vec<CompleteUploadFile>,
    pub channel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_comment: Option<String>,
    pub blocks: Vec<Block>,
}

/// Envelope shared by every Web API response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::{DeepLink, Field, Section};

    #[test]
    fn test_block_serialization() {
        let block = Block::Section {
            text: None,
            fields: vec![Text::mrkdwn("*Cluster:*\nprod")],
        };
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"type": "section", "fields": [{"type": "mrkdwn", "text": "*Cluster:*\nprod"}]})
        );
        assert_eq!(serde_json::to_value(Block::Divider).unwrap(), json!({"type": "divider"}));
    }

    #[test]
    fn test_blocks_for_notification() {
        let notification = Notification {
            header: "🚨 Task Crash Detected: api (prod)".to_string(),
            fallback_text: "crash".to_string(),
            fields: (0..12).map(|i| Field::new(format!("F{}", i), "v")).collect(),
            sections: vec![Section {
                title: "Top reasons".to_string(),
                lines: vec!["OOM: 3".to_string()],
            }],
            deep_link: Some(DeepLink {
                label: "View logs in Kibana".to_string(),
                url: "https://kibana/x".to_string(),
            }),
            ..Notification::default()
        };

        let blocks = blocks_for(&notification);
        assert!(matches!(&blocks[0], Block::Header { text } if text.text().starts_with("🚨")));
        // 12 fields split into sections of at most 10
        assert!(matches!(&blocks[1], Block::Section { fields, .. } if fields.len() == 10));
        assert!(matches!(&blocks[2], Block::Section { fields, .. } if fields.len() == 2));
        assert!(matches!(&blocks[3], Block::Section { text: Some(t), .. } if t.text() == "*Top reasons*\n• OOM: 3"));
        assert!(matches!(blocks.last(), Some(Block::Context { elements }) if elements[0].text() == "<https://kibana/x|View logs in Kibana>"));
    }
}
